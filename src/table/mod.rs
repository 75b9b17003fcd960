//! Table records: model, code generation, and derived lifecycle facts.

pub mod code;
pub mod errors;
pub mod models;

pub use code::{create_unique_code, generate_code, normalize_code};
pub use errors::{TableError, TableResult};
pub use models::{Table, TableSummary, display_tier};
