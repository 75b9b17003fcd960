//! Occupancy: atomic join/leave coordination on the shared table
//! record, with per-client join coalescing.

pub mod errors;
pub mod manager;

pub use errors::{OccupancyError, OccupancyResult};
pub use manager::OccupancyManager;
