//! Identity boundary: models, errors, and the provider trait.
//!
//! The coordinator never implements authentication itself. It consumes
//! identities from an [`IdentityProvider`] and reacts to the change
//! feed; everything else here is the minimal surface that contract
//! needs.

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::{AuthError, AuthResult};
pub use models::{Credentials, Identity};
pub use provider::{IdentityProvider, MemoryIdentityProvider};
