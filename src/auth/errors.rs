//! Identity provider error types.

use thiserror::Error;

/// Errors surfaced by an identity provider.
///
/// These are non-fatal: the caller stays on its current screen and
/// shows the message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Email or password missing from a credential pair
    #[error("Please enter an email and password")]
    MissingCredentials,

    /// Credentials did not match a known identity
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Email already registered
    #[error("Email already registered")]
    EmailTaken,

    /// Password rejected at sign-up
    #[error("Password too weak: {0}")]
    WeakPassword(String),

    /// Provider could not be reached
    #[error("Authentication service unavailable: {0}")]
    ProviderUnavailable(String),
}

/// Result type for identity operations
pub type AuthResult<T> = Result<T, AuthError>;
