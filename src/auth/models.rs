//! Identity models.

use serde::{Deserialize, Serialize};

/// An authenticated principal, distinct from an anonymous caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable unique id assigned by the provider
    pub uid: String,

    /// Optional profile display name
    pub display_name: Option<String>,

    /// Optional email address
    pub email: Option<String>,
}

impl Identity {
    /// Name shown next to this identity's messages and on the
    /// dashboard: profile name, else the email local part, else a
    /// generic fallback.
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.display_name {
            let trimmed = name.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
        if let Some(email) = &self.email
            && let Some(local) = email.split('@').next()
            && !local.is_empty()
        {
            return local.to_string();
        }
        "Customer".to_string()
    }
}

/// Email/password credential pair for sign-up and sign-in.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}
