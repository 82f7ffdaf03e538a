//! Authentication configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::AuthError;
use crate::password::PasswordHashParameters;
use crate::session::SessionPolicy;

/// Configuration for the authentication service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Parameters for newly created password hashes. Existing hashes
    /// keep verifying with the parameters embedded in them.
    pub password_hash: PasswordHashParameters,
    /// Session lifetime in seconds. `None` disables expiry.
    pub session_ttl_secs: Option<u64>,
    /// Record `last_used_at` on every successful validation.
    pub track_session_last_used: bool,
    /// Re-hash with `password_hash` on login when a stored hash uses
    /// different parameters.
    pub rehash_on_login: bool,
    /// Minimum password length for policy enforcement.
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            password_hash: PasswordHashParameters::default(),
            session_ttl_secs: None,
            track_session_last_used: false,
            rehash_on_login: true,
            min_password_length: 12,
        }
    }
}

impl AuthConfig {
    /// Reject configurations that cannot be used.
    ///
    /// Hash parameters validate themselves on construction; this covers
    /// the remaining fields.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.session_ttl_secs == Some(0) {
            return Err(AuthError::InvalidParameters(
                "session_ttl_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            ttl: self.session_ttl_secs.map(Duration::from_secs),
            track_last_used: self.track_session_last_used,
        }
    }
}
