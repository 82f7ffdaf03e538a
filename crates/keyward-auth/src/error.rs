//! Authentication error types.

use keyward_core::error::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid hash format: {0}")]
    InvalidHashFormat(String),

    #[error("unsupported hash version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("invalid hash parameters: {0}")]
    InvalidParameters(String),

    #[error("hashing error: {0}")]
    Hashing(String),

    #[error("token generation error: {0}")]
    TokenGeneration(String),

    #[error("session not found")]
    SessionNotFound,

    #[error("session has expired")]
    SessionExpired,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("principal already exists")]
    PrincipalExists,

    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl AuthError {
    /// Whether the error means "the caller is not authenticated".
    ///
    /// Outer layers must treat all of these identically.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            AuthError::SessionNotFound | AuthError::SessionExpired | AuthError::InvalidCredentials
        )
    }

    /// Message safe to show an end user.
    ///
    /// Collapses the unauthenticated variants so clients cannot tell an
    /// unknown session from an expired one, or an unknown principal from
    /// a wrong password.
    pub fn public_message(&self) -> String {
        if self.is_unauthenticated() {
            "unauthenticated".into()
        } else {
            match self {
                AuthError::PrincipalExists | AuthError::PasswordTooShort { .. } => self.to_string(),
                _ => "internal error".into(),
            }
        }
    }
}

impl From<StoreError> for AuthError {
    /// Generic mapping for collaborator failures.
    ///
    /// Call sites that give `NotFound` a meaning of their own
    /// (unknown session, unknown principal) match on it before falling
    /// back to this conversion.
    fn from(err: StoreError) -> Self {
        AuthError::Persistence(err.to_string())
    }
}
