//! Opaque session token generation and storage keys.

use std::fmt;

use rand::TryRngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// An opaque, high-entropy session token.
///
/// 128 random bits from the OS shaped as a v4 UUID (122 bits of
/// entropy), rendered as 32 lowercase hex characters.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generate a fresh token from the OS entropy source.
    pub fn generate() -> Result<Self, AuthError> {
        let mut bytes = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| AuthError::TokenGeneration(format!("entropy source: {e}")))?;
        let id = uuid::Builder::from_random_bytes(bytes).into_uuid();
        Ok(Self(id.simple().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Key under which this token's session is stored.
    pub fn key(&self) -> String {
        token_key(&self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// SHA-256 of a raw session token, hex-encoded.
///
/// This is the value the session store is keyed by; raw tokens are
/// never persisted.
pub fn token_key(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}
