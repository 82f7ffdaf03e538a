//! Password hashing and verification using Argon2id.
//!
//! Hashes are stored in a self-describing layout that carries their own
//! cost parameters:
//!
//! ```text
//! $argon2id$v=19$m=65536,t=3,p=2$<salt>$<key>
//! ```
//!
//! This is the PHC string format, read and written by the `password-hash`
//! types re-exported from `argon2`. Verification always uses the
//! parameters embedded in the hash, so raising the defaults never
//! invalidates existing credentials.

use std::fmt;
use std::str::FromStr;

use argon2::password_hash::{Salt, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::TryRngCore;
use rand::rngs::OsRng;
use serde::Deserialize;

use crate::error::AuthError;

const ALGORITHM_ID: &str = "argon2id";

/// Argon2 version 1.3, written as `v=19`.
pub const HASH_VERSION: u32 = 0x13;

const MIN_SALT_LENGTH: u32 = 8;
/// 64 base64 characters, the longest salt a PHC string can carry.
const MAX_SALT_LENGTH: u32 = 48;
const MIN_KEY_LENGTH: u32 = 10;
const MAX_KEY_LENGTH: u32 = 64;

/// 4 GiB. Anything larger in a stored hash is corruption, not tuning.
const MAX_MEMORY_KIB: u32 = 4 * 1024 * 1024;
const MAX_ITERATIONS: u32 = 1024;

/// Cost parameters for Argon2id.
///
/// Always structurally valid: construct through [`PasswordHashParameters::new`],
/// [`Default`], or deserialization, all of which validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawParameters")]
pub struct PasswordHashParameters {
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
    salt_length: u32,
    key_length: u32,
}

impl Default for PasswordHashParameters {
    /// 64 MiB, 3 passes, 2 lanes, 16-byte salt, 32-byte key.
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
            parallelism: 2,
            salt_length: 16,
            key_length: 32,
        }
    }
}

impl PasswordHashParameters {
    pub fn new(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
        salt_length: u32,
        key_length: u32,
    ) -> Result<Self, AuthError> {
        let params = Self {
            memory_kib,
            iterations,
            parallelism,
            salt_length,
            key_length,
        };
        params.check().map_err(AuthError::InvalidParameters)?;
        Ok(params)
    }

    pub fn memory_kib(&self) -> u32 {
        self.memory_kib
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }

    pub fn salt_length(&self) -> u32 {
        self.salt_length
    }

    pub fn key_length(&self) -> u32 {
        self.key_length
    }

    fn check(&self) -> Result<(), String> {
        if self.iterations == 0 {
            return Err("iterations must be positive".into());
        }
        if self.parallelism == 0 {
            return Err("parallelism must be positive".into());
        }
        if self.iterations > MAX_ITERATIONS {
            return Err(format!("iterations must be at most {MAX_ITERATIONS}"));
        }
        if u64::from(self.memory_kib) < 8 * u64::from(self.parallelism) {
            return Err(format!(
                "memory_kib must be at least 8 x parallelism ({})",
                8 * u64::from(self.parallelism)
            ));
        }
        if self.memory_kib > MAX_MEMORY_KIB {
            return Err(format!("memory_kib must be at most {MAX_MEMORY_KIB}"));
        }
        if !(MIN_SALT_LENGTH..=MAX_SALT_LENGTH).contains(&self.salt_length) {
            return Err(format!(
                "salt_length must be between {MIN_SALT_LENGTH} and {MAX_SALT_LENGTH}"
            ));
        }
        if !(MIN_KEY_LENGTH..=MAX_KEY_LENGTH).contains(&self.key_length) {
            return Err(format!(
                "key_length must be between {MIN_KEY_LENGTH} and {MAX_KEY_LENGTH}"
            ));
        }
        // Remaining limits are Argon2's own.
        self.argon2_params().map(|_| ()).map_err(|e| e.to_string())
    }

    fn argon2_params(&self) -> Result<Params, argon2::Error> {
        Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(self.key_length as usize),
        )
    }

    fn hasher(&self) -> Result<Argon2<'static>, AuthError> {
        let params = self
            .argon2_params()
            .map_err(|e| AuthError::InvalidParameters(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Unvalidated form used for deserialization.
#[derive(Deserialize)]
#[serde(default)]
struct RawParameters {
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
    salt_length: u32,
    key_length: u32,
}

impl Default for RawParameters {
    fn default() -> Self {
        let d = PasswordHashParameters::default();
        Self {
            memory_kib: d.memory_kib,
            iterations: d.iterations,
            parallelism: d.parallelism,
            salt_length: d.salt_length,
            key_length: d.key_length,
        }
    }
}

impl TryFrom<RawParameters> for PasswordHashParameters {
    type Error = AuthError;

    fn try_from(raw: RawParameters) -> Result<Self, Self::Error> {
        Self::new(
            raw.memory_kib,
            raw.iterations,
            raw.parallelism,
            raw.salt_length,
            raw.key_length,
        )
    }
}

/// A validated Argon2id PHC string together with its decoded parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedHash {
    params: PasswordHashParameters,
    phc: String,
}

impl EncodedHash {
    /// Decode a hash produced by [`hash_password`] (or any compatible
    /// Argon2id encoder).
    ///
    /// Never guesses: any structural problem is `InvalidHashFormat`, a
    /// version other than [`HASH_VERSION`] is `UnsupportedVersion`.
    pub fn parse(encoded: &str) -> Result<Self, AuthError> {
        let parsed = PasswordHash::new(encoded).map_err(invalid)?;
        let params = embedded_parameters(&parsed)?;
        Ok(Self {
            params,
            phc: encoded.to_string(),
        })
    }

    /// The parameters this hash was produced with.
    pub fn params(&self) -> &PasswordHashParameters {
        &self.params
    }

    /// Re-derive from `plaintext` with this hash's own salt and
    /// parameters. The comparison is constant-time.
    pub fn verify(&self, plaintext: &[u8]) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(&self.phc).map_err(invalid)?;
        match Argon2::default().verify_password(plaintext, &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(invalid(e)),
        }
    }
}

impl fmt::Display for EncodedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.phc)
    }
}

impl fmt::Debug for EncodedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedHash")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl FromStr for EncodedHash {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Hash a plaintext password with a fresh random salt.
///
/// Only fails if the OS entropy source does.
pub fn hash_password(
    plaintext: &[u8],
    params: &PasswordHashParameters,
) -> Result<EncodedHash, AuthError> {
    let mut salt = vec![0u8; params.salt_length as usize];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| AuthError::Hashing(format!("entropy source: {e}")))?;
    let salt = SaltString::encode_b64(&salt)
        .map_err(|e| AuthError::Hashing(format!("salt encoding: {e}")))?;

    let hash = params
        .hasher()?
        .hash_password(plaintext, &salt)
        .map_err(|e| AuthError::Hashing(format!("key derivation: {e}")))?;

    Ok(EncodedHash {
        params: *params,
        phc: hash.to_string(),
    })
}

/// Verify a plaintext password against an encoded hash.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, or an error if
/// the stored hash cannot be decoded.
pub fn verify_password(plaintext: &[u8], encoded: &str) -> Result<bool, AuthError> {
    EncodedHash::parse(encoded)?.verify(plaintext)
}

/// Whether `encoded` was produced with parameters other than `current`.
pub fn needs_rehash(encoded: &str, current: &PasswordHashParameters) -> Result<bool, AuthError> {
    Ok(EncodedHash::parse(encoded)?.params() != current)
}

/// Pull our parameters out of a syntactically valid PHC string.
fn embedded_parameters(parsed: &PasswordHash<'_>) -> Result<PasswordHashParameters, AuthError> {
    if parsed.algorithm.as_str() != ALGORITHM_ID {
        return Err(AuthError::InvalidHashFormat(format!(
            "unknown algorithm `{}`",
            parsed.algorithm
        )));
    }

    let found = parsed
        .version
        .ok_or_else(|| AuthError::InvalidHashFormat("missing version field".into()))?;
    if found != HASH_VERSION {
        return Err(AuthError::UnsupportedVersion {
            found,
            expected: HASH_VERSION,
        });
    }

    // Exactly `m=..,t=..,p=..`, in that order.
    let names: Vec<&str> = parsed.params.iter().map(|(name, _)| name.as_str()).collect();
    if names != ["m", "t", "p"] {
        return Err(AuthError::InvalidHashFormat("malformed cost field".into()));
    }
    let costs = Params::try_from(parsed).map_err(invalid)?;

    let salt = parsed
        .salt
        .as_ref()
        .ok_or_else(|| AuthError::InvalidHashFormat("missing salt".into()))?;
    let key = parsed
        .hash
        .as_ref()
        .ok_or_else(|| AuthError::InvalidHashFormat("missing key".into()))?;
    let mut buf = [0u8; Salt::MAX_LENGTH];
    let salt_length = salt.decode_b64(&mut buf).map_err(invalid)?.len();

    let params = PasswordHashParameters {
        memory_kib: costs.m_cost(),
        iterations: costs.t_cost(),
        parallelism: costs.p_cost(),
        salt_length: salt_length as u32,
        key_length: key.len() as u32,
    };
    params.check().map_err(AuthError::InvalidHashFormat)?;
    Ok(params)
}

fn invalid(e: argon2::password_hash::Error) -> AuthError {
    AuthError::InvalidHashFormat(e.to_string())
}
