//! Keyward Auth — Argon2id password hashing and opaque session tokens.

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod session;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use password::{EncodedHash, PasswordHashParameters, hash_password, verify_password};
pub use service::{AuthService, LoginInput, LoginOutput, RegisterInput};
pub use session::{SessionManager, SessionPolicy};
pub use token::SessionToken;
