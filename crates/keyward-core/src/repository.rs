//! Repository trait definitions for data access abstraction.
//!
//! These are the only storage operations the auth crate depends on.
//! Implementations must make each write all-or-nothing: a caller never
//! observes a partially written record.

use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::models::{
    credential::Credential,
    session::{CreateSession, Session},
};

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

pub trait CredentialRepository: Send + Sync {
    /// Store the first credential for a principal.
    ///
    /// Fails with `AlreadyExists` if the principal already has one.
    fn create_credential(
        &self,
        principal_id: &str,
        password_hash: &str,
    ) -> impl Future<Output = StoreResult<Credential>> + Send;
    /// Insert or replace the credential for a principal.
    fn put_credential(
        &self,
        principal_id: &str,
        password_hash: &str,
    ) -> impl Future<Output = StoreResult<()>> + Send;
    fn get_credential(
        &self,
        principal_id: &str,
    ) -> impl Future<Output = StoreResult<Credential>> + Send;
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub trait SessionRepository: Send + Sync {
    /// Persist a session. Must be durable before the future resolves.
    fn put_session(&self, input: CreateSession) -> impl Future<Output = StoreResult<()>> + Send;
    fn get_session(&self, token_key: &str) -> impl Future<Output = StoreResult<Session>> + Send;
    /// Record a use of the session. A missing row is not an error.
    fn touch_session(
        &self,
        token_key: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<()>> + Send;
    /// Remove a session (logout). A missing row is not an error.
    fn delete_session(&self, token_key: &str) -> impl Future<Output = StoreResult<()>> + Send;
}
