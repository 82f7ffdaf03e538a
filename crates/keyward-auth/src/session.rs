//! Session issuance and validation.
//!
//! A session is a row keyed by the digest of an opaque token. Expiry is
//! evaluated lazily when a token is validated; expired rows are left for
//! an external sweep.

use std::time::Duration;

use chrono::{DateTime, Utc};
use keyward_core::error::StoreError;
use keyward_core::models::session::CreateSession;
use keyward_core::repository::SessionRepository;
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::token::{SessionToken, token_key};

/// How sessions age.
#[derive(Debug, Clone, Default)]
pub struct SessionPolicy {
    /// Lifetime measured from issuance. `None` disables expiry.
    pub ttl: Option<Duration>,
    /// Best-effort `last_used_at` update on each validation.
    pub track_last_used: bool,
}

/// Issues and validates session tokens.
///
/// Holds no state besides the store, so a single instance can be shared
/// by any number of concurrent request handlers.
pub struct SessionManager<S: SessionRepository> {
    store: S,
    policy: SessionPolicy,
}

impl<S: SessionRepository> SessionManager<S> {
    pub fn new(store: S, policy: SessionPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Create a session for `principal_id` and return its token.
    ///
    /// The token is only returned once the session write has completed,
    /// so it validates immediately from any other task.
    pub async fn issue(&self, principal_id: &str) -> Result<SessionToken, AuthError> {
        let token = SessionToken::generate()?;

        self.store
            .put_session(CreateSession {
                token_key: token.key(),
                principal_id: principal_id.to_string(),
                created_at: Utc::now(),
            })
            .await
            .map_err(|e| {
                warn!(principal_id, error = %e, "Failed to persist session");
                AuthError::Persistence(e.to_string())
            })?;

        info!(principal_id, "Session issued");
        Ok(token)
    }

    /// Resolve a presented token to its principal.
    pub async fn validate(&self, token: &str) -> Result<String, AuthError> {
        self.validate_at(token, Utc::now()).await
    }

    /// Resolve a presented token to its principal as of `now`.
    pub async fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        if token.is_empty() {
            return Err(AuthError::SessionNotFound);
        }

        let key = token_key(token);
        let session = match self.store.get_session(&key).await {
            Ok(session) => session,
            Err(StoreError::NotFound { .. }) => {
                debug!("Session not found");
                return Err(AuthError::SessionNotFound);
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(ttl) = self.policy.ttl {
            if is_expired(session.created_at, ttl, now) {
                debug!(principal_id = %session.principal_id, "Session expired");
                return Err(AuthError::SessionExpired);
            }
        }

        if self.policy.track_last_used {
            if let Err(e) = self.store.touch_session(&key, now).await {
                warn!(error = %e, "Failed to record session use");
            }
        }

        Ok(session.principal_id)
    }

    /// Delete the session behind `token` (logout). Idempotent.
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        if token.is_empty() {
            return Ok(());
        }
        self.store.delete_session(&token_key(token)).await?;
        info!("Session revoked");
        Ok(())
    }
}

/// Expired strictly after `created_at + ttl`.
fn is_expired(created_at: DateTime<Utc>, ttl: Duration, now: DateTime<Utc>) -> bool {
    match chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| created_at.checked_add_signed(ttl))
    {
        Some(expires_at) => now > expires_at,
        // Beyond chrono's range: never reached.
        None => false,
    }
}
