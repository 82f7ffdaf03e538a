//! Session domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted session, looked up by its token key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub principal_id: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSession {
    /// Digest of the raw token; the raw token is never stored.
    pub token_key: String,
    pub principal_id: String,
    pub created_at: DateTime<Utc>,
}
