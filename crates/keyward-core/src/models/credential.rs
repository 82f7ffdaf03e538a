//! Credential domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored password hash for one principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub principal_id: String,
    /// Self-describing encoded hash (`$argon2id$v=19$...`).
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
