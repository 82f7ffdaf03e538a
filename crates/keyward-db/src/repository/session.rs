//! SurrealDB implementation of [`SessionRepository`].

use chrono::{DateTime, Utc};
use keyward_core::error::StoreResult;
use keyward_core::models::session::{CreateSession, Session};
use keyward_core::repository::SessionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct SessionRow {
    principal_id: String,
    created_at: DateTime<Utc>,
    last_used_at: Option<DateTime<Utc>>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            principal_id: row.principal_id,
            created_at: row.created_at,
            last_used_at: row.last_used_at,
        }
    }
}

/// SurrealDB implementation of the Session repository.
#[derive(Clone)]
pub struct SurrealSessionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSessionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SessionRepository for SurrealSessionRepository<C> {
    async fn put_session(&self, input: CreateSession) -> StoreResult<()> {
        // A single CREATE either writes the whole row or nothing.
        self.db
            .query(
                "CREATE type::record('session', $key) SET \
                 principal_id = $principal_id, \
                 created_at = $created_at, \
                 last_used_at = NONE",
            )
            .bind(("key", input.token_key))
            .bind(("principal_id", input.principal_id))
            .bind(("created_at", input.created_at))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_write("session", e))?;

        Ok(())
    }

    async fn get_session(&self, token_key: &str) -> StoreResult<Session> {
        let key = token_key.to_string();

        let mut result = self
            .db
            .query(
                "SELECT principal_id, created_at, last_used_at \
                 FROM type::record('session', $key)",
            )
            .bind(("key", key.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: key,
        })?;

        Ok(row.into())
    }

    async fn touch_session(&self, token_key: &str, at: DateTime<Utc>) -> StoreResult<()> {
        // UPDATE never creates, so a deleted session stays deleted.
        self.db
            .query("UPDATE type::record('session', $key) SET last_used_at = $at")
            .bind(("key", token_key.to_string()))
            .bind(("at", at))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn delete_session(&self, token_key: &str) -> StoreResult<()> {
        self.db
            .query("DELETE type::record('session', $key)")
            .bind(("key", token_key.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }
}
