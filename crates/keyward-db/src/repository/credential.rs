//! SurrealDB implementation of [`CredentialRepository`].

use chrono::{DateTime, Utc};
use keyward_core::error::StoreResult;
use keyward_core::models::credential::Credential;
use keyward_core::repository::CredentialRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct CredentialRow {
    principal_id: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CredentialRow> for Credential {
    fn from(row: CredentialRow) -> Self {
        Credential {
            principal_id: row.principal_id,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// SurrealDB implementation of the Credential repository.
#[derive(Clone)]
pub struct SurrealCredentialRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCredentialRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CredentialRepository for SurrealCredentialRepository<C> {
    async fn create_credential(
        &self,
        principal_id: &str,
        password_hash: &str,
    ) -> StoreResult<Credential> {
        let id_str = principal_id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('credential', $id) SET \
                 principal_id = $id, \
                 password_hash = $password_hash",
            )
            .bind(("id", id_str.clone()))
            .bind(("password_hash", password_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("credential", e))?;

        let rows: Vec<CredentialRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "credential".into(),
            id: id_str,
        })?;

        Ok(row.into())
    }

    async fn put_credential(&self, principal_id: &str, password_hash: &str) -> StoreResult<()> {
        self.db
            .query(
                "UPSERT type::record('credential', $id) SET \
                 principal_id = $id, \
                 password_hash = $password_hash, \
                 updated_at = time::now()",
            )
            .bind(("id", principal_id.to_string()))
            .bind(("password_hash", password_hash.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_write("credential", e))?;

        Ok(())
    }

    async fn get_credential(&self, principal_id: &str) -> StoreResult<Credential> {
        let id_str = principal_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT principal_id, password_hash, created_at, updated_at \
                 FROM type::record('credential', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CredentialRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "credential".into(),
            id: id_str,
        })?;

        Ok(row.into())
    }
}
