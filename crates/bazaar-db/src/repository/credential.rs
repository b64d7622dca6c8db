//! SurrealDB implementation of [`CredentialRepository`].
//!
//! Each credential is stored under `credential:<user_id>`, where
//! `user_id` comes from the `_sequence:credential` counter. A failed
//! insert burns its number, so ids are unique and increasing but not
//! necessarily contiguous.

use bazaar_core::error::BazaarResult;
use bazaar_core::models::credential::{Credential, NewCredential};
use bazaar_core::repository::CredentialRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;

use crate::error::DbError;

const ENTITY: &str = "credential";

#[derive(Debug, SurrealValue)]
struct CredentialRow {
    user_id: i64,
    login: String,
    password_hash: String,
}

impl From<CredentialRow> for Credential {
    fn from(row: CredentialRow) -> Self {
        Credential {
            user_id: row.user_id,
            login: row.login,
            password_hash: row.password_hash,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct SequenceRow {
    last_id: i64,
}

/// SurrealDB implementation of the credential store.
#[derive(Clone)]
pub struct SurrealCredentialRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCredentialRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn next_user_id(&self) -> Result<i64, DbError> {
        let result = self
            .db
            .query(
                "UPSERT type::record('_sequence', $name) \
                 SET last_id = (last_id ?? 0) + 1",
            )
            .bind(("name", ENTITY.to_string()))
            .await?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SequenceRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(|row| row.last_id)
            .ok_or_else(|| DbError::Query("sequence returned no value".into()))
    }
}

impl<C: Connection> CredentialRepository for SurrealCredentialRepository<C> {
    async fn find_by_login(&self, login: &str) -> BazaarResult<Option<Credential>> {
        let mut result = self
            .db
            .query(
                "SELECT user_id, login, password_hash FROM credential \
                 WHERE login = $login LIMIT 1",
            )
            .bind(("login", login.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CredentialRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(Credential::from))
    }

    async fn insert(&self, input: NewCredential) -> BazaarResult<Credential> {
        let user_id = self.next_user_id().await?;

        let result = self
            .db
            .query(
                "CREATE type::record('credential', $user_id) SET \
                 user_id = $user_id, \
                 login = $login, \
                 password_hash = $password_hash",
            )
            .bind(("user_id", user_id))
            .bind(("login", input.login.clone()))
            .bind(("password_hash", input.password_hash))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| {
            debug!(login = %input.login, error = %e, "credential insert rejected");
            DbError::from_statement(ENTITY, e)
        })?;

        let rows: Vec<CredentialRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            id: user_id.to_string(),
        })?;

        Ok(row.into())
    }
}
