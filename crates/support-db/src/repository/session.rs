//! SurrealDB implementation of [`SessionRepository`].

use chrono::{DateTime, Utc};
use support_core::error::SupportResult;
use support_core::models::session::{CreateSession, Session};
use support_core::repository::SessionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};

/// Row returned by `CREATE`, where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct SessionRow {
    key: String,
    email: String,
    created_at: DateTime<Utc>,
}

/// Row that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct SessionRowWithId {
    record_id: String,
    key: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl SessionRowWithId {
    fn try_into_session(self) -> Result<Session, DbError> {
        Ok(Session {
            id: parse_uuid(&self.record_id, "session")?,
            key: self.key,
            email: self.email,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
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

    async fn find_one(&self, field: &'static str, value: &str) -> SupportResult<Option<Session>> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM support_session \
             WHERE {field} = $value ORDER BY created_at ASC LIMIT 1"
        );
        let mut result = self
            .db
            .query(query)
            .bind(("value", value.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_session()?)),
            None => Ok(None),
        }
    }
}

impl<C: Connection> SessionRepository for SurrealSessionRepository<C> {
    async fn create(&self, input: CreateSession) -> SupportResult<Session> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('support_session', $id) SET \
                 key = $key, email = $email",
            )
            .bind(("id", id_str.clone()))
            .bind(("key", input.key))
            .bind(("email", input.email))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "support_session".into(),
            id: id_str,
        })?;

        Ok(Session {
            id,
            key: row.key,
            email: row.email,
            created_at: row.created_at,
        })
    }

    async fn find_by_key(&self, key: &str) -> SupportResult<Option<Session>> {
        self.find_one("key", key).await
    }

    async fn find_by_email(&self, email: &str) -> SupportResult<Option<Session>> {
        self.find_one("email", email).await
    }

    async fn delete_by_key(&self, key: &str) -> SupportResult<()> {
        self.db
            .query("DELETE support_session WHERE key = $key")
            .bind(("key", key.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn delete_by_email(&self, email: &str) -> SupportResult<u64> {
        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM support_session \
                 WHERE email = $email GROUP ALL",
            )
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        self.db
            .query("DELETE support_session WHERE email = $email")
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(total)
    }
}
