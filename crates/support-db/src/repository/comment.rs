//! SurrealDB implementation of [`CommentRepository`].

use chrono::{DateTime, Utc};
use support_core::error::SupportResult;
use support_core::models::comment::{Comment, CommentTarget, CreateComment};
use support_core::repository::CommentRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct CommentRow {
    target: String,
    reference_name: String,
    content: String,
    comment_email: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CommentRowWithId {
    record_id: String,
    target: String,
    reference_name: String,
    content: String,
    comment_email: Option<String>,
    created_at: DateTime<Utc>,
}

fn parse_target(s: &str) -> Result<CommentTarget, DbError> {
    match s {
        "Ticket" => Ok(CommentTarget::Ticket),
        "Site" => Ok(CommentTarget::Site),
        other => Err(DbError::Decode(format!("unknown comment target: {other}"))),
    }
}

fn target_to_string(t: CommentTarget) -> &'static str {
    match t {
        CommentTarget::Ticket => "Ticket",
        CommentTarget::Site => "Site",
    }
}

impl CommentRow {
    fn into_comment(self, id: Uuid) -> Result<Comment, DbError> {
        Ok(Comment {
            id,
            target: parse_target(&self.target)?,
            reference_name: self.reference_name,
            content: self.content,
            comment_email: self.comment_email,
            created_at: self.created_at,
        })
    }
}

impl CommentRowWithId {
    fn try_into_comment(self) -> Result<Comment, DbError> {
        Ok(Comment {
            id: parse_uuid(&self.record_id, "comment")?,
            target: parse_target(&self.target)?,
            reference_name: self.reference_name,
            content: self.content,
            comment_email: self.comment_email,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Comment repository.
#[derive(Clone)]
pub struct SurrealCommentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCommentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CommentRepository for SurrealCommentRepository<C> {
    async fn create(&self, input: CreateComment) -> SupportResult<Comment> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('comment', $id) SET \
                 target = $target, reference_name = $reference_name, \
                 content = $content, comment_email = $comment_email",
            )
            .bind(("id", id_str.clone()))
            .bind(("target", target_to_string(input.target)))
            .bind(("reference_name", input.reference_name))
            .bind(("content", input.content))
            .bind(("comment_email", input.comment_email))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<CommentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "comment".into(),
            id: id_str,
        })?;

        row.into_comment(id).map_err(Into::into)
    }

    async fn list_for(
        &self,
        target: CommentTarget,
        reference_name: &str,
    ) -> SupportResult<Vec<Comment>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM comment \
                 WHERE target = $target AND reference_name = $reference_name \
                 ORDER BY created_at DESC",
            )
            .bind(("target", target_to_string(target)))
            .bind(("reference_name", reference_name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CommentRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|r| r.try_into_comment().map_err(Into::into))
            .collect()
    }
}
