//! SurrealDB implementation of [`ReplyRepository`].

use chrono::{DateTime, Utc};
use support_core::error::SupportResult;
use support_core::models::reply::{CreateReply, Direction, Reply};
use support_core::repository::ReplyRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct ReplyRowWithId {
    record_id: String,
    ticket_id: String,
    sender: String,
    sender_full_name: Option<String>,
    recipients: Option<String>,
    subject: String,
    content: String,
    direction: String,
    seen: bool,
    created_at: DateTime<Utc>,
}

fn parse_direction(s: &str) -> Result<Direction, DbError> {
    match s {
        "Sent" => Ok(Direction::Sent),
        "Received" => Ok(Direction::Received),
        other => Err(DbError::Decode(format!("unknown reply direction: {other}"))),
    }
}

fn direction_to_string(d: Direction) -> &'static str {
    match d {
        Direction::Sent => "Sent",
        Direction::Received => "Received",
    }
}

impl ReplyRowWithId {
    fn try_into_reply(self) -> Result<Reply, DbError> {
        Ok(Reply {
            id: parse_uuid(&self.record_id, "reply")?,
            ticket_id: parse_uuid(&self.ticket_id, "ticket")?,
            sender: self.sender,
            sender_full_name: self.sender_full_name,
            recipients: self.recipients,
            subject: self.subject,
            content: self.content,
            direction: parse_direction(&self.direction)?,
            seen: self.seen,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Reply repository.
#[derive(Clone)]
pub struct SurrealReplyRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealReplyRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn get_by_id(&self, id: Uuid) -> SupportResult<Reply> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('reply', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReplyRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "reply".into(),
            id: id_str,
        })?;
        row.try_into_reply().map_err(Into::into)
    }
}

impl<C: Connection> ReplyRepository for SurrealReplyRepository<C> {
    async fn create(&self, input: CreateReply) -> SupportResult<Reply> {
        let id = Uuid::new_v4();

        self.db
            .query(
                "CREATE type::record('reply', $id) SET \
                 ticket_id = $ticket_id, sender = $sender, \
                 sender_full_name = $sender_full_name, \
                 recipients = $recipients, subject = $subject, \
                 content = $content, direction = $direction, seen = false",
            )
            .bind(("id", id.to_string()))
            .bind(("ticket_id", input.ticket_id.to_string()))
            .bind(("sender", input.sender))
            .bind(("sender_full_name", input.sender_full_name))
            .bind(("recipients", input.recipients))
            .bind(("subject", input.subject))
            .bind(("content", input.content))
            .bind(("direction", direction_to_string(input.direction)))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_by_id(id).await
    }

    async fn list_for_ticket(&self, ticket_id: Uuid) -> SupportResult<Vec<Reply>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM reply \
                 WHERE ticket_id = $ticket_id ORDER BY created_at DESC",
            )
            .bind(("ticket_id", ticket_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReplyRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|r| r.try_into_reply().map_err(Into::into))
            .collect()
    }
}
