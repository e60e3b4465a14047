//! Ticket reply (communication) model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `Sent` replies come from an agent, `Received` ones from the customer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub sender: String,
    pub sender_full_name: Option<String>,
    pub recipients: Option<String>,
    pub subject: String,
    pub content: String,
    pub direction: Direction,
    pub seen: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReply {
    pub ticket_id: Uuid,
    pub sender: String,
    pub sender_full_name: Option<String>,
    pub recipients: Option<String>,
    pub subject: String,
    pub content: String,
    pub direction: Direction,
}
