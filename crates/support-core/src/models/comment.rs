//! Comment domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommentTarget {
    Ticket,
    Site,
}

/// Free-form note attached to a ticket or a site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub target: CommentTarget,
    /// Ticket id or site name, depending on `target`.
    pub reference_name: String,
    pub content: String,
    pub comment_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComment {
    pub target: CommentTarget,
    pub reference_name: String,
    pub content: String,
    pub comment_email: Option<String>,
}
