//! Ticket domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SupportError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TicketStatus {
    Open,
    Replied,
    OnHold,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::Replied => "Replied",
            TicketStatus::OnHold => "OnHold",
            TicketStatus::Resolved => "Resolved",
            TicketStatus::Closed => "Closed",
        }
    }

    /// Resolved and Closed tickets carry a resolution date.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Resolved | TicketStatus::Closed)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = SupportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(TicketStatus::Open),
            "Replied" => Ok(TicketStatus::Replied),
            "OnHold" | "On Hold" => Ok(TicketStatus::OnHold),
            "Resolved" => Ok(TicketStatus::Resolved),
            "Closed" => Ok(TicketStatus::Closed),
            other => Err(SupportError::Validation {
                message: format!("unknown ticket status: {other}"),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub subject: String,
    pub status: TicketStatus,
    pub priority: Option<String>,
    /// Email of the customer who raised the ticket.
    pub raised_by: Option<String>,
    pub site_name: Option<String>,
    pub support_provider: Option<String>,
    /// Channel the ticket arrived through.
    pub source: String,
    /// Emails of the agents the ticket is assigned to.
    pub assignees: Vec<String>,
    pub closed_by: Option<String>,
    pub support_rating: Option<u8>,
    pub reference_document: Option<String>,
    pub reference_module: Option<String>,
    pub reference_name: Option<String>,
    pub first_responded_on: Option<DateTime<Utc>>,
    pub resolution_date: Option<DateTime<Utc>>,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTicket {
    pub subject: String,
    pub raised_by: Option<String>,
    pub site_name: Option<String>,
    pub support_provider: Option<String>,
    pub source: String,
    pub reference_document: Option<String>,
    pub reference_module: Option<String>,
    pub reference_name: Option<String>,
}

/// Partial update. `Some(None)` clears an optional field.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTicket {
    pub status: Option<TicketStatus>,
    pub priority: Option<Option<String>>,
    pub assignees: Option<Vec<String>>,
    pub closed_by: Option<Option<String>>,
    pub support_rating: Option<Option<u8>>,
    pub first_responded_on: Option<Option<DateTime<Utc>>>,
    pub resolution_date: Option<Option<DateTime<Utc>>>,
}

/// Which side of the open/closed split a ticket listing covers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Everything except Closed.
    #[default]
    Open,
    Closed,
    Any,
}

/// Storage-level ticket query. Scope restrictions are expressed here so the
/// store can apply them; an empty `site_names` list matches nothing.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub site_names: Option<Vec<String>>,
    pub support_provider: Option<String>,
    pub status: StatusFilter,
    /// Case-insensitive substring match on subject or site name.
    pub search_text: Option<String>,
}
