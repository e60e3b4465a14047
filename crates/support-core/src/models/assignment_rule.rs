//! Automatic ticket assignment rule.
//!
//! Each provider team owns one rule, kept in sync with the team's enabled
//! members. New tickets for the provider are handed out round-robin.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRule {
    /// `"<provider> - <team id>"`.
    pub name: String,
    pub support_provider: String,
    pub team_id: Uuid,
    pub users: Vec<String>,
    pub last_assigned: Option<String>,
    pub disabled: bool,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AssignmentRule {
    pub fn rule_name(support_provider: &str, team_id: Uuid) -> String {
        format!("{support_provider} - {team_id}")
    }

    /// The user after `last_assigned`, wrapping around; the first user when
    /// nobody was assigned yet or the last assignee has left the rule.
    pub fn next_user(&self) -> Option<&str> {
        if self.disabled || self.users.is_empty() {
            return None;
        }
        let next = match &self.last_assigned {
            Some(last) => match self.users.iter().position(|u| u == last) {
                Some(idx) => (idx + 1) % self.users.len(),
                None => 0,
            },
            None => 0,
        };
        self.users.get(next).map(String::as_str)
    }
}
