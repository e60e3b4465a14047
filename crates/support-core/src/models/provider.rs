//! Support provider, team, and team member (agent) models.
//!
//! A support provider is the organization that supplies support for a set
//! of customer sites. Its agents are organised into teams; team membership
//! is what grants an email address access to the agent portal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportProvider {
    /// Unique provider name; doubles as the provider identifier on
    /// tickets and sites.
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportTeam {
    pub id: Uuid,
    pub support_provider: String,
    pub team_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSupportTeam {
    pub support_provider: String,
    pub team_name: String,
}

/// Membership of an agent in a provider team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: Uuid,
    pub team_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTeamMember {
    pub team_id: Uuid,
    pub email: String,
    pub full_name: String,
}

/// Team member joined with its team and provider, the shape the agent
/// portal hands back for "who is this agent".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentProfile {
    pub support_provider: String,
    pub team_id: Uuid,
    pub team_name: String,
    pub email: String,
    pub full_name: String,
    pub disabled: bool,
}

impl AgentProfile {
    pub fn from_parts(team: &SupportTeam, member: &TeamMember) -> Self {
        Self {
            support_provider: team.support_provider.clone(),
            team_id: team.id,
            team_name: team.team_name.clone(),
            email: member.email.clone(),
            full_name: member.full_name.clone(),
            disabled: member.disabled,
        }
    }
}
