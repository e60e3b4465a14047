//! Agent portal.
//!
//! Agents act for their support provider: they see every ticket and site of
//! the provider and manage the members of their own team.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use support_core::error::SupportResult;
use support_core::models::comment::{CommentTarget, CreateComment};
use support_core::models::provider::{AgentProfile, CreateTeamMember};
use support_core::models::reply::{CreateReply, Direction, Reply};
use support_core::models::site::{CreateSupportedSite, SiteSummary};
use support_core::models::ticket::{StatusFilter, Ticket, TicketStatus, UpdateTicket};
use support_core::repository::{
    CommentRepository, ReplyRepository, Repositories, SiteRepository, TeamRepository,
    TicketRepository,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::assignment;
use crate::config::PortalConfig;
use crate::customer::normalize_site_name;
use crate::error::PortalError;
use crate::mailer::{self, Audience, Mailer};
use crate::scope::{AgentScope, Scope, ScopeResolver};
use crate::session::SessionRegistry;

/// Comment recorded on a site when its provider releases it.
pub const SITE_RELEASED_COMMENT: &str = "Site removed by support provider.";

#[derive(Debug, Clone, Deserialize)]
pub struct NewAgent {
    pub email: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl NewAgent {
    fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentDetail {
    pub profile: AgentProfile,
    /// Provider tickets, newest first; only when requested.
    pub tickets: Option<Vec<Ticket>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentTicketView {
    pub ticket: Ticket,
    /// Newest first.
    pub replies: Vec<Reply>,
}

pub struct AgentPortal<R: Repositories, M: Mailer> {
    repos: R,
    mailer: M,
    config: PortalConfig,
}

impl<R: Repositories, M: Mailer> AgentPortal<R, M> {
    pub fn new(repos: R, mailer: M, config: PortalConfig) -> Self {
        Self {
            repos,
            mailer,
            config,
        }
    }

    fn sessions(&self) -> SessionRegistry<'_, R::Sessions, M> {
        SessionRegistry::new(self.repos.sessions(), &self.mailer, &self.config)
    }

    fn resolver(&self) -> ScopeResolver<'_, R> {
        ScopeResolver::new(&self.repos)
    }

    async fn authorize(&self, key: &str) -> SupportResult<AgentScope> {
        let email = self.sessions().require(key).await?;
        self.resolver().resolve_agent_scope(&email).await
    }

    /// Profile of a member of the caller's team.
    async fn teammate(&self, agent: &AgentScope, email: &str) -> SupportResult<Option<AgentProfile>> {
        let Some(member) = self.repos.teams().find_member(agent.team_id(), email).await? else {
            return Ok(None);
        };
        let team = self.repos.teams().get_team(agent.team_id()).await?;
        Ok(Some(AgentProfile::from_parts(&team, &member)))
    }

    async fn sync_rule(&self, agent: &AgentScope) -> SupportResult<()> {
        assignment::sync_team_rule(&self.repos, agent.support_provider(), agent.team_id()).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Session keys
    // -----------------------------------------------------------------------

    /// Mail a login link. Emails without an enabled team membership are
    /// refused.
    pub async fn send_login_link(&self, email: &str) -> SupportResult<()> {
        self.resolver().resolve_agent_scope(email).await?;
        self.sessions().issue_and_send(email, Audience::Agent).await?;
        Ok(())
    }

    /// The email behind `key`, provided it is still an enabled agent.
    pub async fn validate_session_key(&self, key: &str) -> SupportResult<Option<String>> {
        let Some(email) = self.sessions().validate(key).await? else {
            return Ok(None);
        };
        let enabled = self
            .repos
            .teams()
            .agent_profiles(&email)
            .await?
            .iter()
            .any(|p| !p.disabled);
        Ok(enabled.then_some(email))
    }

    pub async fn clear_session_key(&self, key: &str) -> SupportResult<()> {
        self.sessions().revoke(key).await
    }

    // -----------------------------------------------------------------------
    // Team
    // -----------------------------------------------------------------------

    /// Every member of the caller's team, disabled ones included.
    pub async fn get_agents(&self, key: &str) -> SupportResult<Vec<AgentProfile>> {
        let agent = self.authorize(key).await?;
        let team = self.repos.teams().get_team(agent.team_id()).await?;
        let members = self.repos.teams().list_members(agent.team_id()).await?;
        Ok(members
            .iter()
            .map(|m| AgentProfile::from_parts(&team, m))
            .collect())
    }

    /// The caller, or a teammate when `email` is given.
    pub async fn get_agent(
        &self,
        key: &str,
        email: Option<&str>,
        with_tickets: bool,
    ) -> SupportResult<AgentDetail> {
        let agent = self.authorize(key).await?;
        let profile = match email {
            None => agent.profile().clone(),
            Some(email) => self
                .teammate(&agent, email)
                .await?
                .ok_or(PortalError::NotRegistered)?,
        };

        let tickets = if with_tickets {
            let scope = Scope::Agent(agent);
            Some(
                self.resolver()
                    .tickets(&scope, StatusFilter::Any, None)
                    .await?,
            )
        } else {
            None
        };
        Ok(AgentDetail { profile, tickets })
    }

    /// Add an agent to the caller's team. `None` when already a member.
    pub async fn add_agent(&self, key: &str, input: NewAgent) -> SupportResult<Option<AgentProfile>> {
        let agent = self.authorize(key).await?;
        let email = input.email.trim().to_string();
        if email.is_empty() {
            return Err(PortalError::InvalidInput("Email is required.".into()).into());
        }
        if self.repos.teams().find_member(agent.team_id(), &email).await?.is_some() {
            debug!(email = %email, "Agent already in team");
            return Ok(None);
        }

        let member = self
            .repos
            .teams()
            .add_member(CreateTeamMember {
                team_id: agent.team_id(),
                email,
                full_name: input.full_name(),
            })
            .await?;
        self.sync_rule(&agent).await?;

        let team = self.repos.teams().get_team(agent.team_id()).await?;
        info!(added = %member.email, by = agent.email(), "Agent added to team");
        Ok(Some(AgentProfile::from_parts(&team, &member)))
    }

    pub async fn remove_agent(&self, key: &str, email: &str) -> SupportResult<()> {
        let agent = self.authorize(key).await?;
        if agent.email() == email {
            return Err(PortalError::CannotModifySelf("remove").into());
        }
        if self.repos.teams().find_member(agent.team_id(), email).await?.is_none() {
            return Err(PortalError::AgentNotFound.into());
        }

        self.repos.teams().remove_member(agent.team_id(), email).await?;
        self.sync_rule(&agent).await?;
        info!(removed = email, by = agent.email(), "Agent removed from team");
        Ok(())
    }

    pub async fn disable_agent(&self, key: &str, email: &str) -> SupportResult<AgentProfile> {
        let agent = self.authorize(key).await?;
        if agent.email() == email {
            return Err(PortalError::CannotModifySelf("disable").into());
        }
        if self.repos.teams().find_member(agent.team_id(), email).await?.is_none() {
            return Err(PortalError::AgentNotFound.into());
        }

        let member = self
            .repos
            .teams()
            .set_member_disabled(agent.team_id(), email, true)
            .await?;
        self.sync_rule(&agent).await?;

        let team = self.repos.teams().get_team(agent.team_id()).await?;
        info!(disabled = email, by = agent.email(), "Agent disabled");
        Ok(AgentProfile::from_parts(&team, &member))
    }

    // -----------------------------------------------------------------------
    // Tickets
    // -----------------------------------------------------------------------

    /// Provider tickets filtered by status and search text, newest first.
    pub async fn list_tickets(
        &self,
        key: &str,
        status: StatusFilter,
        search_text: Option<String>,
    ) -> SupportResult<Vec<Ticket>> {
        let scope = Scope::Agent(self.authorize(key).await?);
        self.resolver().tickets(&scope, status, search_text).await
    }

    pub async fn get_ticket(&self, key: &str, id: Uuid) -> SupportResult<AgentTicketView> {
        let scope = Scope::Agent(self.authorize(key).await?);
        let ticket = self.resolver().ticket(&scope, id).await?;
        let replies = self.repos.replies().list_for_ticket(id).await?;
        Ok(AgentTicketView { ticket, replies })
    }

    /// Answer the customer. The ticket moves to Replied unless it is
    /// already closed.
    pub async fn reply_to_ticket(&self, key: &str, id: Uuid, content: &str) -> SupportResult<Reply> {
        let agent = self.authorize(key).await?;
        let scope = Scope::Agent(agent.clone());
        let ticket = self.resolver().ticket(&scope, id).await?;

        let subject = format!("Re: {}", ticket.subject);
        let reply = self
            .repos
            .replies()
            .create(CreateReply {
                ticket_id: ticket.id,
                sender: agent.email().to_string(),
                sender_full_name: Some(agent.profile().full_name.clone()),
                recipients: ticket.raised_by.clone(),
                subject: subject.clone(),
                content: content.to_string(),
                direction: Direction::Sent,
            })
            .await?;

        let mut update = UpdateTicket::default();
        if ticket.status != TicketStatus::Closed {
            update.status = Some(TicketStatus::Replied);
        }
        if ticket.first_responded_on.is_none() {
            update.first_responded_on = Some(Some(Utc::now()));
        }
        self.repos
            .tickets()
            .update(ticket.id, update, &scope.actor())
            .await?;

        if let Some(email) = mailer::agent_reply_email(&ticket, &subject, content) {
            mailer::dispatch(&self.mailer, &self.config, email).await;
        }

        info!(ticket_id = %ticket.id, agent = agent.email(), "Agent replied");
        Ok(reply)
    }

    /// Add `assignee` to the ticket, or remove them if already assigned.
    /// Returns the resulting assignees.
    pub async fn toggle_assignee(
        &self,
        key: &str,
        id: Uuid,
        assignee: &str,
    ) -> SupportResult<Vec<String>> {
        let agent = self.authorize(key).await?;
        if self
            .repos
            .teams()
            .find_member(agent.team_id(), assignee)
            .await?
            .is_none()
        {
            return Err(PortalError::AssigneeNotInTeam.into());
        }
        let scope = Scope::Agent(agent);
        let ticket = self.resolver().ticket(&scope, id).await?;

        let mut assignees = ticket.assignees;
        if let Some(pos) = assignees.iter().position(|a| a == assignee) {
            assignees.remove(pos);
        } else {
            assignees.push(assignee.to_string());
        }

        let ticket = self
            .repos
            .tickets()
            .update(
                ticket.id,
                UpdateTicket {
                    assignees: Some(assignees),
                    ..Default::default()
                },
                &scope.actor(),
            )
            .await?;
        Ok(ticket.assignees)
    }

    /// Resolved and Closed stamp the resolution date; any other status
    /// clears it.
    pub async fn set_status(
        &self,
        key: &str,
        id: Uuid,
        status: TicketStatus,
    ) -> SupportResult<TicketStatus> {
        let scope = Scope::Agent(self.authorize(key).await?);
        let ticket = self.resolver().ticket(&scope, id).await?;

        let update = UpdateTicket {
            status: Some(status),
            resolution_date: Some(status.is_terminal().then(Utc::now)),
            ..Default::default()
        };
        let ticket = self
            .repos
            .tickets()
            .update(ticket.id, update, &scope.actor())
            .await?;

        info!(ticket_id = %ticket.id, status = %ticket.status, "Ticket status set");
        Ok(ticket.status)
    }

    // -----------------------------------------------------------------------
    // Sites
    // -----------------------------------------------------------------------

    /// Take a site under the caller's provider. Released sites are
    /// reclaimed; sites held by anyone are refused.
    pub async fn add_site(&self, key: &str, site_name: &str) -> SupportResult<SiteSummary> {
        let agent = self.authorize(key).await?;
        let site_name = normalize_site_name(site_name);
        if site_name.is_empty() {
            return Err(PortalError::InvalidInput("Site name is required.".into()).into());
        }
        let provider = agent.support_provider().to_string();

        match self.repos.sites().get(&site_name).await? {
            Some(site) => match site.support_provider.as_deref() {
                Some(owner) if owner == provider => return Err(PortalError::SiteExists.into()),
                Some(_) => return Err(PortalError::SiteOwnedElsewhere.into()),
                None => {
                    self.repos
                        .sites()
                        .set_provider(&site_name, Some(provider.clone()))
                        .await?;
                    info!(site = %site_name, provider = %provider, "Site reclaimed");
                }
            },
            None => {
                self.repos
                    .sites()
                    .create(CreateSupportedSite {
                        site_name: site_name.clone(),
                        support_provider: Some(provider.clone()),
                    })
                    .await?;
                info!(site = %site_name, provider = %provider, "Site added");
            }
        }

        self.site_summary(&agent, &site_name).await
    }

    /// Release one of the caller's sites and note it on the site.
    pub async fn remove_site(&self, key: &str, site_name: &str) -> SupportResult<()> {
        let agent = self.authorize(key).await?;
        let site_name = normalize_site_name(site_name);
        self.site_summary(&agent, &site_name).await?;

        self.repos.sites().set_provider(&site_name, None).await?;
        self.repos
            .comments()
            .create(CreateComment {
                target: CommentTarget::Site,
                reference_name: site_name.clone(),
                content: SITE_RELEASED_COMMENT.into(),
                comment_email: Some(agent.email().to_string()),
            })
            .await?;

        info!(site = %site_name, provider = agent.support_provider(), "Site released");
        Ok(())
    }

    pub async fn get_site(&self, key: &str, site_name: &str) -> SupportResult<SiteSummary> {
        let agent = self.authorize(key).await?;
        self.site_summary(&agent, &normalize_site_name(site_name)).await
    }

    pub async fn get_sites(&self, key: &str) -> SupportResult<Vec<SiteSummary>> {
        let agent = self.authorize(key).await?;
        self.repos
            .sites()
            .summaries_for_provider(agent.support_provider())
            .await
    }

    async fn site_summary(&self, agent: &AgentScope, site_name: &str) -> SupportResult<SiteSummary> {
        let summary = self
            .repos
            .sites()
            .summary(site_name)
            .await?
            .ok_or(PortalError::SiteNotInScope)?;
        agent.ensure_site(&summary)?;
        Ok(summary)
    }
}
