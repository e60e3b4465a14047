//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Lookups that the portal treats as
//! "present or absent" return `Option`; lookups by primary id return
//! [`SupportError::NotFound`](crate::error::SupportError::NotFound) when the
//! record is missing.

use uuid::Uuid;

use crate::actor::Actor;
use crate::error::SupportResult;
use crate::models::{
    assignment_rule::AssignmentRule,
    comment::{Comment, CommentTarget, CreateComment},
    provider::{
        AgentProfile, CreateSupportTeam, CreateTeamMember, SupportProvider, SupportTeam,
        TeamMember,
    },
    reply::{CreateReply, Reply},
    session::{CreateSession, Session},
    site::{CreateSiteUser, CreateSupportedSite, SiteSummary, SiteUser, SupportedSite},
    ticket::{CreateTicket, Ticket, TicketFilter, UpdateTicket},
};

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub trait SessionRepository: Send + Sync {
    fn create(&self, input: CreateSession) -> impl Future<Output = SupportResult<Session>> + Send;
    fn find_by_key(
        &self,
        key: &str,
    ) -> impl Future<Output = SupportResult<Option<Session>>> + Send;
    /// Oldest session for the email, if any.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = SupportResult<Option<Session>>> + Send;
    /// Delete the session holding `key`. Unknown keys are a no-op.
    fn delete_by_key(&self, key: &str) -> impl Future<Output = SupportResult<()>> + Send;
    /// Delete every session of `email`, returning how many were removed.
    fn delete_by_email(&self, email: &str) -> impl Future<Output = SupportResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Providers, teams and agents
// ---------------------------------------------------------------------------

pub trait TeamRepository: Send + Sync {
    fn create_provider(
        &self,
        name: &str,
    ) -> impl Future<Output = SupportResult<SupportProvider>> + Send;
    fn get_provider(
        &self,
        name: &str,
    ) -> impl Future<Output = SupportResult<Option<SupportProvider>>> + Send;
    fn create_team(
        &self,
        input: CreateSupportTeam,
    ) -> impl Future<Output = SupportResult<SupportTeam>> + Send;
    fn get_team(&self, id: Uuid) -> impl Future<Output = SupportResult<SupportTeam>> + Send;
    fn add_member(
        &self,
        input: CreateTeamMember,
    ) -> impl Future<Output = SupportResult<TeamMember>> + Send;
    fn find_member(
        &self,
        team_id: Uuid,
        email: &str,
    ) -> impl Future<Output = SupportResult<Option<TeamMember>>> + Send;
    fn list_members(
        &self,
        team_id: Uuid,
    ) -> impl Future<Output = SupportResult<Vec<TeamMember>>> + Send;
    /// Remove a membership. Unknown memberships are a no-op.
    fn remove_member(
        &self,
        team_id: Uuid,
        email: &str,
    ) -> impl Future<Output = SupportResult<()>> + Send;
    fn set_member_disabled(
        &self,
        team_id: Uuid,
        email: &str,
        disabled: bool,
    ) -> impl Future<Output = SupportResult<TeamMember>> + Send;
    /// Every team membership of `email`, joined with team and provider,
    /// oldest membership first.
    fn agent_profiles(
        &self,
        email: &str,
    ) -> impl Future<Output = SupportResult<Vec<AgentProfile>>> + Send;
}

// ---------------------------------------------------------------------------
// Sites
// ---------------------------------------------------------------------------

pub trait SiteRepository: Send + Sync {
    fn create(
        &self,
        input: CreateSupportedSite,
    ) -> impl Future<Output = SupportResult<SupportedSite>> + Send;
    fn get(
        &self,
        site_name: &str,
    ) -> impl Future<Output = SupportResult<Option<SupportedSite>>> + Send;
    fn set_provider(
        &self,
        site_name: &str,
        support_provider: Option<String>,
    ) -> impl Future<Output = SupportResult<SupportedSite>> + Send;
    fn add_user(&self, input: CreateSiteUser)
    -> impl Future<Output = SupportResult<SiteUser>> + Send;
    fn find_user(
        &self,
        site_name: &str,
        email: &str,
    ) -> impl Future<Output = SupportResult<Option<SiteUser>>> + Send;
    fn set_user_disabled(
        &self,
        site_name: &str,
        email: &str,
        disabled: bool,
    ) -> impl Future<Output = SupportResult<SiteUser>> + Send;
    /// Names of the sites `email` is linked to through a non-disabled link.
    fn site_names_for_email(
        &self,
        email: &str,
    ) -> impl Future<Output = SupportResult<Vec<String>>> + Send;
    fn summary(
        &self,
        site_name: &str,
    ) -> impl Future<Output = SupportResult<Option<SiteSummary>>> + Send;
    fn summaries_for_provider(
        &self,
        support_provider: &str,
    ) -> impl Future<Output = SupportResult<Vec<SiteSummary>>> + Send;
}

// ---------------------------------------------------------------------------
// Tickets, replies, comments
// ---------------------------------------------------------------------------

pub trait TicketRepository: Send + Sync {
    fn create(
        &self,
        input: CreateTicket,
        actor: &Actor,
    ) -> impl Future<Output = SupportResult<Ticket>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = SupportResult<Ticket>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateTicket,
        actor: &Actor,
    ) -> impl Future<Output = SupportResult<Ticket>> + Send;
    /// Tickets matching `filter`, newest first.
    fn list(&self, filter: TicketFilter)
    -> impl Future<Output = SupportResult<Vec<Ticket>>> + Send;
}

pub trait ReplyRepository: Send + Sync {
    fn create(&self, input: CreateReply) -> impl Future<Output = SupportResult<Reply>> + Send;
    /// Replies on a ticket, newest first.
    fn list_for_ticket(
        &self,
        ticket_id: Uuid,
    ) -> impl Future<Output = SupportResult<Vec<Reply>>> + Send;
}

pub trait CommentRepository: Send + Sync {
    fn create(&self, input: CreateComment)
    -> impl Future<Output = SupportResult<Comment>> + Send;
    fn list_for(
        &self,
        target: CommentTarget,
        reference_name: &str,
    ) -> impl Future<Output = SupportResult<Vec<Comment>>> + Send;
}

// ---------------------------------------------------------------------------
// Assignment rules
// ---------------------------------------------------------------------------

pub trait AssignmentRuleRepository: Send + Sync {
    /// Create the team's rule or replace its user list.
    fn upsert_for_team(
        &self,
        support_provider: &str,
        team_id: Uuid,
        users: Vec<String>,
        actor: &Actor,
    ) -> impl Future<Output = SupportResult<AssignmentRule>> + Send;
    fn get(&self, name: &str)
    -> impl Future<Output = SupportResult<Option<AssignmentRule>>> + Send;
    /// First enabled rule of the provider.
    fn find_for_provider(
        &self,
        support_provider: &str,
    ) -> impl Future<Output = SupportResult<Option<AssignmentRule>>> + Send;
    fn record_assignment(
        &self,
        name: &str,
        user: &str,
        actor: &Actor,
    ) -> impl Future<Output = SupportResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// Bundle of every repository the portal services need, so services stay
/// generic over a single storage backend.
pub trait Repositories: Send + Sync {
    type Sessions: SessionRepository;
    type Teams: TeamRepository;
    type Sites: SiteRepository;
    type Tickets: TicketRepository;
    type Replies: ReplyRepository;
    type Comments: CommentRepository;
    type AssignmentRules: AssignmentRuleRepository;

    fn sessions(&self) -> &Self::Sessions;
    fn teams(&self) -> &Self::Teams;
    fn sites(&self) -> &Self::Sites;
    fn tickets(&self) -> &Self::Tickets;
    fn replies(&self) -> &Self::Replies;
    fn comments(&self) -> &Self::Comments;
    fn assignment_rules(&self) -> &Self::AssignmentRules;
}
