//! SurrealDB repository implementations.

mod assignment_rule;
mod comment;
mod reply;
mod session;
mod site;
mod team;
mod ticket;

pub use assignment_rule::SurrealAssignmentRuleRepository;
pub use comment::SurrealCommentRepository;
pub use reply::SurrealReplyRepository;
pub use session::SurrealSessionRepository;
pub use site::SurrealSiteRepository;
pub use team::SurrealTeamRepository;
pub use ticket::SurrealTicketRepository;

use support_core::repository::Repositories;
use surrealdb::{Connection, Surreal};

/// Every SurrealDB repository over one shared client.
#[derive(Clone)]
pub struct SurrealRepositories<C: Connection> {
    sessions: SurrealSessionRepository<C>,
    teams: SurrealTeamRepository<C>,
    sites: SurrealSiteRepository<C>,
    tickets: SurrealTicketRepository<C>,
    replies: SurrealReplyRepository<C>,
    comments: SurrealCommentRepository<C>,
    assignment_rules: SurrealAssignmentRuleRepository<C>,
}

impl<C: Connection> SurrealRepositories<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            sessions: SurrealSessionRepository::new(db.clone()),
            teams: SurrealTeamRepository::new(db.clone()),
            sites: SurrealSiteRepository::new(db.clone()),
            tickets: SurrealTicketRepository::new(db.clone()),
            replies: SurrealReplyRepository::new(db.clone()),
            comments: SurrealCommentRepository::new(db.clone()),
            assignment_rules: SurrealAssignmentRuleRepository::new(db),
        }
    }
}

impl<C: Connection> Repositories for SurrealRepositories<C> {
    type Sessions = SurrealSessionRepository<C>;
    type Teams = SurrealTeamRepository<C>;
    type Sites = SurrealSiteRepository<C>;
    type Tickets = SurrealTicketRepository<C>;
    type Replies = SurrealReplyRepository<C>;
    type Comments = SurrealCommentRepository<C>;
    type AssignmentRules = SurrealAssignmentRuleRepository<C>;

    fn sessions(&self) -> &Self::Sessions {
        &self.sessions
    }

    fn teams(&self) -> &Self::Teams {
        &self.teams
    }

    fn sites(&self) -> &Self::Sites {
        &self.sites
    }

    fn tickets(&self) -> &Self::Tickets {
        &self.tickets
    }

    fn replies(&self) -> &Self::Replies {
        &self.replies
    }

    fn comments(&self) -> &Self::Comments {
        &self.comments
    }

    fn assignment_rules(&self) -> &Self::AssignmentRules {
        &self.assignment_rules
    }
}
