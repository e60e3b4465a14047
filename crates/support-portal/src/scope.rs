//! Scope resolution.
//!
//! An email validated by the session registry becomes a [`Scope`]: the boundary every ticket, site
//! and agent query is filtered by. Customers are scoped to the sites they
//! are linked to; agents are scoped to their support provider and team.
//! Scopes are never empty: an identity without sites or without a team
//! membership is denied before any query runs.

use std::collections::BTreeSet;

use support_core::actor::Actor;
use support_core::error::SupportResult;
use support_core::models::provider::AgentProfile;
use support_core::models::site::SiteSummary;
use support_core::models::ticket::{StatusFilter, Ticket, TicketFilter};
use support_core::repository::{Repositories, SiteRepository, TeamRepository, TicketRepository};
use tracing::debug;
use uuid::Uuid;

use crate::error::PortalError;

/// A customer and the sites they may act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerScope {
    email: String,
    sites: BTreeSet<String>,
}

impl CustomerScope {
    pub fn new(
        email: impl Into<String>,
        sites: impl IntoIterator<Item = String>,
    ) -> Result<Self, PortalError> {
        let sites: BTreeSet<String> = sites.into_iter().collect();
        if sites.is_empty() {
            return Err(PortalError::NoSiteAccess);
        }
        Ok(Self {
            email: email.into(),
            sites,
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn sites(&self) -> impl Iterator<Item = &str> {
        self.sites.iter().map(String::as_str)
    }

    pub fn contains_site(&self, site_name: &str) -> bool {
        self.sites.contains(site_name)
    }

    pub fn ensure_site(&self, site_name: &str) -> Result<(), PortalError> {
        if self.contains_site(site_name) {
            Ok(())
        } else {
            Err(PortalError::SiteNotInScope)
        }
    }
}

/// An agent and the provider/team they act for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentScope {
    profile: AgentProfile,
}

impl AgentScope {
    pub fn new(profile: AgentProfile) -> Result<Self, PortalError> {
        if profile.disabled {
            return Err(PortalError::NotRegistered);
        }
        Ok(Self { profile })
    }

    pub fn email(&self) -> &str {
        &self.profile.email
    }

    pub fn support_provider(&self) -> &str {
        &self.profile.support_provider
    }

    pub fn team_id(&self) -> Uuid {
        self.profile.team_id
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn ensure_site(&self, site: &SiteSummary) -> Result<(), PortalError> {
        if site.support_provider.as_deref() == Some(self.support_provider()) {
            Ok(())
        } else {
            Err(PortalError::SiteNotInScope)
        }
    }

    pub fn ensure_ticket(&self, ticket: &Ticket) -> Result<(), PortalError> {
        if ticket.support_provider.as_deref() == Some(self.support_provider()) {
            Ok(())
        } else {
            Err(PortalError::NoTicketAccess)
        }
    }
}

/// Authorization boundary of a validated identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Customer(CustomerScope),
    Agent(AgentScope),
}

impl Scope {
    pub fn email(&self) -> &str {
        match self {
            Scope::Customer(c) => c.email(),
            Scope::Agent(a) => a.email(),
        }
    }

    /// The identity writes are performed as.
    pub fn actor(&self) -> Actor {
        match self {
            Scope::Customer(c) => Actor::Customer(c.email.clone()),
            Scope::Agent(a) => Actor::Agent(a.profile.email.clone()),
        }
    }

    pub fn permits_ticket(&self, ticket: &Ticket) -> bool {
        match self {
            Scope::Customer(c) => ticket
                .site_name
                .as_deref()
                .is_some_and(|site| c.contains_site(site)),
            Scope::Agent(a) => a.ensure_ticket(ticket).is_ok(),
        }
    }

    pub fn ensure_ticket(&self, ticket: &Ticket) -> Result<(), PortalError> {
        if self.permits_ticket(ticket) {
            Ok(())
        } else {
            Err(PortalError::NoTicketAccess)
        }
    }

    /// Storage filter restricted to this scope.
    pub fn ticket_filter(&self, status: StatusFilter, search_text: Option<String>) -> TicketFilter {
        match self {
            Scope::Customer(c) => TicketFilter {
                site_names: Some(c.sites.iter().cloned().collect()),
                support_provider: None,
                status,
                search_text,
            },
            Scope::Agent(a) => TicketFilter {
                site_names: None,
                support_provider: Some(a.support_provider().to_string()),
                status,
                search_text,
            },
        }
    }
}

pub struct ScopeResolver<'a, R> {
    repos: &'a R,
}

impl<'a, R: Repositories> ScopeResolver<'a, R> {
    pub fn new(repos: &'a R) -> Self {
        Self { repos }
    }

    /// Sites linked to `email`; denied when there are none.
    pub async fn resolve_customer_scope(&self, email: &str) -> SupportResult<CustomerScope> {
        let sites = self.repos.sites().site_names_for_email(email).await?;
        CustomerScope::new(email, sites).map_err(|e| {
            debug!(email, "Customer has no linked sites");
            e.into()
        })
    }

    /// Provider and team of `email`; denied without an enabled membership.
    pub async fn resolve_agent_scope(&self, email: &str) -> SupportResult<AgentScope> {
        let profile = self
            .repos
            .teams()
            .agent_profiles(email)
            .await?
            .into_iter()
            .find(|p| !p.disabled)
            .ok_or_else(|| {
                debug!(email, "No enabled team membership");
                PortalError::NotRegistered
            })?;
        Ok(AgentScope::new(profile)?)
    }

    /// Fetch a ticket through `scope`. Missing and out-of-scope tickets are
    /// the same denial.
    pub async fn ticket(&self, scope: &Scope, id: Uuid) -> SupportResult<Ticket> {
        let ticket = self.repos.tickets().get_by_id(id).await.map_err(|e| {
            if e.is_not_found() {
                PortalError::NoTicketAccess.into()
            } else {
                e
            }
        })?;
        scope.ensure_ticket(&ticket)?;
        Ok(ticket)
    }

    /// Tickets visible through `scope`, newest first.
    pub async fn tickets(
        &self,
        scope: &Scope,
        status: StatusFilter,
        search_text: Option<String>,
    ) -> SupportResult<Vec<Ticket>> {
        let tickets = self
            .repos
            .tickets()
            .list(scope.ticket_filter(status, search_text))
            .await?;
        // The store applies the same filter; this keeps the boundary honest
        // regardless of backend.
        Ok(tickets
            .into_iter()
            .filter(|t| scope.permits_ticket(t))
            .collect())
    }
}
