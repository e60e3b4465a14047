//! Customer portal: session keys, registration and site-scoped tickets.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use support_core::actor::Actor;
use support_core::error::SupportResult;
use support_core::models::comment::{CommentTarget, CreateComment};
use support_core::models::reply::{CreateReply, Direction, Reply};
use support_core::models::site::CreateSiteUser;
use support_core::models::ticket::{CreateTicket, StatusFilter, Ticket, TicketStatus, UpdateTicket};
use support_core::repository::{
    CommentRepository, ReplyRepository, Repositories, SiteRepository, TicketRepository,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::assignment;
use crate::config::PortalConfig;
use crate::error::PortalError;
use crate::mailer::{self, Audience, Mailer};
use crate::scope::{CustomerScope, Scope, ScopeResolver};
use crate::session::SessionRegistry;

/// Source recorded on tickets opened by the registration flow.
pub const REGISTRATION_SOURCE: &str = "Partner Support Portal";
/// Source recorded on tickets raised through the portal.
pub const PORTAL_SOURCE: &str = "Customer Portal";
/// Sender name customers see on agent replies.
pub const MASKED_AGENT_NAME: &str = "Support Agent";

/// Input for the self-registration flow.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUser {
    pub email: String,
    pub name: String,
    pub company: String,
    pub site: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Registration {
    /// The site is known; the email is now linked to it.
    Registered { verification_sent: bool },
    /// The site is unknown; a ticket was opened for manual review.
    PendingReview { ticket_id: Uuid },
}

/// Listing parameters as the portal sends them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketQuery {
    /// `"Open"` (or empty) for open tickets, `"Close"` for closed ones,
    /// anything else for all.
    #[serde(default)]
    pub open_or_close: String,
    pub search_text: Option<String>,
}

impl TicketQuery {
    pub fn status_filter(&self) -> StatusFilter {
        match self.open_or_close.as_str() {
            "" | "Open" => StatusFilter::Open,
            "Close" => StatusFilter::Closed,
            _ => StatusFilter::Any,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketList {
    pub email: String,
    pub tickets: Vec<Ticket>,
}

/// Status as shown to customers. Internal states collapse into three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CustomerStatus {
    Open,
    AwaitingReply,
    Closed,
}

impl CustomerStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CustomerStatus::Open => "Open",
            CustomerStatus::AwaitingReply => "Awaiting Reply",
            CustomerStatus::Closed => "Closed",
        }
    }

    pub fn indicator(&self) -> &'static str {
        match self {
            CustomerStatus::Open => "orange",
            CustomerStatus::AwaitingReply => "yellow",
            CustomerStatus::Closed => "green",
        }
    }
}

impl From<TicketStatus> for CustomerStatus {
    fn from(status: TicketStatus) -> Self {
        match status {
            TicketStatus::Replied => CustomerStatus::AwaitingReply,
            TicketStatus::Closed => CustomerStatus::Closed,
            _ => CustomerStatus::Open,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerTicketView {
    pub ticket: Ticket,
    pub status: CustomerStatus,
    pub status_label: &'static str,
    pub indicator: &'static str,
    /// Newest first.
    pub replies: Vec<Reply>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTicket {
    pub subject: String,
    pub description: String,
    /// Site URL or bare host name.
    pub site_url: String,
    pub reference_document: Option<String>,
    pub reference_module: Option<String>,
    pub reference_name: Option<String>,
}

/// Reduce a site URL to its host: the scheme is stripped and anything from
/// the first `/` on is dropped.
pub fn normalize_site_name(site_url: &str) -> String {
    let trimmed = site_url.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Customer-facing portal service.
///
/// Generic over the storage backend and mail transport; holds no state
/// between calls.
pub struct CustomerPortal<R: Repositories, M: Mailer> {
    repos: R,
    mailer: M,
    config: PortalConfig,
}

impl<R: Repositories, M: Mailer> CustomerPortal<R, M> {
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

    async fn customer_scope(&self, key: &str) -> SupportResult<CustomerScope> {
        let email = self.sessions().require(key).await?;
        self.resolver().resolve_customer_scope(&email).await
    }

    async fn authorize(&self, key: &str) -> SupportResult<Scope> {
        Ok(Scope::Customer(self.customer_scope(key).await?))
    }

    // -----------------------------------------------------------------------
    // Session keys
    // -----------------------------------------------------------------------

    /// Mail a session link to `email`. Returns `false` without issuing a key
    /// when the email is not linked to any site.
    pub async fn send_session_key(&self, email: &str) -> SupportResult<bool> {
        let sites = self.repos.sites().site_names_for_email(email).await?;
        if sites.is_empty() {
            debug!(email, "Session key requested for unlinked email");
            return Ok(false);
        }
        self.sessions()
            .issue_and_send(email, Audience::Customer)
            .await?;
        Ok(true)
    }

    /// The email behind `key`, provided it still has site access.
    pub async fn validate_session_key(&self, key: &str) -> SupportResult<Option<String>> {
        let Some(email) = self.sessions().validate(key).await? else {
            return Ok(None);
        };
        let sites = self.repos.sites().site_names_for_email(&email).await?;
        Ok((!sites.is_empty()).then_some(email))
    }

    pub async fn clear_session_key(&self, key: &str) -> SupportResult<()> {
        self.sessions().revoke(key).await
    }

    /// Whether `email` is linked to `site_name` through an enabled link.
    pub async fn validate_user(&self, email: &str, site_name: &str) -> SupportResult<bool> {
        let user = self
            .repos
            .sites()
            .find_user(&normalize_site_name(site_name), email)
            .await?;
        Ok(user.is_some_and(|u| !u.disabled))
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    pub async fn register(&self, input: RegisterUser) -> SupportResult<Registration> {
        let email = input.email.trim().to_string();
        if email.is_empty() {
            return Err(PortalError::InvalidInput("Email is required.".into()).into());
        }
        let site_name = normalize_site_name(&input.site);

        if self.repos.sites().get(&site_name).await?.is_some() {
            if self.repos.sites().find_user(&site_name, &email).await?.is_none() {
                self.repos
                    .sites()
                    .add_user(CreateSiteUser {
                        site_name: site_name.clone(),
                        email: email.clone(),
                    })
                    .await?;
                info!(email = %email, site = %site_name, "Linked customer to site");
            }
            // No key for a customer whose links are all disabled.
            let sent = self.send_session_key(&email).await?;
            return Ok(Registration::Registered {
                verification_sent: sent && !self.config.developer_mode,
            });
        }

        // Unknown site: hand the request to the helpdesk.
        let ticket = self
            .repos
            .tickets()
            .create(
                CreateTicket {
                    subject: format!("New Support Portal User Registration - {email}"),
                    raised_by: Some(email.clone()),
                    site_name: None,
                    support_provider: None,
                    source: REGISTRATION_SOURCE.into(),
                    reference_document: None,
                    reference_module: None,
                    reference_name: None,
                },
                &Actor::System,
            )
            .await?;
        self.repos
            .replies()
            .create(CreateReply {
                ticket_id: ticket.id,
                sender: email.clone(),
                sender_full_name: Some(input.name.clone()),
                recipients: None,
                subject: ticket.subject.clone(),
                content: format!(
                    "Name: {}\nEmail: {email}\nCompany: {}\nSite: {}",
                    input.name, input.company, input.site
                ),
                direction: Direction::Received,
            })
            .await?;

        info!(email = %email, ticket_id = %ticket.id, "Registration queued for review");
        Ok(Registration::PendingReview {
            ticket_id: ticket.id,
        })
    }

    // -----------------------------------------------------------------------
    // Tickets
    // -----------------------------------------------------------------------

    /// Sites the caller may raise tickets for.
    pub async fn site_options(&self, key: &str) -> SupportResult<Vec<String>> {
        let scope = self.customer_scope(key).await?;
        Ok(scope.sites().map(str::to_string).collect())
    }

    pub async fn list_tickets(&self, key: &str, query: TicketQuery) -> SupportResult<TicketList> {
        let scope = self.authorize(key).await?;
        let tickets = self
            .resolver()
            .tickets(&scope, query.status_filter(), query.search_text)
            .await?;
        Ok(TicketList {
            email: scope.email().to_string(),
            tickets,
        })
    }

    pub async fn get_ticket(&self, key: &str, id: Uuid) -> SupportResult<CustomerTicketView> {
        let scope = self.authorize(key).await?;
        let ticket = self.resolver().ticket(&scope, id).await?;

        let mut replies = self.repos.replies().list_for_ticket(id).await?;
        for reply in replies.iter_mut() {
            if reply.direction == Direction::Sent {
                reply.sender_full_name = Some(MASKED_AGENT_NAME.into());
            }
        }

        let status = CustomerStatus::from(ticket.status);
        Ok(CustomerTicketView {
            ticket,
            status,
            status_label: status.label(),
            indicator: status.indicator(),
            replies,
        })
    }

    /// Raise a ticket for one of the caller's sites. Returns the ticket id.
    pub async fn create_ticket(&self, key: &str, input: NewTicket) -> SupportResult<Uuid> {
        let customer = self.customer_scope(key).await?;
        if input.subject.trim().is_empty() {
            return Err(PortalError::InvalidInput("Subject is required.".into()).into());
        }

        // 1. The site must be one of the caller's.
        let site_name = normalize_site_name(&input.site_url);
        customer.ensure_site(&site_name)?;
        let support_provider = self
            .repos
            .sites()
            .get(&site_name)
            .await?
            .and_then(|s| s.support_provider);

        // 2. Ticket plus the description as its first message.
        let actor = Actor::Customer(customer.email().to_string());
        let ticket = self
            .repos
            .tickets()
            .create(
                CreateTicket {
                    subject: input.subject.trim().to_string(),
                    raised_by: Some(customer.email().to_string()),
                    site_name: Some(site_name),
                    support_provider,
                    source: PORTAL_SOURCE.into(),
                    reference_document: input.reference_document,
                    reference_module: input.reference_module,
                    reference_name: input.reference_name,
                },
                &actor,
            )
            .await?;
        self.repos
            .replies()
            .create(CreateReply {
                ticket_id: ticket.id,
                sender: customer.email().to_string(),
                sender_full_name: None,
                recipients: None,
                subject: ticket.subject.clone(),
                content: input.description,
                direction: Direction::Received,
            })
            .await?;

        // 3. Assignment and acknowledgement.
        let ticket = assignment::auto_assign(&self.repos, ticket).await?;
        if let Some(ack) = mailer::ticket_acknowledgement(&self.config, &ticket) {
            mailer::dispatch(&self.mailer, &self.config, ack).await;
        }

        info!(ticket_id = %ticket.id, email = customer.email(), "Ticket created");
        Ok(ticket.id)
    }

    /// Add a customer message to a ticket. Returns the ticket's replies,
    /// newest first.
    pub async fn reply(
        &self,
        key: &str,
        id: Uuid,
        content: &str,
        subject: &str,
    ) -> SupportResult<Vec<Reply>> {
        let scope = self.authorize(key).await?;
        let ticket = self.resolver().ticket(&scope, id).await?;

        self.repos
            .replies()
            .create(CreateReply {
                ticket_id: ticket.id,
                sender: scope.email().to_string(),
                sender_full_name: None,
                recipients: None,
                subject: subject.to_string(),
                content: content.to_string(),
                direction: Direction::Received,
            })
            .await?;

        if ticket.status == TicketStatus::Replied {
            self.repos
                .tickets()
                .update(
                    ticket.id,
                    UpdateTicket {
                        status: Some(TicketStatus::Open),
                        ..Default::default()
                    },
                    &scope.actor(),
                )
                .await?;
        }

        self.repos.replies().list_for_ticket(ticket.id).await
    }

    /// Close a ticket with an optional 1-5 rating and closing comment.
    pub async fn close_ticket(
        &self,
        key: &str,
        id: Uuid,
        rating: Option<u8>,
        comment: Option<String>,
    ) -> SupportResult<Ticket> {
        let scope = self.authorize(key).await?;
        let ticket = self.resolver().ticket(&scope, id).await?;
        if rating.is_some_and(|r| !(1..=5).contains(&r)) {
            return Err(PortalError::InvalidInput("Rating must be between 1 and 5.".into()).into());
        }
        let email = scope.email().to_string();

        let closed_by = (ticket.raised_by.as_deref() != Some(email.as_str())).then(|| email.clone());
        let ticket = self
            .repos
            .tickets()
            .update(
                ticket.id,
                UpdateTicket {
                    status: Some(TicketStatus::Closed),
                    closed_by: Some(closed_by),
                    support_rating: Some(rating),
                    resolution_date: Some(Some(Utc::now())),
                    ..Default::default()
                },
                &scope.actor(),
            )
            .await?;

        if let Some(content) = comment.filter(|c| !c.trim().is_empty()) {
            self.repos
                .comments()
                .create(CreateComment {
                    target: CommentTarget::Ticket,
                    reference_name: ticket.id.to_string(),
                    content,
                    comment_email: Some(email.clone()),
                })
                .await?;
        }

        info!(ticket_id = %ticket.id, email = %email, "Ticket closed by customer");
        Ok(ticket)
    }
}
