//! Integration tests for the agent portal.

mod common;

use common::{
    AGENT, CUSTOMER, FailingMailer, PROVIDER, RIVAL_AGENT, RIVAL_PROVIDER, RIVAL_SITE,
    RecordingMailer, Repos, SITE, TEAMMATE,
};
use support_core::actor::Actor;
use support_core::models::comment::CommentTarget;
use support_core::models::reply::Direction;
use support_core::models::ticket::{CreateTicket, StatusFilter, TicketStatus};
use support_core::repository::{
    AssignmentRuleRepository, CommentRepository, Repositories, SiteRepository, TicketRepository,
};
use support_core::models::assignment_rule::AssignmentRule;
use support_portal::agent::{NewAgent, SITE_RELEASED_COMMENT};
use support_portal::{AgentPortal, PortalConfig};
use uuid::Uuid;

fn portal(repos: &Repos, mailer: &RecordingMailer) -> AgentPortal<Repos, RecordingMailer> {
    AgentPortal::new(repos.clone(), mailer.clone(), PortalConfig::default())
}

async fn seed_ticket(repos: &Repos, subject: &str, site: &str, provider: &str) -> Uuid {
    repos
        .tickets()
        .create(
            CreateTicket {
                subject: subject.into(),
                raised_by: Some(CUSTOMER.into()),
                site_name: Some(site.into()),
                support_provider: Some(provider.into()),
                source: "Customer Portal".into(),
                reference_document: None,
                reference_module: None,
                reference_name: None,
            },
            &Actor::Customer(CUSTOMER.into()),
        )
        .await
        .unwrap()
        .id
}

fn new_agent(email: &str) -> NewAgent {
    NewAgent {
        email: email.into(),
        first_name: "New".into(),
        last_name: "Agent".into(),
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_link_requires_team_membership() {
    let fx = common::setup().await;
    let mailer = RecordingMailer::default();
    let portal = portal(&fx.repos, &mailer);

    let err = portal.send_login_link(CUSTOMER).await.unwrap_err();
    assert_eq!(err.title(), "Not Registered");
    assert!(mailer.sent().is_empty());

    portal.send_login_link(AGENT).await.unwrap();
    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains("/support/portal/agent?key="));
}

#[tokio::test]
async fn disabled_agent_loses_access() {
    let fx = common::setup().await;
    let mailer = RecordingMailer::default();
    let portal = portal(&fx.repos, &mailer);
    let key = common::key_for(&fx.repos, AGENT).await;
    let mate_key = common::key_for(&fx.repos, TEAMMATE).await;

    assert_eq!(
        portal.validate_session_key(&mate_key).await.unwrap().as_deref(),
        Some(TEAMMATE)
    );
    portal.disable_agent(&key, TEAMMATE).await.unwrap();

    assert!(portal.validate_session_key(&mate_key).await.unwrap().is_none());
    let err = portal.get_agents(&mate_key).await.unwrap_err();
    assert_eq!(err.title(), "Not Registered");
}

#[tokio::test]
async fn cleared_key_is_session_expired() {
    let fx = common::setup().await;
    let mailer = RecordingMailer::default();
    let portal = portal(&fx.repos, &mailer);
    let key = common::key_for(&fx.repos, AGENT).await;

    portal.clear_session_key(&key).await.unwrap();
    let err = portal.get_sites(&key).await.unwrap_err();
    assert_eq!(err.title(), "Session Expired");
}

// ---------------------------------------------------------------------------
// Provider scope
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ticket_queries_stay_within_provider() {
    let fx = common::setup().await;
    let mailer = RecordingMailer::default();
    let portal = portal(&fx.repos, &mailer);
    seed_ticket(&fx.repos, "Ours", SITE, PROVIDER).await;
    let theirs = seed_ticket(&fx.repos, "Theirs", RIVAL_SITE, RIVAL_PROVIDER).await;
    let key = common::key_for(&fx.repos, AGENT).await;

    let tickets = portal
        .list_tickets(&key, StatusFilter::Any, None)
        .await
        .unwrap();
    assert_eq!(tickets.len(), 1);
    assert!(
        tickets
            .iter()
            .all(|t| t.support_provider.as_deref() == Some(PROVIDER))
    );

    let detail = portal.get_agent(&key, None, true).await.unwrap();
    assert_eq!(detail.profile.email, AGENT);
    assert_eq!(detail.tickets.map(|t| t.len()), Some(1));

    let err = portal.get_ticket(&key, theirs).await.unwrap_err();
    assert_eq!(err.title(), "No Access");
    let err = portal
        .set_status(&key, theirs, TicketStatus::Closed)
        .await
        .unwrap_err();
    assert_eq!(err.title(), "No Access");
}

// ---------------------------------------------------------------------------
// Team management
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_agents_lists_own_team_only() {
    let fx = common::setup().await;
    let mailer = RecordingMailer::default();
    let portal = portal(&fx.repos, &mailer);
    let key = common::key_for(&fx.repos, AGENT).await;

    let mut emails: Vec<String> = portal
        .get_agents(&key)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.email)
        .collect();
    emails.sort();
    assert_eq!(emails, vec![AGENT.to_string(), TEAMMATE.to_string()]);

    let err = portal
        .get_agent(&key, Some(RIVAL_AGENT), false)
        .await
        .unwrap_err();
    assert_eq!(err.title(), "Not Registered");
}

#[tokio::test]
async fn add_agent_joins_team_and_syncs_rule() {
    let fx = common::setup().await;
    let mailer = RecordingMailer::default();
    let portal = portal(&fx.repos, &mailer);
    let key = common::key_for(&fx.repos, AGENT).await;

    let added = portal
        .add_agent(&key, new_agent("rookie@helpers.io"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(added.full_name, "New Agent");
    assert_eq!(added.support_provider, PROVIDER);

    assert!(
        portal
            .add_agent(&key, new_agent("rookie@helpers.io"))
            .await
            .unwrap()
            .is_none()
    );

    let rule = fx
        .repos
        .assignment_rules()
        .get(&AssignmentRule::rule_name(PROVIDER, fx.team_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rule.users.len(), 3);
    assert!(rule.users.contains(&"rookie@helpers.io".to_string()));
    assert_eq!(rule.updated_by, "system");
}

#[tokio::test]
async fn cannot_remove_or_disable_self() {
    let fx = common::setup().await;
    let mailer = RecordingMailer::default();
    let portal = portal(&fx.repos, &mailer);
    let key = common::key_for(&fx.repos, AGENT).await;

    let err = portal.remove_agent(&key, AGENT).await.unwrap_err();
    assert_eq!(err.message(), "You cannot remove yourself.");
    let err = portal.disable_agent(&key, AGENT).await.unwrap_err();
    assert_eq!(err.message(), "You cannot disable yourself.");
}

#[tokio::test]
async fn remove_agent_requires_teammate() {
    let fx = common::setup().await;
    let mailer = RecordingMailer::default();
    let portal = portal(&fx.repos, &mailer);
    let key = common::key_for(&fx.repos, AGENT).await;

    let err = portal.remove_agent(&key, RIVAL_AGENT).await.unwrap_err();
    assert_eq!(err.message(), "Agent does not exist.");

    portal.remove_agent(&key, TEAMMATE).await.unwrap();
    let rule = fx
        .repos
        .assignment_rules()
        .get(&AssignmentRule::rule_name(PROVIDER, fx.team_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rule.users, vec![AGENT.to_string()]);
}

#[tokio::test]
async fn disabled_agents_leave_the_rule() {
    let fx = common::setup().await;
    let mailer = RecordingMailer::default();
    let portal = portal(&fx.repos, &mailer);
    let key = common::key_for(&fx.repos, AGENT).await;

    let profile = portal.disable_agent(&key, TEAMMATE).await.unwrap();
    assert!(profile.disabled);

    let rule = fx
        .repos
        .assignment_rules()
        .find_for_provider(PROVIDER)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rule.users, vec![AGENT.to_string()]);
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reply_marks_ticket_replied_and_mails_raiser() {
    let fx = common::setup().await;
    let mailer = RecordingMailer::default();
    let portal = portal(&fx.repos, &mailer);
    let id = seed_ticket(&fx.repos, "Printer on fire", SITE, PROVIDER).await;
    let key = common::key_for(&fx.repos, AGENT).await;

    let reply = portal
        .reply_to_ticket(&key, id, "Extinguisher is on its way.")
        .await
        .unwrap();
    assert_eq!(reply.direction, Direction::Sent);
    assert_eq!(reply.subject, "Re: Printer on fire");
    assert_eq!(reply.recipients.as_deref(), Some(CUSTOMER));

    let ticket = fx.repos.tickets().get_by_id(id).await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Replied);
    assert_eq!(ticket.updated_by, format!("agent:{AGENT}"));
    let first = ticket.first_responded_on.unwrap();

    portal.reply_to_ticket(&key, id, "Any luck?").await.unwrap();
    let ticket = fx.repos.tickets().get_by_id(id).await.unwrap();
    assert_eq!(ticket.first_responded_on, Some(first));

    let sent = mailer.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].recipients, vec![CUSTOMER.to_string()]);
    assert_eq!(sent[0].subject, "Re: Printer on fire");

    let view = portal.get_ticket(&key, id).await.unwrap();
    assert_eq!(view.replies.len(), 2);
}

#[tokio::test]
async fn reply_survives_mail_outage() {
    let fx = common::setup().await;
    let portal = AgentPortal::new(fx.repos.clone(), FailingMailer, PortalConfig::default());
    let id = seed_ticket(&fx.repos, "Printer on fire", SITE, PROVIDER).await;
    let key = common::key_for(&fx.repos, AGENT).await;

    portal.send_login_link(AGENT).await.unwrap();
    let reply = portal
        .reply_to_ticket(&key, id, "Extinguisher is on its way.")
        .await
        .unwrap();
    assert_eq!(reply.direction, Direction::Sent);

    let ticket = fx.repos.tickets().get_by_id(id).await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Replied);
}

#[tokio::test]
async fn reply_on_closed_ticket_keeps_it_closed() {
    let fx = common::setup().await;
    let mailer = RecordingMailer::default();
    let portal = portal(&fx.repos, &mailer);
    let id = seed_ticket(&fx.repos, "Done", SITE, PROVIDER).await;
    let key = common::key_for(&fx.repos, AGENT).await;

    portal
        .set_status(&key, id, TicketStatus::Closed)
        .await
        .unwrap();
    portal.reply_to_ticket(&key, id, "For the record.").await.unwrap();

    let ticket = fx.repos.tickets().get_by_id(id).await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Closed);
}

#[tokio::test]
async fn toggle_assignee_adds_then_removes() {
    let fx = common::setup().await;
    let mailer = RecordingMailer::default();
    let portal = portal(&fx.repos, &mailer);
    let id = seed_ticket(&fx.repos, "Assign me", SITE, PROVIDER).await;
    let key = common::key_for(&fx.repos, AGENT).await;

    let assignees = portal.toggle_assignee(&key, id, TEAMMATE).await.unwrap();
    assert_eq!(assignees, vec![TEAMMATE.to_string()]);
    let assignees = portal.toggle_assignee(&key, id, TEAMMATE).await.unwrap();
    assert!(assignees.is_empty());

    let err = portal
        .toggle_assignee(&key, id, RIVAL_AGENT)
        .await
        .unwrap_err();
    assert!(err.is_denied());
}

#[tokio::test]
async fn terminal_status_stamps_resolution_date() {
    let fx = common::setup().await;
    let mailer = RecordingMailer::default();
    let portal = portal(&fx.repos, &mailer);
    let id = seed_ticket(&fx.repos, "Fixable", SITE, PROVIDER).await;
    let key = common::key_for(&fx.repos, AGENT).await;

    let status = portal
        .set_status(&key, id, TicketStatus::OnHold)
        .await
        .unwrap();
    assert_eq!(status, TicketStatus::OnHold);
    let ticket = fx.repos.tickets().get_by_id(id).await.unwrap();
    assert!(ticket.resolution_date.is_none());

    portal
        .set_status(&key, id, TicketStatus::Resolved)
        .await
        .unwrap();
    let ticket = fx.repos.tickets().get_by_id(id).await.unwrap();
    assert!(ticket.resolution_date.is_some());
}

#[tokio::test]
async fn reopening_clears_resolution_date() {
    let fx = common::setup().await;
    let mailer = RecordingMailer::default();
    let portal = portal(&fx.repos, &mailer);
    let id = seed_ticket(&fx.repos, "Came back", SITE, PROVIDER).await;
    let key = common::key_for(&fx.repos, AGENT).await;

    portal
        .set_status(&key, id, TicketStatus::Resolved)
        .await
        .unwrap();
    portal
        .set_status(&key, id, TicketStatus::Open)
        .await
        .unwrap();

    let ticket = fx.repos.tickets().get_by_id(id).await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Open);
    assert!(ticket.resolution_date.is_none());
}

// ---------------------------------------------------------------------------
// Sites
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_site_refuses_existing_sites() {
    let fx = common::setup().await;
    let mailer = RecordingMailer::default();
    let portal = portal(&fx.repos, &mailer);
    let key = common::key_for(&fx.repos, AGENT).await;

    let err = portal.add_site(&key, SITE).await.unwrap_err();
    assert_eq!(err.message(), "Site already exists.");

    let err = portal.add_site(&key, RIVAL_SITE).await.unwrap_err();
    assert_eq!(
        err.message(),
        "Site already exists and is supported by another provider."
    );

    let summary = portal
        .add_site(&key, "https://initech.example.com/desk")
        .await
        .unwrap();
    assert_eq!(summary.site_name, "initech.example.com");
    assert_eq!(summary.support_provider.as_deref(), Some(PROVIDER));
    assert_eq!(summary.user_count, 0);
}

#[tokio::test]
async fn removed_site_is_released_and_reclaimable() {
    let fx = common::setup().await;
    let mailer = RecordingMailer::default();
    let portal = portal(&fx.repos, &mailer);
    let key = common::key_for(&fx.repos, AGENT).await;
    let rival_key = common::key_for(&fx.repos, RIVAL_AGENT).await;

    let err = portal.remove_site(&rival_key, SITE).await.unwrap_err();
    assert!(err.is_denied());

    portal.remove_site(&key, SITE).await.unwrap();
    let site = fx.repos.sites().get(SITE).await.unwrap().unwrap();
    assert!(site.support_provider.is_none());

    let comments = fx
        .repos
        .comments()
        .list_for(CommentTarget::Site, SITE)
        .await
        .unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].content, SITE_RELEASED_COMMENT);

    assert!(portal.get_site(&key, SITE).await.unwrap_err().is_denied());

    let summary = portal.add_site(&rival_key, SITE).await.unwrap();
    assert_eq!(summary.support_provider.as_deref(), Some(RIVAL_PROVIDER));
    assert_eq!(summary.user_count, 1);
}

#[tokio::test]
async fn get_sites_is_provider_scoped() {
    let fx = common::setup().await;
    let mailer = RecordingMailer::default();
    let portal = portal(&fx.repos, &mailer);
    let key = common::key_for(&fx.repos, AGENT).await;

    let sites = portal.get_sites(&key).await.unwrap();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].site_name, SITE);
    assert_eq!(sites[0].user_count, 1);

    let err = portal.get_site(&key, RIVAL_SITE).await.unwrap_err();
    assert_eq!(err.title(), "No Access");
}
