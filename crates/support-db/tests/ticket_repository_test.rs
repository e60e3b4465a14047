//! Integration tests for the Ticket, Reply, Comment and AssignmentRule
//! repositories.

use support_core::actor::Actor;
use support_core::models::comment::{CommentTarget, CreateComment};
use support_core::models::reply::{CreateReply, Direction};
use support_core::models::ticket::{
    CreateTicket, StatusFilter, TicketFilter, TicketStatus, UpdateTicket,
};
use support_core::repository::{
    AssignmentRuleRepository, CommentRepository, ReplyRepository, TicketRepository,
};
use support_db::repository::{
    SurrealAssignmentRuleRepository, SurrealCommentRepository, SurrealReplyRepository,
    SurrealTicketRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    support_db::run_migrations(&db).await.unwrap();
    db
}

fn new_ticket(subject: &str, site: &str, provider: &str) -> CreateTicket {
    CreateTicket {
        subject: subject.into(),
        raised_by: Some("alice@example.com".into()),
        site_name: Some(site.into()),
        support_provider: Some(provider.into()),
        source: "Partner Support Portal".into(),
        reference_document: None,
        reference_module: None,
        reference_name: None,
    }
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_and_get_ticket() {
    let repo = SurrealTicketRepository::new(setup().await);
    let actor = Actor::Customer("alice@example.com".into());

    let ticket = repo
        .create(new_ticket("Printer on fire", "acme.example.com", "Helpers"), &actor)
        .await
        .unwrap();
    assert_eq!(ticket.status, TicketStatus::Open);
    assert!(ticket.assignees.is_empty());
    assert_eq!(ticket.updated_by, "customer:alice@example.com");

    let fetched = repo.get_by_id(ticket.id).await.unwrap();
    assert_eq!(fetched.subject, "Printer on fire");
}

#[tokio::test]
async fn get_missing_ticket_is_not_found() {
    let repo = SurrealTicketRepository::new(setup().await);
    let err = repo.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn update_records_actor_and_fields() {
    let repo = SurrealTicketRepository::new(setup().await);
    let ticket = repo
        .create(
            new_ticket("Slow reports", "acme.example.com", "Helpers"),
            &Actor::System,
        )
        .await
        .unwrap();

    let updated = repo
        .update(
            ticket.id,
            UpdateTicket {
                status: Some(TicketStatus::Closed),
                assignees: Some(vec!["agent@helpers.io".into()]),
                support_rating: Some(Some(4)),
                ..Default::default()
            },
            &Actor::Agent("agent@helpers.io".into()),
        )
        .await
        .unwrap();

    assert_eq!(updated.status, TicketStatus::Closed);
    assert_eq!(updated.assignees, vec!["agent@helpers.io".to_string()]);
    assert_eq!(updated.support_rating, Some(4));
    assert_eq!(updated.updated_by, "agent:agent@helpers.io");
}

#[tokio::test]
async fn update_missing_ticket_is_not_found() {
    let repo = SurrealTicketRepository::new(setup().await);
    let err = repo
        .update(Uuid::new_v4(), UpdateTicket::default(), &Actor::System)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn list_applies_scope_status_and_search() {
    let repo = SurrealTicketRepository::new(setup().await);
    let actor = Actor::System;
    let a = repo
        .create(new_ticket("Login broken", "a.example.com", "Helpers"), &actor)
        .await
        .unwrap();
    let b = repo
        .create(new_ticket("Invoice totals", "b.example.com", "Helpers"), &actor)
        .await
        .unwrap();
    repo.create(new_ticket("Other provider", "c.example.com", "Rivals"), &actor)
        .await
        .unwrap();
    repo.update(
        b.id,
        UpdateTicket {
            status: Some(TicketStatus::Closed),
            ..Default::default()
        },
        &actor,
    )
    .await
    .unwrap();

    let by_site = repo
        .list(TicketFilter {
            site_names: Some(vec!["a.example.com".into(), "b.example.com".into()]),
            status: StatusFilter::Any,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_site.len(), 2);

    let open = repo
        .list(TicketFilter {
            site_names: Some(vec!["a.example.com".into(), "b.example.com".into()]),
            status: StatusFilter::Open,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, a.id);

    let by_provider = repo
        .list(TicketFilter {
            support_provider: Some("Helpers".into()),
            status: StatusFilter::Any,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_provider.len(), 2);
    assert!(
        by_provider
            .iter()
            .all(|t| t.support_provider.as_deref() == Some("Helpers"))
    );

    let searched = repo
        .list(TicketFilter {
            support_provider: Some("Helpers".into()),
            status: StatusFilter::Any,
            search_text: Some("INVOICE".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].id, b.id);
}

#[tokio::test]
async fn empty_site_scope_matches_nothing() {
    let repo = SurrealTicketRepository::new(setup().await);
    repo.create(
        new_ticket("Anything", "a.example.com", "Helpers"),
        &Actor::System,
    )
    .await
    .unwrap();

    let tickets = repo
        .list(TicketFilter {
            site_names: Some(Vec::new()),
            status: StatusFilter::Any,
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(tickets.is_empty());
}

// ---------------------------------------------------------------------------
// Replies and comments
// ---------------------------------------------------------------------------

#[tokio::test]
async fn replies_are_listed_per_ticket() {
    let db = setup().await;
    let tickets = SurrealTicketRepository::new(db.clone());
    let replies = SurrealReplyRepository::new(db);

    let ticket = tickets
        .create(new_ticket("Help", "a.example.com", "Helpers"), &Actor::System)
        .await
        .unwrap();

    for (sender, direction) in [
        ("alice@example.com", Direction::Received),
        ("agent@helpers.io", Direction::Sent),
    ] {
        replies
            .create(CreateReply {
                ticket_id: ticket.id,
                sender: sender.into(),
                sender_full_name: None,
                recipients: None,
                subject: "Help".into(),
                content: format!("from {sender}"),
                direction,
            })
            .await
            .unwrap();
    }

    let listed = replies.list_for_ticket(ticket.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|r| r.ticket_id == ticket.id));
    assert!(listed.iter().any(|r| r.direction == Direction::Sent));
    assert!(
        replies
            .list_for_ticket(Uuid::new_v4())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn comments_are_keyed_by_target() {
    let repo = SurrealCommentRepository::new(setup().await);
    repo.create(CreateComment {
        target: CommentTarget::Site,
        reference_name: "a.example.com".into(),
        content: "Site removed by support provider.".into(),
        comment_email: None,
    })
    .await
    .unwrap();

    let site_comments = repo
        .list_for(CommentTarget::Site, "a.example.com")
        .await
        .unwrap();
    assert_eq!(site_comments.len(), 1);
    assert!(
        repo.list_for(CommentTarget::Ticket, "a.example.com")
            .await
            .unwrap()
            .is_empty()
    );
}

// ---------------------------------------------------------------------------
// Assignment rules
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upsert_rule_replaces_users() {
    let repo = SurrealAssignmentRuleRepository::new(setup().await);
    let team_id = Uuid::new_v4();

    let rule = repo
        .upsert_for_team("Helpers", team_id, vec!["a@h.io".into()], &Actor::System)
        .await
        .unwrap();
    assert_eq!(rule.users, vec!["a@h.io".to_string()]);

    let rule = repo
        .upsert_for_team(
            "Helpers",
            team_id,
            vec!["a@h.io".into(), "b@h.io".into()],
            &Actor::System,
        )
        .await
        .unwrap();
    assert_eq!(rule.users.len(), 2);
    assert_eq!(rule.name, format!("Helpers - {team_id}"));

    let found = repo.find_for_provider("Helpers").await.unwrap().unwrap();
    assert_eq!(found.name, rule.name);
    assert!(repo.find_for_provider("Rivals").await.unwrap().is_none());
}

#[tokio::test]
async fn record_assignment_advances_round_robin() {
    let repo = SurrealAssignmentRuleRepository::new(setup().await);
    let rule = repo
        .upsert_for_team(
            "Helpers",
            Uuid::new_v4(),
            vec!["a@h.io".into(), "b@h.io".into()],
            &Actor::System,
        )
        .await
        .unwrap();
    assert_eq!(rule.next_user(), Some("a@h.io"));

    repo.record_assignment(&rule.name, "a@h.io", &Actor::System)
        .await
        .unwrap();

    let rule = repo.get(&rule.name).await.unwrap().unwrap();
    assert_eq!(rule.last_assigned.as_deref(), Some("a@h.io"));
    assert_eq!(rule.next_user(), Some("b@h.io"));
}
