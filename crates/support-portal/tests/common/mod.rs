//! Shared fixture for the portal integration tests: an in-memory store
//! seeded with two providers, plus a mailer that records what it sends.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use support_core::models::provider::{CreateSupportTeam, CreateTeamMember};
use support_core::models::site::{CreateSiteUser, CreateSupportedSite};
use support_core::repository::{Repositories, SiteRepository, TeamRepository};
use support_db::repository::SurrealRepositories;
use support_portal::mailer::{MailError, Mailer, OutboundEmail};
use support_portal::{LogMailer, PortalConfig, SessionRegistry};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

pub type Repos = SurrealRepositories<Db>;

pub const PROVIDER: &str = "Helpers";
pub const AGENT: &str = "agent@helpers.io";
pub const TEAMMATE: &str = "mate@helpers.io";
pub const SITE: &str = "acme.example.com";
pub const CUSTOMER: &str = "alice@acme.example.com";

pub const RIVAL_PROVIDER: &str = "Rivals";
pub const RIVAL_AGENT: &str = "agent@rivals.io";
pub const RIVAL_SITE: &str = "globex.example.com";
pub const RIVAL_CUSTOMER: &str = "bob@globex.example.com";

#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<OutboundEmail>>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

impl Mailer for RecordingMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

/// A mailer whose transport is always down.
#[derive(Clone, Default)]
pub struct FailingMailer;

impl Mailer for FailingMailer {
    async fn send(&self, _email: OutboundEmail) -> Result<(), MailError> {
        Err(MailError::Transport("connection refused".into()))
    }
}

pub struct Fixture {
    pub repos: Repos,
    pub team_id: Uuid,
    pub rival_team_id: Uuid,
}

async fn seed_provider(repos: &Repos, provider: &str, agents: &[&str], site: &str, customer: &str) -> Uuid {
    repos.teams().create_provider(provider).await.unwrap();
    let team = repos
        .teams()
        .create_team(CreateSupportTeam {
            support_provider: provider.into(),
            team_name: "Tier 1".into(),
        })
        .await
        .unwrap();
    for agent in agents {
        repos
            .teams()
            .add_member(CreateTeamMember {
                team_id: team.id,
                email: (*agent).into(),
                full_name: format!("Agent {agent}"),
            })
            .await
            .unwrap();
    }

    repos
        .sites()
        .create(CreateSupportedSite {
            site_name: site.into(),
            support_provider: Some(provider.into()),
        })
        .await
        .unwrap();
    repos
        .sites()
        .add_user(CreateSiteUser {
            site_name: site.into(),
            email: customer.into(),
        })
        .await
        .unwrap();

    team.id
}

/// A migrated store with nothing in it.
pub async fn empty_store() -> Repos {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    support_db::run_migrations(&db).await.unwrap();
    SurrealRepositories::new(db)
}

pub async fn setup() -> Fixture {
    let repos = empty_store().await;

    let team_id = seed_provider(&repos, PROVIDER, &[AGENT, TEAMMATE], SITE, CUSTOMER).await;
    let rival_team_id =
        seed_provider(&repos, RIVAL_PROVIDER, &[RIVAL_AGENT], RIVAL_SITE, RIVAL_CUSTOMER).await;

    Fixture {
        repos,
        team_id,
        rival_team_id,
    }
}

/// Issue a key for `email` without going through a portal.
pub async fn key_for(repos: &Repos, email: &str) -> String {
    let config = PortalConfig::default();
    SessionRegistry::new(repos.sessions(), &LogMailer, &config)
        .issue_or_reuse(email)
        .await
        .unwrap()
}
