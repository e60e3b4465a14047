//! Integration tests for session key issuance, validation and revocation.

mod common;

use common::{FailingMailer, RecordingMailer};
use support_core::repository::Repositories;
use support_portal::PortalConfig;
use support_portal::SessionRegistry;
use support_portal::mailer::Audience;

#[tokio::test]
async fn issuing_twice_reuses_the_key() {
    let fx = common::setup().await;
    let mailer = RecordingMailer::default();
    let config = PortalConfig::default();
    let registry = SessionRegistry::new(fx.repos.sessions(), &mailer, &config);

    let first = registry.issue_or_reuse("a@x.com").await.unwrap();
    let second = registry.issue_or_reuse("a@x.com").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 43);
}

#[tokio::test]
async fn distinct_emails_get_distinct_keys() {
    let fx = common::setup().await;
    let config = PortalConfig::default();
    let mailer = RecordingMailer::default();
    let registry = SessionRegistry::new(fx.repos.sessions(), &mailer, &config);

    let a = registry.issue_or_reuse("a@x.com").await.unwrap();
    let b = registry.issue_or_reuse("b@x.com").await.unwrap();
    assert_ne!(a, b);
}

#[tokio::test]
async fn validate_returns_bound_email() {
    let fx = common::setup().await;
    let config = PortalConfig::default();
    let mailer = RecordingMailer::default();
    let registry = SessionRegistry::new(fx.repos.sessions(), &mailer, &config);

    let key = registry.issue_or_reuse("a@x.com").await.unwrap();
    assert_eq!(
        registry.validate(&key).await.unwrap().as_deref(),
        Some("a@x.com")
    );
}

#[tokio::test]
async fn never_issued_key_is_absent() {
    let fx = common::setup().await;
    let config = PortalConfig::default();
    let mailer = RecordingMailer::default();
    let registry = SessionRegistry::new(fx.repos.sessions(), &mailer, &config);

    assert!(registry.validate("randomkey").await.unwrap().is_none());
}

#[tokio::test]
async fn revoked_key_is_absent_and_revoke_is_idempotent() {
    let fx = common::setup().await;
    let config = PortalConfig::default();
    let mailer = RecordingMailer::default();
    let registry = SessionRegistry::new(fx.repos.sessions(), &mailer, &config);

    let key = registry.issue_or_reuse("a@x.com").await.unwrap();
    registry.revoke(&key).await.unwrap();
    assert!(registry.validate(&key).await.unwrap().is_none());

    registry.revoke(&key).await.unwrap();
    registry.revoke("never-issued").await.unwrap();
}

#[tokio::test]
async fn revocation_yields_a_fresh_key() {
    let fx = common::setup().await;
    let config = PortalConfig::default();
    let mailer = RecordingMailer::default();
    let registry = SessionRegistry::new(fx.repos.sessions(), &mailer, &config);

    let old = registry.issue_or_reuse("a@x.com").await.unwrap();
    assert_eq!(registry.revoke_all("a@x.com").await.unwrap(), 1);

    let new = registry.issue_or_reuse("a@x.com").await.unwrap();
    assert_ne!(old, new);
    assert!(registry.validate(&old).await.unwrap().is_none());
}

#[tokio::test]
async fn issue_and_send_mails_the_verification_link() {
    let fx = common::setup().await;
    let config = PortalConfig {
        base_url: "https://help.example.com".into(),
        ..Default::default()
    };
    let mailer = RecordingMailer::default();
    let registry = SessionRegistry::new(fx.repos.sessions(), &mailer, &config);

    let key = registry
        .issue_and_send("a@x.com", Audience::Agent)
        .await
        .unwrap();

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipients, vec!["a@x.com".to_string()]);
    assert!(
        sent[0]
            .body
            .contains(&format!("https://help.example.com/support/portal/agent?key={key}"))
    );
}

#[tokio::test]
async fn developer_mode_issues_without_mailing() {
    let fx = common::setup().await;
    let config = PortalConfig {
        developer_mode: true,
        ..Default::default()
    };
    let mailer = RecordingMailer::default();
    let registry = SessionRegistry::new(fx.repos.sessions(), &mailer, &config);

    let key = registry
        .issue_and_send("a@x.com", Audience::Customer)
        .await
        .unwrap();
    assert!(mailer.sent().is_empty());
    assert_eq!(
        registry.validate(&key).await.unwrap().as_deref(),
        Some("a@x.com")
    );
}

#[tokio::test]
async fn require_denies_revoked_keys_as_expired() {
    let fx = common::setup().await;
    let config = PortalConfig::default();
    let mailer = RecordingMailer::default();
    let registry = SessionRegistry::new(fx.repos.sessions(), &mailer, &config);

    let key = registry.issue_or_reuse("a@x.com").await.unwrap();
    assert_eq!(registry.require(&key).await.unwrap(), "a@x.com");

    registry.revoke(&key).await.unwrap();
    let err = registry.require(&key).await.unwrap_err();
    assert!(err.is_denied());
    assert_eq!(err.title(), "Session Expired");
}

#[tokio::test]
async fn failed_delivery_still_issues_the_key() {
    let fx = common::setup().await;
    let config = PortalConfig::default();
    let registry = SessionRegistry::new(fx.repos.sessions(), &FailingMailer, &config);

    let key = registry
        .issue_and_send("a@x.com", Audience::Customer)
        .await
        .unwrap();
    assert_eq!(registry.validate(&key).await.unwrap().as_deref(), Some("a@x.com"));
}
