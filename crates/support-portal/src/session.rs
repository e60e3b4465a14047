//! Session registry: issue, validate and revoke email-bound session keys.
//!
//! A key proves control of an email address for as long as it stays
//! unrevoked. There is no time-based expiry. One key per email is reused
//! on every request; two concurrent first requests for the same email may
//! both create a key, which only costs a duplicate verification mail.

use support_core::error::SupportResult;
use support_core::models::session::CreateSession;
use support_core::repository::SessionRepository;
use tracing::{debug, info};

use crate::config::PortalConfig;
use crate::error::PortalError;
use crate::key;
use crate::mailer::{self, Audience, Mailer};

pub struct SessionRegistry<'a, S, M> {
    sessions: &'a S,
    mailer: &'a M,
    config: &'a PortalConfig,
}

impl<'a, S: SessionRepository, M: Mailer> SessionRegistry<'a, S, M> {
    pub fn new(sessions: &'a S, mailer: &'a M, config: &'a PortalConfig) -> Self {
        Self {
            sessions,
            mailer,
            config,
        }
    }

    /// Return the email's existing key, or create and persist a new one.
    pub async fn issue_or_reuse(&self, email: &str) -> SupportResult<String> {
        if let Some(existing) = self.sessions.find_by_email(email).await? {
            debug!(email, "Reusing session key");
            return Ok(existing.key);
        }

        let session = self
            .sessions
            .create(CreateSession {
                key: key::generate_session_key(),
                email: email.to_string(),
            })
            .await?;
        info!(email, session_id = %session.id, "Issued session key");
        Ok(session.key)
    }

    /// Issue (or reuse) a key and mail the verification link for
    /// `audience`. Delivery failures are not reported.
    pub async fn issue_and_send(&self, email: &str, audience: Audience) -> SupportResult<String> {
        let key = self.issue_or_reuse(email).await?;
        let message = mailer::verification_email(self.config, email, &key, audience);
        mailer::dispatch(self.mailer, self.config, message).await;
        Ok(key)
    }

    /// The email bound to `key`, or `None` when the key is unknown or
    /// revoked.
    pub async fn validate(&self, key: &str) -> SupportResult<Option<String>> {
        Ok(self
            .sessions
            .find_by_key(key)
            .await?
            .map(|session| session.email))
    }

    /// Like [`validate`](Self::validate), but an unknown or revoked key is
    /// a `SessionExpired` denial.
    pub async fn require(&self, key: &str) -> SupportResult<String> {
        self.validate(key).await?.ok_or_else(|| {
            debug!("Unknown or revoked session key");
            PortalError::SessionExpired.into()
        })
    }

    /// Delete the key. Unknown keys are a no-op.
    pub async fn revoke(&self, key: &str) -> SupportResult<()> {
        self.sessions.delete_by_key(key).await?;
        debug!("Revoked session key");
        Ok(())
    }

    /// Delete every key issued to `email`.
    pub async fn revoke_all(&self, email: &str) -> SupportResult<u64> {
        let removed = self.sessions.delete_by_email(email).await?;
        info!(email, removed, "Revoked all session keys");
        Ok(removed)
    }
}
