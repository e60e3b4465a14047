//! Outbound mail.
//!
//! Delivery sits behind the [`Mailer`] trait. Dispatch is fire-and-forget:
//! failures are logged and never reach the caller, and developer mode
//! suppresses sending entirely.

use support_core::models::ticket::Ticket;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::PortalConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),

    #[error("recipient rejected: {0}")]
    Rejected(String),
}

pub trait Mailer: Send + Sync {
    fn send(&self, email: OutboundEmail) -> impl Future<Output = Result<(), MailError>> + Send;
}

/// Mailer that records each message in the structured log instead of
/// delivering it. Messages without a plausible recipient are rejected.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        if email.recipients.is_empty() {
            return Err(MailError::Rejected("no recipients".into()));
        }
        if let Some(bad) = email.recipients.iter().find(|r| !r.contains('@')) {
            return Err(MailError::Rejected(bad.clone()));
        }
        info!(
            recipients = ?email.recipients,
            subject = %email.subject,
            body_len = email.body.len(),
            "Outbound mail"
        );
        Ok(())
    }
}

/// Which portal a verification link opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Customer,
    Agent,
}

impl Audience {
    fn portal_path(&self) -> &'static str {
        match self {
            Audience::Customer => "/support/portal/customer",
            Audience::Agent => "/support/portal/agent",
        }
    }
}

pub(crate) fn verification_link(config: &PortalConfig, key: &str, audience: Audience) -> String {
    format!(
        "{}{}?key={key}",
        config.base_url.trim_end_matches('/'),
        audience.portal_path()
    )
}

pub(crate) fn verification_email(
    config: &PortalConfig,
    email: &str,
    key: &str,
    audience: Audience,
) -> OutboundEmail {
    let link = verification_link(config, key, audience);
    OutboundEmail {
        recipients: vec![email.to_string()],
        subject: format!("{}: Verify your email", config.product_name),
        body: format!(
            "Welcome to {}!\n\n\
             Please open the link below to start your support session:\n\n{link}\n",
            config.product_name
        ),
    }
}

pub(crate) fn ticket_acknowledgement(config: &PortalConfig, ticket: &Ticket) -> Option<OutboundEmail> {
    let raised_by = ticket.raised_by.as_ref()?;
    Some(OutboundEmail {
        recipients: vec![raised_by.clone()],
        subject: format!("Ticket ID {}", ticket.id),
        body: format!(
            "Hello,\n\n\
             We have received your ticket ID {} with subject: {}.\n\n\
             You can expect a response within one working day based on the \
             criticality of the issue. Our service agreement: {}\n\n\
             You could also try finding your answer in the user manual: {}\n",
            ticket.id, ticket.subject, config.sla_url, config.user_manual_url
        ),
    })
}

pub(crate) fn agent_reply_email(ticket: &Ticket, subject: &str, content: &str) -> Option<OutboundEmail> {
    let raised_by = ticket.raised_by.as_ref()?;
    Some(OutboundEmail {
        recipients: vec![raised_by.clone()],
        subject: subject.to_string(),
        body: content.to_string(),
    })
}

/// Send `email` unless developer mode is on. Failures are logged only.
pub(crate) async fn dispatch<M: Mailer>(mailer: &M, config: &PortalConfig, email: OutboundEmail) {
    if config.developer_mode {
        debug!(subject = %email.subject, "Developer mode: mail suppressed");
        return;
    }
    let subject = email.subject.clone();
    if let Err(e) = mailer.send(email).await {
        warn!(subject = %subject, error = %e, "Mail dispatch failed");
    }
}
