//! Portal services for the support desk.
//!
//! Customers and agents prove control of an email address with a session
//! key mailed to them. Every call then resolves the key into a [`Scope`]
//! (the customer's sites or the agent's support provider) and only ever
//! touches records inside it. [`AdminConsole`] bootstraps what no scope
//! can create: providers, their first agents and customer site links.

mod assignment;
pub mod admin;
pub mod agent;
pub mod config;
pub mod customer;
pub mod error;
pub mod key;
pub mod mailer;
pub mod scope;
pub mod session;

pub use admin::AdminConsole;
pub use agent::AgentPortal;
pub use config::PortalConfig;
pub use customer::CustomerPortal;
pub use error::PortalError;
pub use mailer::{LogMailer, Mailer, OutboundEmail};
pub use scope::{AgentScope, CustomerScope, Scope, ScopeResolver};
pub use session::SessionRegistry;
