//! Domain models for the support portal.
//!
//! These are the record shapes shared between the storage layer and the
//! portal services.

pub mod assignment_rule;
pub mod comment;
pub mod provider;
pub mod reply;
pub mod session;
pub mod site;
pub mod ticket;
