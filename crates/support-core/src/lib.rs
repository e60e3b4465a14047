//! Support portal core: domain models, repository traits, and the
//! shared error type.

pub mod actor;
pub mod error;
pub mod models;
pub mod repository;

pub use actor::Actor;
pub use error::{SupportError, SupportResult};
