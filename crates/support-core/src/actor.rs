//! Explicit write identity.
//!
//! Writes that act beyond the caller's own records (status changes,
//! assignment bookkeeping, registration tickets) take an [`Actor`]
//! instead of switching an ambient "current user". The actor is stored
//! on the written record as `updated_by`.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    Customer(String),
    Agent(String),
    /// Portal-internal bookkeeping (registration, assignment rules).
    System,
}

impl Actor {
    pub fn email(&self) -> Option<&str> {
        match self {
            Actor::Customer(email) | Actor::Agent(email) => Some(email),
            Actor::System => None,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Customer(email) => write!(f, "customer:{email}"),
            Actor::Agent(email) => write!(f, "agent:{email}"),
            Actor::System => f.write_str("system"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_stable() {
        assert_eq!(Actor::Agent("a@x.com".into()).to_string(), "agent:a@x.com");
        assert_eq!(Actor::System.to_string(), "system");
        assert_eq!(Actor::System.email(), None);
    }
}
