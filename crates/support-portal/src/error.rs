//! Portal denial reasons.
//!
//! Every reason collapses into
//! [`SupportError::Denied`](support_core::error::SupportError::Denied) with a
//! user-facing title. Callers never learn whether a record was missing or
//! merely out of their scope.

use support_core::error::SupportError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortalError {
    #[error("Your support session has expired. Please login again to continue.")]
    SessionExpired,

    #[error("You do not have access to any site. Please contact your system administrator.")]
    NoSiteAccess,

    #[error(
        "You have not been registered as an agent. Reach out to your administrator to get registered."
    )]
    NotRegistered,

    #[error("You do not have access to this ticket. Please contact your system administrator.")]
    NoTicketAccess,

    #[error("You do not have access to this site.")]
    SiteNotInScope,

    #[error("You cannot {0} yourself.")]
    CannotModifySelf(&'static str),

    #[error("Agent does not exist.")]
    AgentNotFound,

    #[error("Assignee is not a member of your team.")]
    AssigneeNotInTeam,

    #[error("Site already exists.")]
    SiteExists,

    #[error("Site already exists and is supported by another provider.")]
    SiteOwnedElsewhere,

    #[error("{0}")]
    InvalidInput(String),
}

impl PortalError {
    pub fn title(&self) -> &'static str {
        match self {
            PortalError::SessionExpired => "Session Expired",
            PortalError::NotRegistered => "Not Registered",
            PortalError::NoSiteAccess
            | PortalError::NoTicketAccess
            | PortalError::SiteNotInScope
            | PortalError::AgentNotFound
            | PortalError::AssigneeNotInTeam => "No Access",
            PortalError::CannotModifySelf(_) => "Not Allowed",
            PortalError::SiteExists | PortalError::SiteOwnedElsewhere => "Site Exists",
            PortalError::InvalidInput(_) => "Invalid Input",
        }
    }
}

impl From<PortalError> for SupportError {
    fn from(err: PortalError) -> Self {
        SupportError::denied(err.title(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_into_denied_with_title() {
        let err: SupportError = PortalError::SessionExpired.into();
        assert!(err.is_denied());
        assert_eq!(err.title(), "Session Expired");

        let err: SupportError = PortalError::CannotModifySelf("remove").into();
        assert_eq!(err.message(), "You cannot remove yourself.");
    }
}
