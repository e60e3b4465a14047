//! Error types for the support portal.
//!
//! Callers only ever see one kind of failure: a denial carrying a
//! user-facing title and message. The remaining variants travel between
//! the storage and service layers and are collapsed into a denial (or an
//! opaque database error) before they leave the portal.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupportError {
    #[error("{title}: {message}")]
    Denied { title: String, message: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),
}

impl SupportError {
    pub fn denied(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Denied {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Title shown alongside the message in the portal.
    pub fn title(&self) -> &str {
        match self {
            Self::Denied { title, .. } => title,
            Self::NotFound { .. } => "Not Found",
            Self::AlreadyExists { .. } => "Already Exists",
            Self::Validation { .. } => "Invalid Input",
            Self::Database(_) => "Error",
        }
    }

    /// User-facing message without the title prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Denied { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type SupportResult<T> = Result<T, SupportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denied_exposes_title_and_message() {
        let err = SupportError::denied("No Access", "You do not have access to this ticket.");
        assert!(err.is_denied());
        assert_eq!(err.title(), "No Access");
        assert_eq!(err.message(), "You do not have access to this ticket.");
        assert_eq!(
            err.to_string(),
            "No Access: You do not have access to this ticket."
        );
    }

    #[test]
    fn infrastructure_errors_get_generic_title() {
        let err = SupportError::Database("connection reset".into());
        assert_eq!(err.title(), "Error");
        assert!(!err.is_denied());
    }
}
