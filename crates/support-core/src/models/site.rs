//! Supported site and site user models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A customer site under support.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportedSite {
    /// Host name, e.g. `acme.example.com`. Unique.
    pub site_name: String,
    /// `None` once the provider has released the site.
    pub support_provider: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSupportedSite {
    pub site_name: String,
    pub support_provider: Option<String>,
}

/// Link between a customer email and a site they may raise tickets for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteUser {
    pub id: Uuid,
    pub site_name: String,
    pub email: String,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSiteUser {
    pub site_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteSummary {
    pub site_name: String,
    pub support_provider: Option<String>,
    pub user_count: u64,
}
