//! SurrealDB implementation of [`SiteRepository`].

use chrono::{DateTime, Utc};
use support_core::error::SupportResult;
use support_core::models::site::{
    CreateSiteUser, CreateSupportedSite, SiteSummary, SiteUser, SupportedSite,
};
use support_core::repository::SiteRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid, write_error};

#[derive(Debug, SurrealValue)]
struct SiteRow {
    site_name: String,
    support_provider: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SiteRow> for SupportedSite {
    fn from(row: SiteRow) -> Self {
        SupportedSite {
            site_name: row.site_name,
            support_provider: row.support_provider,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct SiteUserRowWithId {
    record_id: String,
    site_name: String,
    email: String,
    disabled: bool,
    created_at: DateTime<Utc>,
}

impl SiteUserRowWithId {
    fn try_into_site_user(self) -> Result<SiteUser, DbError> {
        Ok(SiteUser {
            id: parse_uuid(&self.record_id, "site user")?,
            site_name: self.site_name,
            email: self.email,
            disabled: self.disabled,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct SiteNameRow {
    site_name: String,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Site repository.
#[derive(Clone)]
pub struct SurrealSiteRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSiteRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn user_count(&self, site_name: &str) -> SupportResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM site_user \
                 WHERE site_name = $site_name GROUP ALL",
            )
            .bind(("site_name", site_name.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn summarize(&self, site: SupportedSite) -> SupportResult<SiteSummary> {
        let user_count = self.user_count(&site.site_name).await?;
        Ok(SiteSummary {
            site_name: site.site_name,
            support_provider: site.support_provider,
            user_count,
        })
    }
}

impl<C: Connection> SiteRepository for SurrealSiteRepository<C> {
    async fn create(&self, input: CreateSupportedSite) -> SupportResult<SupportedSite> {
        let result = self
            .db
            .query(
                "CREATE supported_site SET \
                 site_name = $site_name, \
                 support_provider = $support_provider",
            )
            .bind(("site_name", input.site_name.clone()))
            .bind(("support_provider", input.support_provider))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(write_error("supported_site"))?;

        let rows: Vec<SiteRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "supported_site".into(),
            id: input.site_name,
        })?;

        Ok(row.into())
    }

    async fn get(&self, site_name: &str) -> SupportResult<Option<SupportedSite>> {
        let mut result = self
            .db
            .query("SELECT * FROM supported_site WHERE site_name = $site_name")
            .bind(("site_name", site_name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SiteRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(Into::into))
    }

    async fn set_provider(
        &self,
        site_name: &str,
        support_provider: Option<String>,
    ) -> SupportResult<SupportedSite> {
        let result = self
            .db
            .query(
                "UPDATE supported_site SET \
                 support_provider = $support_provider, \
                 updated_at = time::now() \
                 WHERE site_name = $site_name",
            )
            .bind(("site_name", site_name.to_string()))
            .bind(("support_provider", support_provider))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SiteRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "supported_site".into(),
            id: site_name.to_string(),
        })?;

        Ok(row.into())
    }

    async fn add_user(&self, input: CreateSiteUser) -> SupportResult<SiteUser> {
        let id = Uuid::new_v4();

        self.db
            .query(
                "CREATE type::record('site_user', $id) SET \
                 site_name = $site_name, email = $email, disabled = false",
            )
            .bind(("id", id.to_string()))
            .bind(("site_name", input.site_name.clone()))
            .bind(("email", input.email.clone()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(write_error("site_user"))?;

        self.find_user(&input.site_name, &input.email)
            .await?
            .ok_or_else(|| {
                DbError::NotFound {
                    entity: "site_user".into(),
                    id: id.to_string(),
                }
                .into()
            })
    }

    async fn find_user(&self, site_name: &str, email: &str) -> SupportResult<Option<SiteUser>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM site_user \
                 WHERE site_name = $site_name AND email = $email",
            )
            .bind(("site_name", site_name.to_string()))
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SiteUserRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_site_user()?)),
            None => Ok(None),
        }
    }

    async fn set_user_disabled(
        &self,
        site_name: &str,
        email: &str,
        disabled: bool,
    ) -> SupportResult<SiteUser> {
        self.db
            .query(
                "UPDATE site_user SET disabled = $disabled \
                 WHERE site_name = $site_name AND email = $email",
            )
            .bind(("site_name", site_name.to_string()))
            .bind(("email", email.to_string()))
            .bind(("disabled", disabled))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.find_user(site_name, email).await?.ok_or_else(|| {
            DbError::NotFound {
                entity: "site_user".into(),
                id: format!("{site_name}/{email}"),
            }
            .into()
        })
    }

    async fn site_names_for_email(&self, email: &str) -> SupportResult<Vec<String>> {
        let mut result = self
            .db
            .query(
                "SELECT site_name FROM site_user \
                 WHERE email = $email AND disabled = false \
                 ORDER BY site_name ASC",
            )
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SiteNameRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(|r| r.site_name).collect())
    }

    async fn summary(&self, site_name: &str) -> SupportResult<Option<SiteSummary>> {
        match self.get(site_name).await? {
            Some(site) => Ok(Some(self.summarize(site).await?)),
            None => Ok(None),
        }
    }

    async fn summaries_for_provider(
        &self,
        support_provider: &str,
    ) -> SupportResult<Vec<SiteSummary>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM supported_site \
                 WHERE support_provider = $support_provider \
                 ORDER BY site_name ASC",
            )
            .bind(("support_provider", support_provider.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SiteRow> = result.take(0).map_err(DbError::from)?;
        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            summaries.push(self.summarize(row.into()).await?);
        }
        Ok(summaries)
    }
}
