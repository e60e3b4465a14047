//! Operator administration.
//!
//! Everything the portals can only do from inside an existing scope starts
//! here: providers, their first teams and agents, and customer site links.
//! Calls are trusted and take no session key.

use support_core::error::{SupportError, SupportResult};
use support_core::models::provider::{
    AgentProfile, CreateSupportTeam, CreateTeamMember, SupportProvider, SupportTeam,
};
use support_core::models::site::{CreateSiteUser, CreateSupportedSite, SiteUser, SupportedSite};
use support_core::repository::{Repositories, SiteRepository, TeamRepository};
use tracing::{debug, info};
use uuid::Uuid;

use crate::assignment;
use crate::customer::normalize_site_name;

fn required(value: &str, field: &str) -> SupportResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SupportError::Validation {
            message: format!("{field} is required"),
        });
    }
    Ok(value.to_string())
}

pub struct AdminConsole<R: Repositories> {
    repos: R,
}

impl<R: Repositories> AdminConsole<R> {
    pub fn new(repos: R) -> Self {
        Self { repos }
    }

    async fn existing_provider(&self, name: &str) -> SupportResult<SupportProvider> {
        self.repos
            .teams()
            .get_provider(name)
            .await?
            .ok_or_else(|| SupportError::NotFound {
                entity: "support_provider".into(),
                id: name.to_string(),
            })
    }

    async fn existing_site(&self, site_name: &str) -> SupportResult<SupportedSite> {
        self.repos
            .sites()
            .get(site_name)
            .await?
            .ok_or_else(|| SupportError::NotFound {
                entity: "supported_site".into(),
                id: site_name.to_string(),
            })
    }

    pub async fn add_provider(&self, name: &str) -> SupportResult<SupportProvider> {
        let name = required(name, "Provider name")?;
        let provider = self.repos.teams().create_provider(&name).await?;
        info!(provider = %provider.name, "Support provider created");
        Ok(provider)
    }

    pub async fn add_team(&self, provider: &str, team_name: &str) -> SupportResult<SupportTeam> {
        let provider = self.existing_provider(provider.trim()).await?;
        let team = self
            .repos
            .teams()
            .create_team(CreateSupportTeam {
                support_provider: provider.name,
                team_name: required(team_name, "Team name")?,
            })
            .await?;
        info!(team_id = %team.id, provider = %team.support_provider, "Support team created");
        Ok(team)
    }

    /// Add an agent to a team and sync the team's assignment rule. An
    /// existing membership is returned unchanged.
    pub async fn add_member(
        &self,
        team_id: Uuid,
        email: &str,
        full_name: &str,
    ) -> SupportResult<AgentProfile> {
        let team = self.repos.teams().get_team(team_id).await?;
        let email = required(email, "Email")?;

        let member = match self.repos.teams().find_member(team_id, &email).await? {
            Some(member) => {
                debug!(email = %email, team_id = %team_id, "Agent already in team");
                member
            }
            None => {
                let member = self
                    .repos
                    .teams()
                    .add_member(CreateTeamMember {
                        team_id,
                        email,
                        full_name: full_name.trim().to_string(),
                    })
                    .await?;
                assignment::sync_team_rule(&self.repos, &team.support_provider, team_id).await?;
                info!(email = %member.email, team_id = %team_id, "Agent added by operator");
                member
            }
        };
        Ok(AgentProfile::from_parts(&team, &member))
    }

    /// Register a site, optionally under an existing provider.
    pub async fn add_site(
        &self,
        site_name: &str,
        provider: Option<&str>,
    ) -> SupportResult<SupportedSite> {
        let site_name = required(&normalize_site_name(site_name), "Site name")?;
        let support_provider = match provider {
            Some(name) => Some(self.existing_provider(name.trim()).await?.name),
            None => None,
        };
        let site = self
            .repos
            .sites()
            .create(CreateSupportedSite {
                site_name,
                support_provider,
            })
            .await?;
        info!(site = %site.site_name, provider = ?site.support_provider, "Site registered by operator");
        Ok(site)
    }

    /// Link a customer to a site. A disabled link is re-enabled.
    pub async fn link_site_user(&self, site_name: &str, email: &str) -> SupportResult<SiteUser> {
        let site = self.existing_site(&normalize_site_name(site_name)).await?;
        let email = required(email, "Email")?;

        match self.repos.sites().find_user(&site.site_name, &email).await? {
            Some(user) if !user.disabled => Ok(user),
            Some(_) => {
                self.set_site_user_disabled(&site.site_name, &email, false)
                    .await
            }
            None => {
                let user = self
                    .repos
                    .sites()
                    .add_user(CreateSiteUser {
                        site_name: site.site_name,
                        email,
                    })
                    .await?;
                info!(email = %user.email, site = %user.site_name, "Customer linked to site");
                Ok(user)
            }
        }
    }

    /// Disable or re-enable a customer's site link. Disabled links drop out
    /// of the customer's scope on the next call.
    pub async fn set_site_user_disabled(
        &self,
        site_name: &str,
        email: &str,
        disabled: bool,
    ) -> SupportResult<SiteUser> {
        let site_name = normalize_site_name(site_name);
        let user = self
            .repos
            .sites()
            .set_user_disabled(&site_name, email.trim(), disabled)
            .await?;
        info!(email = %user.email, site = %user.site_name, disabled, "Site link updated");
        Ok(user)
    }
}
