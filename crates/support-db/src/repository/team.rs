//! SurrealDB implementation of [`TeamRepository`].

use chrono::{DateTime, Utc};
use support_core::error::SupportResult;
use support_core::models::provider::{
    AgentProfile, CreateSupportTeam, CreateTeamMember, SupportProvider, SupportTeam, TeamMember,
};
use support_core::repository::TeamRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid, write_error};

#[derive(Debug, SurrealValue)]
struct ProviderRow {
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct TeamRow {
    support_provider: String,
    team_name: String,
    created_at: DateTime<Utc>,
}

impl TeamRow {
    fn into_team(self, id: Uuid) -> SupportTeam {
        SupportTeam {
            id,
            support_provider: self.support_provider,
            team_name: self.team_name,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct MemberRowWithId {
    record_id: String,
    team_id: String,
    email: String,
    full_name: String,
    disabled: bool,
    created_at: DateTime<Utc>,
}

impl MemberRowWithId {
    fn try_into_member(self) -> Result<TeamMember, DbError> {
        Ok(TeamMember {
            id: parse_uuid(&self.record_id, "team member")?,
            team_id: parse_uuid(&self.team_id, "team")?,
            email: self.email,
            full_name: self.full_name,
            disabled: self.disabled,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Team repository.
#[derive(Clone)]
pub struct SurrealTeamRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTeamRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn members_where(
        &self,
        condition: &'static str,
        team_id: Option<Uuid>,
        email: Option<&str>,
    ) -> SupportResult<Vec<TeamMember>> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM team_member \
             WHERE {condition} ORDER BY created_at ASC"
        );
        let mut result = self
            .db
            .query(query)
            .bind(("team_id", team_id.map(|id| id.to_string())))
            .bind(("email", email.map(str::to_string)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|r| r.try_into_member().map_err(Into::into))
            .collect()
    }
}

impl<C: Connection> TeamRepository for SurrealTeamRepository<C> {
    async fn create_provider(&self, name: &str) -> SupportResult<SupportProvider> {
        let result = self
            .db
            .query("CREATE support_provider SET name = $name")
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(write_error("support_provider"))?;

        let rows: Vec<ProviderRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "support_provider".into(),
            id: name.to_string(),
        })?;

        Ok(SupportProvider {
            name: row.name,
            created_at: row.created_at,
        })
    }

    async fn get_provider(&self, name: &str) -> SupportResult<Option<SupportProvider>> {
        let mut result = self
            .db
            .query("SELECT * FROM support_provider WHERE name = $name")
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProviderRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(|row| SupportProvider {
            name: row.name,
            created_at: row.created_at,
        }))
    }

    async fn create_team(&self, input: CreateSupportTeam) -> SupportResult<SupportTeam> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('support_team', $id) SET \
                 support_provider = $support_provider, \
                 team_name = $team_name",
            )
            .bind(("id", id_str.clone()))
            .bind(("support_provider", input.support_provider))
            .bind(("team_name", input.team_name))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(write_error("support_team"))?;

        let rows: Vec<TeamRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "support_team".into(),
            id: id_str,
        })?;

        Ok(row.into_team(id))
    }

    async fn get_team(&self, id: Uuid) -> SupportResult<SupportTeam> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('support_team', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TeamRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "support_team".into(),
            id: id_str,
        })?;

        Ok(row.into_team(id))
    }

    async fn add_member(&self, input: CreateTeamMember) -> SupportResult<TeamMember> {
        let id = Uuid::new_v4();

        let result = self
            .db
            .query(
                "CREATE type::record('team_member', $id) SET \
                 team_id = $team_id, email = $email, \
                 full_name = $full_name, disabled = false",
            )
            .bind(("id", id.to_string()))
            .bind(("team_id", input.team_id.to_string()))
            .bind(("email", input.email.clone()))
            .bind(("full_name", input.full_name))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(write_error("team_member"))?;

        self.find_member(input.team_id, &input.email)
            .await?
            .ok_or_else(|| {
                DbError::NotFound {
                    entity: "team_member".into(),
                    id: id.to_string(),
                }
                .into()
            })
    }

    async fn find_member(&self, team_id: Uuid, email: &str) -> SupportResult<Option<TeamMember>> {
        let members = self
            .members_where(
                "team_id = $team_id AND email = $email",
                Some(team_id),
                Some(email),
            )
            .await?;
        Ok(members.into_iter().next())
    }

    async fn list_members(&self, team_id: Uuid) -> SupportResult<Vec<TeamMember>> {
        self.members_where("team_id = $team_id", Some(team_id), None)
            .await
    }

    async fn remove_member(&self, team_id: Uuid, email: &str) -> SupportResult<()> {
        self.db
            .query("DELETE team_member WHERE team_id = $team_id AND email = $email")
            .bind(("team_id", team_id.to_string()))
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn set_member_disabled(
        &self,
        team_id: Uuid,
        email: &str,
        disabled: bool,
    ) -> SupportResult<TeamMember> {
        self.db
            .query(
                "UPDATE team_member SET disabled = $disabled \
                 WHERE team_id = $team_id AND email = $email",
            )
            .bind(("team_id", team_id.to_string()))
            .bind(("email", email.to_string()))
            .bind(("disabled", disabled))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.find_member(team_id, email).await?.ok_or_else(|| {
            DbError::NotFound {
                entity: "team_member".into(),
                id: format!("{team_id}/{email}"),
            }
            .into()
        })
    }

    async fn agent_profiles(&self, email: &str) -> SupportResult<Vec<AgentProfile>> {
        let memberships = self.members_where("email = $email", None, Some(email)).await?;

        let mut profiles = Vec::with_capacity(memberships.len());
        for member in &memberships {
            let team = self.get_team(member.team_id).await?;
            profiles.push(AgentProfile::from_parts(&team, member));
        }
        Ok(profiles)
    }
}
