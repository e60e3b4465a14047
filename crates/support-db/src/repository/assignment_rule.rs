//! SurrealDB implementation of [`AssignmentRuleRepository`].

use chrono::{DateTime, Utc};
use support_core::actor::Actor;
use support_core::error::SupportResult;
use support_core::models::assignment_rule::AssignmentRule;
use support_core::repository::AssignmentRuleRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct RuleRow {
    name: String,
    support_provider: String,
    team_id: String,
    users: Vec<String>,
    last_assigned: Option<String>,
    disabled: bool,
    updated_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RuleRow {
    fn try_into_rule(self) -> Result<AssignmentRule, DbError> {
        Ok(AssignmentRule {
            name: self.name,
            support_provider: self.support_provider,
            team_id: parse_uuid(&self.team_id, "team")?,
            users: self.users,
            last_assigned: self.last_assigned,
            disabled: self.disabled,
            updated_by: self.updated_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the AssignmentRule repository.
#[derive(Clone)]
pub struct SurrealAssignmentRuleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAssignmentRuleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AssignmentRuleRepository for SurrealAssignmentRuleRepository<C> {
    async fn upsert_for_team(
        &self,
        support_provider: &str,
        team_id: Uuid,
        users: Vec<String>,
        actor: &Actor,
    ) -> SupportResult<AssignmentRule> {
        let name = AssignmentRule::rule_name(support_provider, team_id);
        let exists = self.get(&name).await?.is_some();

        let query = if exists {
            "UPDATE assignment_rule SET users = $users, \
             updated_by = $updated_by, updated_at = time::now() \
             WHERE name = $name"
        } else {
            "CREATE assignment_rule SET name = $name, \
             support_provider = $support_provider, team_id = $team_id, \
             users = $users, last_assigned = NONE, disabled = false, \
             updated_by = $updated_by"
        };
        debug!(rule = %name, created = !exists, users = users.len(), "Syncing assignment rule");

        self.db
            .query(query)
            .bind(("name", name.clone()))
            .bind(("support_provider", support_provider.to_string()))
            .bind(("team_id", team_id.to_string()))
            .bind(("users", users))
            .bind(("updated_by", actor.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get(&name).await?.ok_or_else(|| {
            DbError::NotFound {
                entity: "assignment_rule".into(),
                id: name,
            }
            .into()
        })
    }

    async fn get(&self, name: &str) -> SupportResult<Option<AssignmentRule>> {
        let mut result = self
            .db
            .query("SELECT * FROM assignment_rule WHERE name = $name")
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RuleRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_rule()?)),
            None => Ok(None),
        }
    }

    async fn find_for_provider(
        &self,
        support_provider: &str,
    ) -> SupportResult<Option<AssignmentRule>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM assignment_rule \
                 WHERE support_provider = $support_provider AND disabled = false \
                 ORDER BY created_at ASC LIMIT 1",
            )
            .bind(("support_provider", support_provider.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RuleRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_rule()?)),
            None => Ok(None),
        }
    }

    async fn record_assignment(&self, name: &str, user: &str, actor: &Actor) -> SupportResult<()> {
        self.db
            .query(
                "UPDATE assignment_rule SET last_assigned = $user, \
                 updated_by = $updated_by, updated_at = time::now() \
                 WHERE name = $name",
            )
            .bind(("name", name.to_string()))
            .bind(("user", user.to_string()))
            .bind(("updated_by", actor.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }
}
