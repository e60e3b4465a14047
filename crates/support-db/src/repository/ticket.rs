//! SurrealDB implementation of [`TicketRepository`].

use chrono::{DateTime, Utc};
use support_core::actor::Actor;
use support_core::error::SupportResult;
use support_core::models::ticket::{
    CreateTicket, StatusFilter, Ticket, TicketFilter, TicketStatus, UpdateTicket,
};
use support_core::repository::TicketRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct TicketRowWithId {
    record_id: String,
    subject: String,
    status: String,
    priority: Option<String>,
    raised_by: Option<String>,
    site_name: Option<String>,
    support_provider: Option<String>,
    source: String,
    assignees: Vec<String>,
    closed_by: Option<String>,
    support_rating: Option<i64>,
    reference_document: Option<String>,
    reference_module: Option<String>,
    reference_name: Option<String>,
    first_responded_on: Option<DateTime<Utc>>,
    resolution_date: Option<DateTime<Utc>>,
    updated_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TicketRowWithId {
    fn try_into_ticket(self) -> Result<Ticket, DbError> {
        let id = parse_uuid(&self.record_id, "ticket")?;
        let status = self
            .status
            .parse::<TicketStatus>()
            .map_err(|e| DbError::Decode(e.to_string()))?;
        let support_rating = self
            .support_rating
            .map(|r| {
                u8::try_from(r).map_err(|_| DbError::Decode(format!("invalid rating: {r}")))
            })
            .transpose()?;
        Ok(Ticket {
            id,
            subject: self.subject,
            status,
            priority: self.priority,
            raised_by: self.raised_by,
            site_name: self.site_name,
            support_provider: self.support_provider,
            source: self.source,
            assignees: self.assignees,
            closed_by: self.closed_by,
            support_rating,
            reference_document: self.reference_document,
            reference_module: self.reference_module,
            reference_name: self.reference_name,
            first_responded_on: self.first_responded_on,
            resolution_date: self.resolution_date,
            updated_by: self.updated_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Ticket repository.
#[derive(Clone)]
pub struct SurrealTicketRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTicketRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TicketRepository for SurrealTicketRepository<C> {
    async fn create(&self, input: CreateTicket, actor: &Actor) -> SupportResult<Ticket> {
        let id = Uuid::new_v4();

        self.db
            .query(
                "CREATE type::record('ticket', $id) SET \
                 subject = $subject, status = 'Open', \
                 raised_by = $raised_by, site_name = $site_name, \
                 support_provider = $support_provider, source = $source, \
                 assignees = [], \
                 reference_document = $reference_document, \
                 reference_module = $reference_module, \
                 reference_name = $reference_name, \
                 updated_by = $updated_by",
            )
            .bind(("id", id.to_string()))
            .bind(("subject", input.subject))
            .bind(("raised_by", input.raised_by))
            .bind(("site_name", input.site_name))
            .bind(("support_provider", input.support_provider))
            .bind(("source", input.source))
            .bind(("reference_document", input.reference_document))
            .bind(("reference_module", input.reference_module))
            .bind(("reference_name", input.reference_name))
            .bind(("updated_by", actor.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> SupportResult<Ticket> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('ticket', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TicketRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "ticket".into(),
            id: id_str,
        })?;

        row.try_into_ticket().map_err(Into::into)
    }

    async fn update(&self, id: Uuid, input: UpdateTicket, actor: &Actor) -> SupportResult<Ticket> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.priority.is_some() {
            sets.push("priority = $priority");
        }
        if input.assignees.is_some() {
            sets.push("assignees = $assignees");
        }
        if input.closed_by.is_some() {
            sets.push("closed_by = $closed_by");
        }
        if input.support_rating.is_some() {
            sets.push("support_rating = $support_rating");
        }
        if input.first_responded_on.is_some() {
            sets.push("first_responded_on = $first_responded_on");
        }
        if input.resolution_date.is_some() {
            sets.push("resolution_date = $resolution_date");
        }
        sets.push("updated_by = $updated_by");
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('ticket', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("updated_by", actor.to_string()));

        if let Some(status) = input.status {
            builder = builder.bind(("status", status.as_str()));
        }
        if let Some(priority) = input.priority {
            builder = builder.bind(("priority", priority));
        }
        if let Some(assignees) = input.assignees {
            builder = builder.bind(("assignees", assignees));
        }
        if let Some(closed_by) = input.closed_by {
            builder = builder.bind(("closed_by", closed_by));
        }
        if let Some(support_rating) = input.support_rating {
            builder = builder.bind(("support_rating", support_rating.map(i64::from)));
        }
        if let Some(first_responded_on) = input.first_responded_on {
            builder = builder.bind(("first_responded_on", first_responded_on));
        }
        if let Some(resolution_date) = input.resolution_date {
            builder = builder.bind(("resolution_date", resolution_date));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        // UPDATE on a missing record id yields no rows.
        let rows: Vec<surrealdb_types::Value> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "ticket".into(),
                id: id_str,
            }
            .into());
        }

        self.get_by_id(id).await
    }

    async fn list(&self, filter: TicketFilter) -> SupportResult<Vec<Ticket>> {
        // An explicitly empty site scope can never match.
        if matches!(&filter.site_names, Some(names) if names.is_empty()) {
            return Ok(Vec::new());
        }

        let mut conditions = Vec::new();
        if filter.site_names.is_some() {
            conditions.push("site_name INSIDE $site_names");
        }
        if filter.support_provider.is_some() {
            conditions.push("support_provider = $support_provider");
        }
        match filter.status {
            StatusFilter::Open => conditions.push("status != 'Closed'"),
            StatusFilter::Closed => conditions.push("status = 'Closed'"),
            StatusFilter::Any => {}
        }
        let search = filter
            .search_text
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        if search.is_some() {
            conditions.push(
                "(string::contains(string::lowercase(subject), $search) \
                 OR string::contains(string::lowercase(site_name ?? ''), $search))",
            );
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM ticket {where_clause} \
             ORDER BY created_at DESC"
        );

        let mut builder = self.db.query(&query);
        if let Some(site_names) = filter.site_names {
            builder = builder.bind(("site_names", site_names));
        }
        if let Some(support_provider) = filter.support_provider {
            builder = builder.bind(("support_provider", support_provider));
        }
        if let Some(search) = search {
            builder = builder.bind(("search", search));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<TicketRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|r| r.try_into_ticket().map_err(Into::into))
            .collect()
    }
}
