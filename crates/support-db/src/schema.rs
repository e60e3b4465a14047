//! Schema definitions and migration runner for SurrealDB.
//!
//! All tables are SCHEMAFULL. UUIDs are stored as strings; enums are
//! stored as strings guarded by ASSERT constraints.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: SCHEMA_V1,
    },
    Migration {
        version: 2,
        name: "assignment_rules",
        sql: SCHEMA_V2,
    },
];

// -----------------------------------------------------------------------
// Schema v1: sessions, providers, sites, tickets
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Session keys
-- =======================================================================
DEFINE TABLE support_session SCHEMAFULL;
DEFINE FIELD key ON TABLE support_session TYPE string;
DEFINE FIELD email ON TABLE support_session TYPE string;
DEFINE FIELD created_at ON TABLE support_session TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_session_key ON TABLE support_session \
    COLUMNS key UNIQUE;
DEFINE INDEX idx_session_email ON TABLE support_session \
    COLUMNS email;

-- =======================================================================
-- Support providers and their teams
-- =======================================================================
DEFINE TABLE support_provider SCHEMAFULL;
DEFINE FIELD name ON TABLE support_provider TYPE string;
DEFINE FIELD created_at ON TABLE support_provider TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_provider_name ON TABLE support_provider \
    COLUMNS name UNIQUE;

DEFINE TABLE support_team SCHEMAFULL;
DEFINE FIELD support_provider ON TABLE support_team TYPE string;
DEFINE FIELD team_name ON TABLE support_team TYPE string;
DEFINE FIELD created_at ON TABLE support_team TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_team_provider_name ON TABLE support_team \
    COLUMNS support_provider, team_name UNIQUE;

DEFINE TABLE team_member SCHEMAFULL;
DEFINE FIELD team_id ON TABLE team_member TYPE string;
DEFINE FIELD email ON TABLE team_member TYPE string;
DEFINE FIELD full_name ON TABLE team_member TYPE string;
DEFINE FIELD disabled ON TABLE team_member TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE team_member TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_member_team_email ON TABLE team_member \
    COLUMNS team_id, email UNIQUE;
DEFINE INDEX idx_member_email ON TABLE team_member COLUMNS email;

-- =======================================================================
-- Supported sites and their customer users
-- =======================================================================
DEFINE TABLE supported_site SCHEMAFULL;
DEFINE FIELD site_name ON TABLE supported_site TYPE string;
DEFINE FIELD support_provider ON TABLE supported_site \
    TYPE option<string>;
DEFINE FIELD created_at ON TABLE supported_site TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE supported_site TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_site_name ON TABLE supported_site \
    COLUMNS site_name UNIQUE;
DEFINE INDEX idx_site_provider ON TABLE supported_site \
    COLUMNS support_provider;

DEFINE TABLE site_user SCHEMAFULL;
DEFINE FIELD site_name ON TABLE site_user TYPE string;
DEFINE FIELD email ON TABLE site_user TYPE string;
DEFINE FIELD disabled ON TABLE site_user TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE site_user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_site_user ON TABLE site_user \
    COLUMNS site_name, email UNIQUE;
DEFINE INDEX idx_site_user_email ON TABLE site_user COLUMNS email;

-- =======================================================================
-- Tickets
-- =======================================================================
DEFINE TABLE ticket SCHEMAFULL;
DEFINE FIELD subject ON TABLE ticket TYPE string;
DEFINE FIELD status ON TABLE ticket TYPE string \
    ASSERT $value IN ['Open', 'Replied', 'OnHold', 'Resolved', 'Closed'];
DEFINE FIELD priority ON TABLE ticket TYPE option<string>;
DEFINE FIELD raised_by ON TABLE ticket TYPE option<string>;
DEFINE FIELD site_name ON TABLE ticket TYPE option<string>;
DEFINE FIELD support_provider ON TABLE ticket TYPE option<string>;
DEFINE FIELD source ON TABLE ticket TYPE string;
DEFINE FIELD assignees ON TABLE ticket TYPE array DEFAULT [];
DEFINE FIELD assignees.* ON TABLE ticket TYPE string;
DEFINE FIELD closed_by ON TABLE ticket TYPE option<string>;
DEFINE FIELD support_rating ON TABLE ticket TYPE option<int>;
DEFINE FIELD reference_document ON TABLE ticket TYPE option<string>;
DEFINE FIELD reference_module ON TABLE ticket TYPE option<string>;
DEFINE FIELD reference_name ON TABLE ticket TYPE option<string>;
DEFINE FIELD first_responded_on ON TABLE ticket TYPE option<datetime>;
DEFINE FIELD resolution_date ON TABLE ticket TYPE option<datetime>;
DEFINE FIELD updated_by ON TABLE ticket TYPE string;
DEFINE FIELD created_at ON TABLE ticket TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE ticket TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_ticket_provider ON TABLE ticket \
    COLUMNS support_provider;
DEFINE INDEX idx_ticket_site ON TABLE ticket COLUMNS site_name;

DEFINE TABLE reply SCHEMAFULL;
DEFINE FIELD ticket_id ON TABLE reply TYPE string;
DEFINE FIELD sender ON TABLE reply TYPE string;
DEFINE FIELD sender_full_name ON TABLE reply TYPE option<string>;
DEFINE FIELD recipients ON TABLE reply TYPE option<string>;
DEFINE FIELD subject ON TABLE reply TYPE string;
DEFINE FIELD content ON TABLE reply TYPE string;
DEFINE FIELD direction ON TABLE reply TYPE string \
    ASSERT $value IN ['Sent', 'Received'];
DEFINE FIELD seen ON TABLE reply TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE reply TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_reply_ticket ON TABLE reply COLUMNS ticket_id;

DEFINE TABLE comment SCHEMAFULL;
DEFINE FIELD target ON TABLE comment TYPE string \
    ASSERT $value IN ['Ticket', 'Site'];
DEFINE FIELD reference_name ON TABLE comment TYPE string;
DEFINE FIELD content ON TABLE comment TYPE string;
DEFINE FIELD comment_email ON TABLE comment TYPE option<string>;
DEFINE FIELD created_at ON TABLE comment TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_comment_reference ON TABLE comment \
    COLUMNS target, reference_name;
";

// -----------------------------------------------------------------------
// Schema v2: automatic assignment
// -----------------------------------------------------------------------

const SCHEMA_V2: &str = "\
DEFINE TABLE assignment_rule SCHEMAFULL;
DEFINE FIELD name ON TABLE assignment_rule TYPE string;
DEFINE FIELD support_provider ON TABLE assignment_rule TYPE string;
DEFINE FIELD team_id ON TABLE assignment_rule TYPE string;
DEFINE FIELD users ON TABLE assignment_rule TYPE array DEFAULT [];
DEFINE FIELD users.* ON TABLE assignment_rule TYPE string;
DEFINE FIELD last_assigned ON TABLE assignment_rule TYPE option<string>;
DEFINE FIELD disabled ON TABLE assignment_rule TYPE bool DEFAULT false;
DEFINE FIELD updated_by ON TABLE assignment_rule TYPE string;
DEFINE FIELD created_at ON TABLE assignment_rule TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE assignment_rule TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_rule_name ON TABLE assignment_rule \
    COLUMNS name UNIQUE;
DEFINE INDEX idx_rule_provider ON TABLE assignment_rule \
    COLUMNS support_provider;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies each
/// migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "Migration v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

        info!(version = migration.version, "Migration applied");
    }

    Ok(())
}

/// Latest schema version known to this build.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}
