//! Operator command line for the support portal.
//!
//! ```bash
//! support migrate
//! support add-provider --name Helpers
//! support add-team --provider Helpers --name "Tier 1"
//! support add-member --team <TEAM_ID> --email agent@helpers.io --name "Ada Agent"
//! support add-site --name acme.example.com --provider Helpers
//! support link-site-user --site acme.example.com --email alice@acme.example.com
//! support issue-key --email alice@acme.example.com
//! support validate-key --key <KEY> --agent
//! support tickets --key <KEY> --status all --search printer
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use support_core::models::ticket::StatusFilter;
use support_core::repository::Repositories;
use support_db::repository::SurrealRepositories;
use support_db::{DbConfig, DbManager};
use support_portal::customer::TicketQuery;
use support_portal::{
    AdminConsole, AgentPortal, CustomerPortal, LogMailer, PortalConfig, SessionRegistry,
};
use surrealdb::engine::any::Any;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

type Repos = SurrealRepositories<Any>;

#[derive(Parser)]
#[command(name = "support", about = "Operate the support portal store", version)]
struct Cli {
    #[command(flatten)]
    db: DbArgs,

    #[command(flatten)]
    portal: PortalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct DbArgs {
    /// SurrealDB endpoint: `ws://host:port`, bare `host:port`, or `mem://`
    #[arg(long, env = "SUPPORT_DB_URL", default_value = "127.0.0.1:8000")]
    db_url: String,

    #[arg(long, env = "SUPPORT_DB_NAMESPACE", default_value = "support")]
    db_namespace: String,

    #[arg(long, env = "SUPPORT_DB_DATABASE", default_value = "portal")]
    db_database: String,

    #[arg(long, env = "SUPPORT_DB_USERNAME", default_value = "root")]
    db_username: String,

    #[arg(long, env = "SUPPORT_DB_PASSWORD", default_value = "root", hide_env_values = true)]
    db_password: String,

    /// Apply pending migrations before running the command
    #[arg(long, env = "SUPPORT_DB_MIGRATE")]
    db_migrate: bool,
}

impl From<DbArgs> for DbConfig {
    fn from(args: DbArgs) -> Self {
        let mut config = DbConfig {
            endpoint: args.db_url,
            namespace: args.db_namespace,
            database: args.db_database,
            username: args.db_username,
            password: args.db_password,
            migrate: args.db_migrate,
        };
        // An embedded store starts empty on every run.
        config.migrate |= config.is_embedded();
        config
    }
}

#[derive(clap::Args)]
struct PortalArgs {
    /// Public origin used in mailed links
    #[arg(long, env = "SUPPORT_BASE_URL")]
    base_url: Option<String>,

    /// Suppress all outgoing mail
    #[arg(long, env = "SUPPORT_DEVELOPER_MODE")]
    developer_mode: bool,
}

impl From<PortalArgs> for PortalConfig {
    fn from(args: PortalArgs) -> Self {
        let defaults = PortalConfig::default();
        PortalConfig {
            base_url: args.base_url.unwrap_or(defaults.base_url),
            developer_mode: args.developer_mode,
            ..defaults
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending schema migrations
    Migrate,

    /// Create a support provider
    AddProvider {
        #[arg(long)]
        name: String,
    },

    /// Create a team under an existing provider
    AddTeam {
        #[arg(long)]
        provider: String,

        #[arg(long)]
        name: String,
    },

    /// Add an agent to a team
    AddMember {
        #[arg(long)]
        team: Uuid,

        #[arg(long)]
        email: String,

        #[arg(long, default_value = "")]
        name: String,
    },

    /// Register a supported site
    AddSite {
        #[arg(long)]
        name: String,

        #[arg(long)]
        provider: Option<String>,
    },

    /// Link a customer to a site, re-enabling a disabled link
    LinkSiteUser {
        #[arg(long)]
        site: String,

        #[arg(long)]
        email: String,
    },

    /// Disable a customer's site link
    DisableSiteUser {
        #[arg(long)]
        site: String,

        #[arg(long)]
        email: String,

        /// Re-enable the link instead
        #[arg(long)]
        enable: bool,
    },

    /// Issue (or reuse) a session key and mail the login link
    IssueKey {
        #[arg(long)]
        email: String,

        /// Issue an agent portal key instead of a customer one
        #[arg(long)]
        agent: bool,
    },

    /// Show the email a session key belongs to
    ValidateKey {
        #[arg(long)]
        key: String,

        #[arg(long)]
        agent: bool,
    },

    /// Revoke a single key, or every key of an email
    RevokeKey {
        #[arg(long, required_unless_present = "email", conflicts_with = "email")]
        key: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },

    /// List the tickets visible to a session key
    Tickets {
        #[arg(long)]
        key: String,

        #[arg(long)]
        agent: bool,

        #[arg(long, value_enum, default_value = "open")]
        status: StatusArg,

        #[arg(long)]
        search: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Open,
    Closed,
    All,
}

impl StatusArg {
    fn filter(self) -> StatusFilter {
        match self {
            StatusArg::Open => StatusFilter::Open,
            StatusArg::Closed => StatusFilter::Closed,
            StatusArg::All => StatusFilter::Any,
        }
    }

    fn open_or_close(self) -> &'static str {
        match self {
            StatusArg::Open => "Open",
            StatusArg::Closed => "Close",
            StatusArg::All => "All",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("support=info".parse()?))
        .json()
        .init();

    let cli = Cli::parse();
    let mut db_config = DbConfig::from(cli.db);
    db_config.migrate |= matches!(cli.command, Command::Migrate);
    let portal_config = PortalConfig::from(cli.portal);

    let manager = DbManager::connect(&db_config)
        .await
        .context("failed to open the support store")?;

    run(cli.command, &manager, portal_config).await
}

async fn run(command: Command, manager: &DbManager, config: PortalConfig) -> Result<()> {
    let repos: Repos = SurrealRepositories::new(manager.client().clone());

    match command {
        Command::Migrate => print_json(json!({ "schema_version": support_db::latest_version() })),

        Command::AddProvider { name } => {
            let provider = AdminConsole::new(repos).add_provider(&name).await?;
            print_json(serde_json::to_value(provider)?)
        }

        Command::AddTeam { provider, name } => {
            let team = AdminConsole::new(repos).add_team(&provider, &name).await?;
            print_json(serde_json::to_value(team)?)
        }

        Command::AddMember { team, email, name } => {
            let profile = AdminConsole::new(repos)
                .add_member(team, &email, &name)
                .await?;
            print_json(serde_json::to_value(profile)?)
        }

        Command::AddSite { name, provider } => {
            let site = AdminConsole::new(repos)
                .add_site(&name, provider.as_deref())
                .await?;
            print_json(serde_json::to_value(site)?)
        }

        Command::LinkSiteUser { site, email } => {
            let link = AdminConsole::new(repos).link_site_user(&site, &email).await?;
            print_json(serde_json::to_value(link)?)
        }

        Command::DisableSiteUser {
            site,
            email,
            enable,
        } => {
            let link = AdminConsole::new(repos)
                .set_site_user_disabled(&site, &email, !enable)
                .await?;
            print_json(serde_json::to_value(link)?)
        }

        Command::IssueKey { email, agent } => {
            if agent {
                AgentPortal::new(repos.clone(), LogMailer, config.clone())
                    .send_login_link(&email)
                    .await?;
            } else if !CustomerPortal::new(repos.clone(), LogMailer, config.clone())
                .send_session_key(&email)
                .await?
            {
                bail!("{email} is not linked to any site");
            }
            let key = SessionRegistry::new(repos.sessions(), &LogMailer, &config)
                .issue_or_reuse(&email)
                .await?;
            print_json(json!({ "email": email, "key": key }))
        }

        Command::ValidateKey { key, agent } => {
            let email = if agent {
                AgentPortal::new(repos, LogMailer, config)
                    .validate_session_key(&key)
                    .await?
            } else {
                CustomerPortal::new(repos, LogMailer, config)
                    .validate_session_key(&key)
                    .await?
            };
            print_json(json!({ "valid": email.is_some(), "email": email }))
        }

        Command::RevokeKey { key, email } => {
            let registry = SessionRegistry::new(repos.sessions(), &LogMailer, &config);
            let revoked = match (key, email) {
                (Some(key), _) => {
                    registry.revoke(&key).await?;
                    json!({ "revoked": "key" })
                }
                (None, Some(email)) => {
                    let removed = registry.revoke_all(&email).await?;
                    json!({ "revoked": removed, "email": email })
                }
                (None, None) => bail!("either --key or --email is required"),
            };
            print_json(revoked)
        }

        Command::Tickets {
            key,
            agent,
            status,
            search,
        } => {
            let tickets = if agent {
                AgentPortal::new(repos, LogMailer, config)
                    .list_tickets(&key, status.filter(), search)
                    .await?
            } else {
                CustomerPortal::new(repos, LogMailer, config)
                    .list_tickets(
                        &key,
                        TicketQuery {
                            open_or_close: status.open_or_close().into(),
                            search_text: search,
                        },
                    )
                    .await?
                    .tickets
            };
            print_json(serde_json::to_value(tickets)?)
        }
    }
}

fn print_json(value: serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
