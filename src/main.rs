//! workspace-db CLI - manage and serve an embedded workspace store

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use workspace_db::config::{self, AppConfig};
use workspace_db::output::{emit_json, OutputMode};
use workspace_db::storage::{Gateway, StoreConfig, StoreInitializer};
use workspace_db::ui::{self, Icons};
use workspace_db::{Introspector, User, WorkspaceData};

#[derive(Parser)]
#[command(name = "workspace-db")]
#[command(version)]
#[command(about = "Embedded object store for users and workspace graphs")]
#[command(long_about = r#"
workspace-db keeps users and workspace graphs in an embedded store and
serves them over HTTP.

Example usage:
  workspace-db init
  workspace-db status
  workspace-db serve --port 5000
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print machine-readable JSON instead of human output
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the store (overrides config)
    #[arg(long, global = true)]
    base_path: Option<String>,

    /// Store name (overrides config)
    #[arg(long, global = true)]
    store: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API (and the static web page, if present)
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory of static files served at /
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Create and seed the store
    Init {
        /// Delete any existing store first
        #[arg(long)]
        recreate: bool,
    },

    /// Delete the store directory
    Delete,

    /// Show whether the store exists and what it holds
    Status,

    /// List all users
    Users,

    /// Show the first saved workspace
    Workspace,

    /// Show registered types and stored data
    Schema {
        /// Show a single type (case-insensitive)
        #[arg(short = 't', long = "type")]
        type_name: Option<String>,

        /// Include counts and samples per type
        #[arg(long)]
        structure: bool,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = OutputMode::from_flag(cli.json);
    let mut app_config = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    if let Some(base_path) = cli.base_path {
        app_config.base_path = Some(base_path);
    }
    if let Some(store) = cli.store {
        app_config.store_name = Some(store);
    }
    let store_config = app_config.store_config();

    match cli.command {
        Commands::Serve { port, static_dir } => {
            let port = port.unwrap_or_else(|| app_config.port());
            let static_dir = static_dir.unwrap_or_else(|| app_config.static_dir());
            tracing::info!("Serving store {:?} on port {}", store_config.store_dir(), port);
            workspace_db::server::start_server(port, store_config, static_dir).await?;
        }

        Commands::Init { recreate } => run_init(output_mode, store_config, recreate)?,

        Commands::Delete => {
            let initializer = StoreInitializer::new(store_config);
            let deleted = initializer.delete()?;
            if output_mode.is_human() {
                if deleted {
                    ui::header(Icons::DEL, &format!("Deleted store at {}", initializer.path().display()));
                } else {
                    ui::info("Nothing to delete", &initializer.path().display().to_string());
                }
            } else {
                emit_json("delete", &serde_json::json!({ "deleted": deleted }))?;
            }
        }

        Commands::Status => run_status(output_mode, store_config)?,

        Commands::Users => {
            let users: Vec<User> = Gateway::new(store_config).get_all()?;
            if output_mode.is_human() {
                ui::header(Icons::PERSON, &format!("{} user(s)", users.len()));
                for user in users {
                    ui::item(Icons::PERSON, &format!("#{} {} ({})", user.id, user.name, user.role));
                }
            } else {
                emit_json("users", &users)?;
            }
        }

        Commands::Workspace => {
            let workspace: Option<WorkspaceData> = Gateway::new(store_config).get_first()?;
            match (output_mode, workspace) {
                (OutputMode::Json, workspace) => emit_json("workspace", &workspace)?,
                (OutputMode::Human, None) => println!("{} No workspace data found.", Icons::EMPTY),
                (OutputMode::Human, Some(workspace)) => print_workspace(&workspace),
            }
        }

        Commands::Schema { type_name, structure } => {
            run_schema(output_mode, store_config, type_name.as_deref(), structure)?
        }

        Commands::Config { action: ConfigAction::Init { force } } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            config::write_config(&path, &AppConfig::starter(), force)?;
            if output_mode.is_human() {
                ui::success(&format!("Wrote {}", path.display()));
            } else {
                emit_json("config", &serde_json::json!({ "path": path }))?;
            }
        }
    }

    Ok(())
}

fn run_init(output_mode: OutputMode, store_config: StoreConfig, recreate: bool) -> anyhow::Result<()> {
    let initializer = StoreInitializer::new(store_config);
    let outcome = initializer.initialize(recreate)?;

    if output_mode.is_human() {
        ui::header(Icons::DATABASE, &format!("Store at {}", initializer.path().display()));
        if outcome.recreated {
            ui::summary_row("Recreated:", "previous store deleted");
        }
        ui::summary_row("Seeded:", if outcome.seeded { "yes" } else { "no (already has users)" });
        ui::success("Store initialized");
    } else {
        emit_json("init", &outcome)?;
    }
    Ok(())
}

fn run_status(output_mode: OutputMode, store_config: StoreConfig) -> anyhow::Result<()> {
    let status = Gateway::new(store_config).status();
    if !output_mode.is_human() {
        return emit_json("status", &status);
    }

    ui::header(Icons::STATS, &format!("Store status ({})", status.path));
    ui::summary_row("Directory:", if status.directory_exists { "present" } else { "absent" });
    ui::summary_row("Data files:", if status.has_data_files { "present" } else { "none" });
    ui::summary_row("Initialized:", if status.initialized { "yes" } else { "no" });
    if let Some(error) = &status.error {
        ui::warn(error);
    }
    if let Some(counts) = &status.counts {
        println!("{}", ui::count_table(counts.iter().map(|(name, count)| (*name, *count))));
    }
    Ok(())
}

fn run_schema(
    output_mode: OutputMode,
    store_config: StoreConfig,
    type_name: Option<&str>,
    structure: bool,
) -> anyhow::Result<()> {
    let introspector = Introspector::new(store_config);

    if let Some(name) = type_name {
        let schema = introspector.require_type_schema(name)?;
        if output_mode.is_human() {
            ui::header(Icons::SQUARE, schema.descriptor.full_name);
            println!("{}", ui::property_table(schema.descriptor.properties));
        } else {
            emit_json("schema", &schema)?;
        }
        return Ok(());
    }

    if structure {
        let samples = introspector.data_structure();
        if output_mode.is_human() {
            ui::header(Icons::MAG, "Data structure");
            println!("{}", ui::count_table(samples.values().map(|s| (s.type_name, s.count))));
            for sample in samples.values().filter(|s| s.error.is_some()) {
                ui::warn(&format!("{}: {}", sample.type_name, sample.error.as_deref().unwrap_or_default()));
            }
        } else {
            emit_json("structure", &samples)?;
        }
        return Ok(());
    }

    let schema = introspector.database_schema();
    if !output_mode.is_human() {
        return emit_json("schema", &schema);
    }
    ui::header(Icons::PACKAGE, &format!("Database schema ({})", schema.database_path));
    for descriptor in &schema.registered_types {
        ui::section(descriptor.type_name);
        println!("{}", ui::property_table(descriptor.properties));
    }
    ui::section("Statistics");
    println!("{}", ui::count_table(schema.statistics.counts.iter().map(|(name, count)| (*name, *count))));
    if let Some(error) = &schema.statistics.error {
        ui::warn(error);
    }
    Ok(())
}

fn print_workspace(workspace: &WorkspaceData) {
    ui::header(Icons::PACKAGE, &workspace.title);
    ui::summary_row("Method:", &workspace.method_name);
    ui::summary_row("Workspace:", &workspace.workspace);
    ui::summary_row("Version:", &workspace.version);
    ui::summary_row("Saved at:", &workspace.saved_at.to_rfc3339());

    ui::section("Objects");
    for object in &workspace.objects {
        ui::item(
            Icons::SQUARE,
            &format!("{} [{}] at ({}, {})", object.name, object.kind, object.position.x, object.position.y),
        );
    }
    ui::section("Relationships");
    for relationship in &workspace.relationships {
        ui::item(Icons::LINK, &format!("{} -> {}", relationship.from, relationship.to));
    }
    for dangling in workspace.dangling_relationships() {
        ui::warn(&format!("dangling relationship {} -> {}", dangling.from, dangling.to));
    }
}
