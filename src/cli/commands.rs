//! CLI commands and argument parsing
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, their arguments, and command execution.

use crate::config::{Config, CONNECTION_STRING_ENV};
use crate::error::Result;
use crate::lifecycle::{self, LifecycleDriver};
use crate::storage::client::ContainerClientExt;
use crate::storage::{self as store, AzureContainerService, ContainerItem, ContainerService, ListContainersOptions};
use clap::{Parser, Subcommand};
use futures::TryStreamExt;
use std::sync::Arc;
use tabled::{settings::Style, Table, Tabled};
use tracing::{debug, info};

/// Get the full version string with build information
fn get_version() -> &'static str {
    env!("VERSION_WITH_GIT")
}

/// Get build information for display
pub fn get_build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: env!("GIT_HASH"),
        git_branch: env!("GIT_BRANCH"),
    }
}

#[derive(Debug)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub git_branch: &'static str,
}

#[derive(Parser)]
#[command(name = "cdel")]
#[command(about = "Create, delete, soft-delete and undelete Azure Blob Storage containers")]
#[command(version = get_version(), author)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Storage account connection string
    #[arg(
        long,
        global = true,
        value_name = "CONNECTION_STRING",
        env = CONNECTION_STRING_ENV,
        hide_env_values = true
    )]
    pub connection_string: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the full container lifecycle sequence (default)
    Run {
        /// Base name of the containers to create
        #[arg(long)]
        base: Option<String>,
        /// Number of containers to create
        #[arg(long)]
        count: Option<usize>,
        /// Prefix of the containers removed by the bulk delete
        #[arg(long)]
        prefix: Option<String>,
        /// Seconds to wait for soft delete to settle
        #[arg(long)]
        wait_secs: Option<u64>,
    },
    /// Create containers with container-level public access
    Create {
        /// Container names
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Delete a container through the account client
    Delete {
        /// Container name
        name: String,
    },
    /// Delete a container through its container client
    SoftDelete {
        /// Container name
        name: String,
    },
    /// Delete every live container whose name starts with a prefix
    DeletePrefix {
        /// Container name prefix
        prefix: String,
    },
    /// Restore the most recent soft-deleted version of a container
    Undelete {
        /// Container name
        name: String,
        /// Restore under a different name
        #[arg(long)]
        new_name: Option<String>,
    },
    /// List containers (alias: ls)
    #[command(alias = "ls")]
    List {
        /// Only containers whose name starts with this prefix
        #[arg(short, long)]
        prefix: Option<String>,
        /// Include soft-deleted containers
        #[arg(long)]
        include_deleted: bool,
        /// Include system containers
        #[arg(long)]
        include_system: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Show detailed version and build information
    Version,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Show the configuration file path
    Path,
}

impl Commands {
    /// Whether this command talks to the storage account
    pub fn needs_storage(&self) -> bool {
        !matches!(self, Commands::Config { .. } | Commands::Version)
    }

    /// Whether success is reported with a final `done` line
    pub fn reports_done(&self) -> bool {
        !matches!(
            self,
            Commands::List { .. } | Commands::Config { .. } | Commands::Version
        )
    }
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Run {
            base: None,
            count: None,
            prefix: None,
            wait_secs: None,
        }
    }
}

impl Cli {
    /// The command to run; `run` when none was given
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or_default()
    }

    /// Apply global flags on top of the loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if self.debug {
            config.debug = true;
        }
        if let Some(connection_string) = &self.connection_string {
            config.connection_string = Some(connection_string.clone());
        }
    }

    pub async fn execute(self, mut config: Config) -> Result<()> {
        self.apply_to(&mut config);
        let command = self.command();

        if command.needs_storage() {
            let service = create_service(&config)?;
            return execute_storage_command(command, service, config).await;
        }

        match command {
            Commands::Config { command } => execute_config_command(command, &config).await,
            _ => execute_version_command(),
        }
    }
}

/// Build the storage account client from validated configuration
pub fn create_service(config: &Config) -> Result<Arc<dyn ContainerService>> {
    let connection_string = config.require_connection_string()?;
    let service = AzureContainerService::from_connection_string(connection_string)?;
    Ok(Arc::new(service))
}

/// Execute a command that talks to the storage account
pub async fn execute_storage_command(
    command: Commands,
    service: Arc<dyn ContainerService>,
    mut config: Config,
) -> Result<()> {
    debug!(?command, "Executing command");

    match command {
        Commands::Run {
            base,
            count,
            prefix,
            wait_secs,
        } => {
            if let Some(base) = base {
                config.base_name = base;
            }
            if let Some(count) = count {
                config.container_count = count;
            }
            if let Some(prefix) = prefix {
                config.delete_prefix = prefix;
            }
            if let Some(wait_secs) = wait_secs {
                config.soft_delete_wait_secs = wait_secs;
            }

            let driver = LifecycleDriver::new(service, config.driver_settings());
            let summary = driver.run().await?;
            info!(
                created = summary.created.len(),
                deleted_by_prefix = summary.deleted_by_prefix.len(),
                undeleted = %summary.undeleted,
                "Lifecycle run complete"
            );
        }
        Commands::Create { names } => {
            for name in names {
                lifecycle::create_container(&service, &name).await?;
            }
        }
        Commands::Delete { name } => {
            lifecycle::delete_container_immediately(&service, &name).await?;
        }
        Commands::SoftDelete { name } => {
            let container_client = service.container_client(&name);
            lifecycle::delete_container_soft(&container_client).await?;
        }
        Commands::DeletePrefix { prefix } => {
            let deleted = lifecycle::delete_containers_with_prefix(&service, &prefix).await?;
            info!(count = deleted.len(), prefix = %prefix, "Deleted containers by prefix");
        }
        Commands::Undelete { name, new_name } => {
            lifecycle::undelete_container(&service, &name, new_name.as_deref()).await?;
        }
        Commands::List {
            prefix,
            include_deleted,
            include_system,
            json,
        } => {
            let options = ListContainersOptions {
                prefix,
                include_deleted,
                include_system,
                ..Default::default()
            };
            let items: Vec<ContainerItem> = store::list_containers(service, options)
                .try_collect()
                .await?;
            println!("{}", format_container_list(&items, json)?);
        }
        Commands::Config { command } => execute_config_command(command, &config).await?,
        Commands::Version => execute_version_command()?,
    }

    Ok(())
}

#[derive(Tabled)]
struct ContainerRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Last Modified")]
    last_modified: String,
    #[tabled(rename = "Retention Days")]
    retention_days: String,
}

impl From<&ContainerItem> for ContainerRow {
    fn from(item: &ContainerItem) -> Self {
        Self {
            name: item.name.clone(),
            state: if item.deleted { "deleted" } else { "active" }.to_string(),
            version: item.version.clone().unwrap_or_default(),
            last_modified: item
                .last_modified
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            retention_days: item
                .remaining_retention_days
                .map(|d| d.to_string())
                .unwrap_or_default(),
        }
    }
}

/// Render a container listing as a table or JSON
pub fn format_container_list(items: &[ContainerItem], json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(items)?);
    }

    if items.is_empty() {
        return Ok("No containers found".to_string());
    }

    let rows: Vec<ContainerRow> = items.iter().map(ContainerRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    Ok(table.to_string())
}

async fn execute_config_command(command: ConfigCommands, config: &Config) -> Result<()> {
    match command {
        ConfigCommands::Show => execute_config_show(config),
        ConfigCommands::Path => execute_config_path(),
    }
}

fn execute_config_show(config: &Config) -> Result<()> {
    #[derive(Tabled)]
    struct ConfigItem {
        #[tabled(rename = "Setting")]
        key: &'static str,
        #[tabled(rename = "Value")]
        value: String,
    }

    let items = vec![
        ConfigItem {
            key: "debug",
            value: config.debug.to_string(),
        },
        ConfigItem {
            key: "connection_string",
            value: if config.connection_string.is_some() {
                "<set>".to_string()
            } else {
                "<not set>".to_string()
            },
        },
        ConfigItem {
            key: "base_name",
            value: config.base_name.clone(),
        },
        ConfigItem {
            key: "container_count",
            value: config.container_count.to_string(),
        },
        ConfigItem {
            key: "delete_prefix",
            value: config.delete_prefix.clone(),
        },
        ConfigItem {
            key: "soft_delete_wait_secs",
            value: config.soft_delete_wait_secs.to_string(),
        },
    ];

    let mut table = Table::new(items);
    table.with(Style::rounded());
    println!("{table}");

    Ok(())
}

fn execute_config_path() -> Result<()> {
    let config_path = Config::get_config_path()?;
    println!("{}", config_path.display());
    Ok(())
}

fn execute_version_command() -> Result<()> {
    let build_info = get_build_info();

    println!("cdel container lifecycle CLI");
    println!("============================");
    println!("Version:      {}", build_info.version);
    println!("Git Hash:     {}", build_info.git_hash);
    println!("Git Branch:   {}", build_info.git_branch);

    Ok(())
}
