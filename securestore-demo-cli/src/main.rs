//! SecureStore Demo CLI
//!
//! Command-line interface for trying out SecureStore against the platform
//! keychain (or process memory with `--memory`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use securestore_lib::backend::PlatformBackend;
use securestore_lib::{SecureStore, StoreConfig};

mod commands;
mod ui;

#[derive(Parser)]
#[command(name = "securestore-demo")]
#[command(about = "SecureStore Demo CLI - namespaced, validated secure storage", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Keychain service (can also be set via SECURESTORE_SERVICE env var)
    #[arg(long, global = true)]
    service: Option<String>,

    /// Namespace for keys (can also be set via SECURESTORE_NAMESPACE env var)
    #[arg(short, long, global = true)]
    namespace: Option<String>,

    /// Keep items in process memory instead of the OS keychain
    #[arg(long, global = true)]
    memory: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a value
    Set {
        /// Key to store under
        key: String,

        /// Value to store
        value: String,

        /// Parse VALUE as JSON instead of storing it as a string
        #[arg(long)]
        json: bool,

        /// Delete the value again after this many milliseconds
        #[arg(long)]
        ttl_ms: Option<u64>,

        /// Wait for the expiration to run before exiting
        #[arg(long, requires = "ttl_ms")]
        wait: bool,
    },

    /// Read a value
    Get {
        /// Key to read
        key: String,

        /// Value printed when the key is missing or invalid
        #[arg(short, long)]
        fallback: Option<String>,

        /// Expected type of the value
        #[arg(long = "as", value_enum, default_value_t = ValueKind::String)]
        kind: ValueKind,
    },

    /// Check whether a key exists
    Exists {
        /// Key to check
        key: String,
    },

    /// Remove a value
    Remove {
        /// Key to remove
        key: String,
    },

    /// Show store and backend information
    Info,
}

/// Expected type for `get`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ValueKind {
    String,
    Number,
    Bool,
    Json,
}

fn open_store(cli: &Cli) -> Result<SecureStore<PlatformBackend>> {
    let mut config = StoreConfig::from_env().context("Invalid SECURESTORE_* environment")?;

    if let Some(service) = &cli.service {
        config = config.with_service(service.clone());
    }
    if let Some(namespace) = &cli.namespace {
        config = config.with_namespace(namespace.clone());
    }
    if cli.memory {
        config = config.with_fallback_only();
    }

    tracing::debug!(?config, "opening store");
    Ok(SecureStore::from_config(config.platform_backend(), &config)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("securestore_demo_cli=debug,securestore_lib=debug")
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("securestore_demo_cli=info,securestore_lib=error")
            .with_writer(std::io::stderr)
            .init();
    }

    let store = open_store(&cli)?;

    // Dispatch commands
    match cli.command {
        Commands::Set {
            key,
            value,
            json,
            ttl_ms,
            wait,
        } => {
            commands::set::run(&store, &key, &value, json, ttl_ms, wait).await?;
        }
        Commands::Get {
            key,
            fallback,
            kind,
        } => {
            commands::get::run(&store, &key, fallback.as_deref(), kind).await?;
        }
        Commands::Exists { key } => {
            commands::exists::run(&store, &key).await?;
        }
        Commands::Remove { key } => {
            commands::remove::run(&store, &key).await?;
        }
        Commands::Info => {
            commands::info::run(&store, cli.verbose).await?;
        }
    }

    Ok(())
}
