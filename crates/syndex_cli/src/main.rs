//! Syndex CLI
//!
//! Command-line tools for keeping a search index convergent with a
//! canonical document source.
//!
//! # Commands
//!
//! - `ping` - Check that the document store is reachable
//! - `ensure-index` - Create an index from a settings file if missing
//! - `sync` - Sync a JSON-lines file of documents into an index
//! - `exists` - Resolve existence for a batch of document ids
//! - `latest` - Print ingestion cursors (largest id, latest field value)
//! - `count` - Count documents matching a field value
//! - `get` / `delete` - Single-document passthroughs

mod client;
mod commands;

use clap::{Parser, Subcommand};
use client::ReqwestClient;
use std::path::PathBuf;
use std::time::Duration;
use syndex_engine::{RestStore, StoreConfig, SyncEngine};
use tracing_subscriber::EnvFilter;

/// Syndex command-line document sync tools.
#[derive(Parser)]
#[command(name = "syndex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the document store
    #[arg(global = true, short, long, default_value = "http://localhost:9200")]
    url: String,

    /// Request timeout in seconds
    #[arg(global = true, long, default_value = "30")]
    timeout: u64,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the document store is reachable
    Ping,

    /// Create an index from a settings file if it does not exist
    EnsureIndex {
        /// Target index name
        index: String,

        /// Path to the JSON settings file
        #[arg(short, long)]
        settings: PathBuf,
    },

    /// Sync a file of documents (one JSON object per line) into an index
    Sync {
        /// Target index name
        index: String,

        /// Path to the JSON-lines file
        file: PathBuf,
    },

    /// Resolve existence for a batch of document ids
    Exists {
        /// Target index name
        index: String,

        /// Document ids to check
        ids: Vec<String>,
    },

    /// Print ingestion cursors for an index
    Latest {
        /// Target index name
        index: String,

        /// Also report the most recent value of this field
        #[arg(short, long)]
        field: Option<String>,
    },

    /// Count documents whose field matches a value
    Count {
        /// Target index name
        index: String,

        /// Field to match
        field: String,

        /// Value to match (JSON or bare string)
        value: String,
    },

    /// Fetch a single document
    Get {
        /// Target index name
        index: String,

        /// Document id
        id: String,
    },

    /// Delete a single document
    Delete {
        /// Target index name
        index: String,

        /// Document id
        id: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = StoreConfig::new(cli.url).with_timeout(Duration::from_secs(cli.timeout));
    let client = ReqwestClient::new(config.timeout)?;
    let engine = SyncEngine::new(RestStore::new(config.base_url, client));

    match cli.command {
        Commands::Ping => commands::ping::run(engine.store())?,
        Commands::EnsureIndex { index, settings } => {
            commands::ensure_index::run(engine.store(), &index, &settings)?;
        }
        Commands::Sync { index, file } => commands::sync::run(&engine, &index, &file)?,
        Commands::Exists { index, ids } => commands::exists::run(&engine, &index, &ids)?,
        Commands::Latest { index, field } => {
            commands::latest::run(&engine, &index, field.as_deref())?;
        }
        Commands::Count {
            index,
            field,
            value,
        } => commands::count::run(&engine, &index, &field, &value)?,
        Commands::Get { index, id } => commands::get::run(&engine, &index, &id)?,
        Commands::Delete { index, id } => commands::delete::run(&engine, &index, &id)?,
        Commands::Version => {
            println!("Syndex CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
