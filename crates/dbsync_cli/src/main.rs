//! dbsync CLI
//!
//! Synchronizes the records of a fixed set of models between the Neon
//! database (source) and a local database (target).
//!
//! # Directions
//!
//! - `neon-to-local` - Mirror every source record into the target
//! - `local-to-neon` - Mirror every target record into the source
//! - `both-ways` - Merge both sides, newest `updated_at` wins

mod commands;

use clap::{Parser, ValueEnum};
use dbsync_engine::SyncDirection;
use tracing_subscriber::EnvFilter;

/// Which way records flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Direction {
    /// Copy Neon records into the local database
    NeonToLocal,
    /// Copy local records into Neon
    LocalToNeon,
    /// Merge both databases, last write wins
    BothWays,
}

impl From<Direction> for SyncDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::NeonToLocal => SyncDirection::PushToTarget,
            Direction::LocalToNeon => SyncDirection::PullFromSource,
            Direction::BothWays => SyncDirection::BidirectionalMerge,
        }
    }
}

/// Synchronize records between the Neon and local databases.
#[derive(Parser)]
#[command(name = "dbsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Sync direction
    #[arg(value_enum)]
    direction: Direction,

    /// Show what would be written without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    force: bool,

    /// Source (Neon) connection string
    #[arg(long, env = "NEON_DATABASE_URL", hide_env_values = true)]
    source_url: Option<String>,

    /// Target (local) connection string
    #[arg(long, env = "LOCAL_DATABASE_URL", hide_env_values = true)]
    target_url: Option<String>,

    /// Only sync these models (comma separated, default order is kept)
    #[arg(short, long, value_delimiter = ',')]
    models: Vec<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let options = commands::sync::SyncOptions {
        direction: cli.direction.into(),
        dry_run: cli.dry_run,
        force: cli.force,
        source_url: cli.source_url,
        target_url: cli.target_url,
        models: cli.models,
    };
    commands::sync::run(options)?;

    Ok(())
}
