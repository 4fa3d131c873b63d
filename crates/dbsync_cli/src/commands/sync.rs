//! Sync command implementation.

use dbsync_engine::{
    AlwaysConfirm, Confirm, ConnectionConfig, ModelOrder, RunPlan, Side, SyncConfig, SyncDirection,
    SyncEngine, SyncError, UrlConnector,
};
use std::io::{self, BufRead, Write};
use tracing::info;

/// Options collected from the command line and environment.
#[derive(Debug)]
pub struct SyncOptions {
    /// Direction of the run.
    pub direction: SyncDirection,
    /// Simulate writes.
    pub dry_run: bool,
    /// Skip the confirmation prompt.
    pub force: bool,
    /// Source connection string.
    pub source_url: Option<String>,
    /// Target connection string.
    pub target_url: Option<String>,
    /// Subset of models, empty for all.
    pub models: Vec<String>,
}

/// Asks on the terminal before a live run.
struct PromptConfirm;

impl Confirm for PromptConfirm {
    fn confirm(&self, plan: &RunPlan<'_>) -> bool {
        let sides: Vec<&str> = plan
            .written_sides()
            .into_iter()
            .map(|side| match side {
                Side::Source => "the Neon database",
                Side::Target => "the local database",
            })
            .collect();
        println!(
            "This will write to {} ({} models: {}).",
            sides.join(" and "),
            plan.models.len(),
            plan.models.names().join(", ")
        );
        print!("Continue? [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(_) => false,
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Builds the engine configuration from the options.
fn build_config(options: &SyncOptions) -> Result<(SyncConfig, ConnectionConfig), SyncError> {
    let source_url = options
        .source_url
        .clone()
        .ok_or_else(|| SyncError::config("NEON_DATABASE_URL is not set (or pass --source-url)"))?;
    let target_url = options
        .target_url
        .clone()
        .ok_or_else(|| SyncError::config("LOCAL_DATABASE_URL is not set (or pass --target-url)"))?;

    let mut config = SyncConfig::new(options.direction).with_dry_run(options.dry_run);
    if !options.models.is_empty() {
        config = config.with_models(ModelOrder::default_order().select(&options.models)?);
    }
    Ok((config, ConnectionConfig::new(source_url, target_url)))
}

/// Runs the sync command.
pub fn run(options: SyncOptions) -> Result<(), Box<dyn std::error::Error>> {
    if options.force {
        run_with(&options, &AlwaysConfirm)
    } else {
        run_with(&options, &PromptConfirm)
    }
}

fn run_with(
    options: &SyncOptions,
    confirm: &dyn Confirm,
) -> Result<(), Box<dyn std::error::Error>> {
    let (config, connections) = build_config(options)?;

    info!(
        "Syncing {} ({})",
        config.direction,
        config.direction.describe()
    );
    if config.dry_run {
        info!("Dry run - no changes will be made");
    }

    let engine = SyncEngine::new(config, connections, UrlConnector);
    match engine.run_with_confirmation(confirm) {
        Ok(report) => {
            println!();
            println!("{report}");
            Ok(())
        }
        Err(SyncError::Cancelled) => {
            info!("Sync cancelled, nothing was written");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
