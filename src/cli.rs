use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::client::PlatformClient;
use crate::load_config::load_config;
use crate::retry::RetryPolicy;
use crate::schema::discount_code_schema;
use crate::sync::{self, CodeOutcome, SyncOptions, SyncReport};

/// CLI for promo-sync: declarative discount code management.
#[derive(Parser)]
#[clap(
    name = "promo-sync",
    version,
    about = "Declare discount codes in YAML and reconcile the commerce platform to match"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show what apply would change, without touching anything
    Plan {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Also plan deletion of remote codes that are not declared
        #[clap(long)]
        prune: bool,
    },
    /// Create, update and (with --prune) delete codes to match the config
    Apply {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Delete remote codes that are not declared
        #[clap(long)]
        prune: bool,
    },
    /// Delete every code declared in the config from the platform
    Destroy {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Print the discount code field schema as YAML
    Schema,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Plan { config, prune } => {
            let config = load_config(config)?;
            config.trace_loaded();
            let client = PlatformClient::new(&config.platform)?;
            let plan = sync::plan(&client, &config.discount_codes, &SyncOptions { prune }).await?;
            print!("{}", plan.render());
            Ok(())
        }
        Commands::Apply { config, prune } => {
            let config = load_config(config)?;
            config.trace_loaded();
            let client = PlatformClient::new(&config.platform)?;
            println!("Apply starting...");
            let report = sync::apply(
                &client,
                &RetryPolicy::default(),
                &config.discount_codes,
                &SyncOptions { prune },
            )
            .await?;
            println!("Apply complete: {}.", report.summary_line());
            finish(report, "apply")
        }
        Commands::Destroy { config } => {
            let config = load_config(config)?;
            config.trace_loaded();
            let client = PlatformClient::new(&config.platform)?;
            println!("Destroy starting...");
            let report = sync::destroy(&client, &config.discount_codes).await?;
            println!("Destroy complete: {}.", report.summary_line());
            finish(report, "destroy")
        }
        Commands::Schema => {
            let yaml = serde_yaml::to_string(&discount_code_schema())?;
            print!("{yaml}");
            Ok(())
        }
    }
}

/// Surface per-code failures on stderr and turn them into a non-zero exit.
fn finish(report: SyncReport, verb: &str) -> Result<()> {
    if report.is_success() {
        return Ok(());
    }
    for entry in &report.outcomes {
        if let CodeOutcome::Failed { error } = &entry.outcome {
            eprintln!("[ERROR] {}: {}", entry.code, error);
        }
    }
    anyhow::bail!("{verb} finished with {} failure(s)", report.failed())
}
