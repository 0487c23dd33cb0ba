//! Orderguard CLI - validate order exports in CI
//!
//! ```bash
//! orderguard validate orders.csv              # Validate, write partitions, notify
//! orderguard validate orders.csv --no-notify  # Same, without the webhook
//! orderguard columns orders.csv -c rules.json # Whole-column checks only
//! orderguard schema                           # Print the effective configuration
//! orderguard serve                            # Start HTTP server (port 3000)
//! ```
//!
//! `validate` exits with 0 when every row is valid and 1 otherwise, so a
//! pipeline step fails on bad data. Operational errors also exit with 1.

use clap::{Parser, Subcommand};
use orderguard::{
    pipeline, read_dataset, run_column_checks, format_column_report,
    ChannelNotifier, PipelineConfig, RunOptions,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "orderguard")]
#[command(about = "Validate order exports against a declarative schema", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a dataset: partition rows, write outputs, report and notify
    Validate {
        /// Input CSV or JSON file
        input: PathBuf,

        /// JSON config file (default: built-in order schema)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output for valid rows (.csv or .json)
        #[arg(long, default_value = "data/valid_rows.csv")]
        valid_out: PathBuf,

        /// Output for invalid rows (.csv or .json)
        #[arg(long, default_value = "data/invalid_rows.csv")]
        invalid_out: PathBuf,

        /// Webhook URL (overrides SLACK_WEBHOOK_URL)
        #[arg(long)]
        webhook: Option<String>,

        /// Do not send the report
        #[arg(long)]
        no_notify: bool,

        /// Leave the per-rule histogram out of the report
        #[arg(long)]
        no_histogram: bool,

        /// Number of invalid rows shown in the report
        #[arg(long)]
        preview: Option<usize>,
    },

    /// Run only the configured column checks
    Columns {
        /// Input CSV or JSON file
        input: PathBuf,

        /// JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the effective configuration as JSON
    Schema {
        /// JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

type CliResult = Result<u8, Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate {
            input,
            config,
            valid_out,
            invalid_out,
            webhook,
            no_notify,
            no_histogram,
            preview,
        } => {
            let overrides = Overrides {
                webhook,
                no_notify,
                no_histogram,
                preview,
            };
            cmd_validate(&input, config.as_deref(), valid_out, invalid_out, overrides).await
        }

        Commands::Columns { input, config } => cmd_columns(&input, config.as_deref()),

        Commands::Schema { config } => cmd_schema(config.as_deref()),

        Commands::Serve { port, config } => cmd_serve(port, config.as_deref()).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Flags layered over the loaded configuration.
struct Overrides {
    webhook: Option<String>,
    no_notify: bool,
    no_histogram: bool,
    preview: Option<usize>,
}

impl Overrides {
    fn apply(self, config: &mut PipelineConfig) {
        if let Some(url) = self.webhook {
            config.webhook_url = Some(url);
        }
        if self.no_histogram {
            config.include_histogram = false;
        }
        if let Some(preview) = self.preview {
            config.preview_size = preview;
        }
    }
}

async fn cmd_validate(
    input: &Path,
    config_path: Option<&Path>,
    valid_out: PathBuf,
    invalid_out: PathBuf,
    overrides: Overrides,
) -> CliResult {
    let mut config = PipelineConfig::load(config_path)?;
    let notify = !overrides.no_notify;
    overrides.apply(&mut config);

    let notifier = ChannelNotifier::from_config(config.webhook_url.as_deref(), notify);
    if notify && !notifier.is_enabled() {
        eprintln!("   No webhook configured, skipping notification");
    }

    let options = RunOptions {
        valid_out: Some(valid_out),
        invalid_out: Some(invalid_out),
        notify: notifier.is_enabled(),
    };

    let outcome = pipeline::run(input, &config, &options, &notifier).await?;

    println!("\n{}", outcome.validated.report);

    Ok(u8::try_from(outcome.exit_code()).unwrap_or(1))
}

fn cmd_columns(input: &Path, config_path: Option<&Path>) -> CliResult {
    let config = PipelineConfig::load(config_path)?;
    if config.column_checks.is_empty() {
        eprintln!("📋 No column checks configured.");
        eprintln!("   Add a \"column_checks\" list to the config file.");
        return Ok(0);
    }

    let schema = config.build_schema()?;
    let dataset = read_dataset(input, &config.rename, &schema)?;
    eprintln!("📄 {} rows from {}", dataset.records.len(), input.display());

    let report = run_column_checks(&dataset.source_records, &config.column_checks);
    println!("{}", format_column_report(&report));

    Ok(if report.all_passed() { 0 } else { 1 })
}

fn cmd_schema(config_path: Option<&Path>) -> CliResult {
    let config = PipelineConfig::load(config_path)?;
    // Fail on a config that would not build
    config.build_schema()?;
    println!("{}", config.to_json()?);
    Ok(0)
}

async fn cmd_serve(port: u16, config_path: Option<&Path>) -> CliResult {
    let config = PipelineConfig::load(config_path)?;
    orderguard::server::start_server(port, config).await?;
    Ok(0)
}
