use anyhow::{Context, Result};
use api_log_analyzer::config::Config;
use api_log_analyzer::display::ReportDisplayManager;
use api_log_analyzer::input::{expand_inputs, load_records};
use api_log_analyzer::logging::init_logging;
use api_log_analyzer::{LogAnalyzer, Report};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "api-log-analyzer")]
#[command(about = "Analyze API request logs for performance, errors, cost and anomalies")]
#[command(version = "1.0.0")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the analysis report as JSON
    Analyze {
        /// Input files or glob patterns (.json arrays or .jsonl)
        #[arg(required = true)]
        inputs: Vec<String>,
        /// Write the report to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,
    },
    /// Show a human-readable report
    Report {
        /// Input files or glob patterns (.json arrays or .jsonl)
        #[arg(required = true)]
        inputs: Vec<String>,
        /// Show at most N endpoints
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let json = matches!(cli.command, Commands::Analyze { .. });

    let config = match Config::load_with_override(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return handle_error(e, json),
    };

    let _guard = match init_logging(&config.logging, &config.paths.log_directory) {
        Ok(guard) => guard,
        Err(e) => return handle_error(e, json),
    };

    let span = info_span!("run", run_id = %Uuid::new_v4());
    match run(cli.command, config).instrument(span).await {
        Ok(()) => Ok(()),
        Err(e) => handle_error(e, json),
    }
}

async fn run(command: Commands, config: Config) -> Result<()> {
    let display = ReportDisplayManager::new();

    match command {
        Commands::Analyze { inputs, output, pretty } => {
            let pretty = pretty || config.output.json_pretty;
            let report = analyze_inputs(&inputs, config).await?;

            match output {
                Some(path) => {
                    let json = display.to_json(&report, pretty)?;
                    tokio::fs::write(&path, json)
                        .await
                        .with_context(|| format!("Failed to write report: {}", path.display()))?;
                    info!(output = %path.display(), "Report written");
                }
                None => display.display_json(&report, pretty)?,
            }
        }
        Commands::Report { inputs, limit } => {
            let report = analyze_inputs(&inputs, config).await?;
            display.display_report(&report, limit);
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

async fn analyze_inputs(inputs: &[String], config: Config) -> Result<Report> {
    let files = expand_inputs(inputs)?;
    let records = load_records(&files).await?;
    info!(files = files.len(), "Analyzing input");
    LogAnalyzer::new(config).analyze_value(&records)
}

fn handle_error(e: anyhow::Error, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
    } else {
        eprintln!("Error: {:#}", e);
    }
    process::exit(1);
}
