use std::path::PathBuf;
use std::process::ExitCode;

use analyzer_common::observability::init_logging;
use analyzer_config::{AnalyzerConfig, AnalyzerConfigLoader, default_config_path};
use anyhow::Result;
use clap::Parser;
use commands::{Command, Runner, log_config};
mod commands;

/// Check pages for reachability and basic SEO metadata.
#[derive(Debug, Parser)]
#[command(name = "page-analyzer", version, about)]
struct Cli {
    /// Config file (YAML/TOML/JSON). Defaults to the user config dir, if present.
    #[arg(long, global = true, env = "PAGE_ANALYZER_CONFIG")]
    config: Option<PathBuf>,

    /// Also log to stderr at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

fn load_config(explicit: Option<&PathBuf>) -> Result<AnalyzerConfig> {
    let loader = AnalyzerConfigLoader::new();
    let loader = match (explicit, default_config_path()) {
        (Some(path), _) => loader.with_file(path),
        (None, Some(path)) => loader.with_optional_file(path),
        (None, None) => loader,
    };
    Ok(loader.load()?)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let cfg = load_config(cli.config.as_ref())?;

    let log_path = init_logging(log_config(&cfg.logging, cli.verbose))?;
    tracing::debug!(log_path = %log_path.display(), command = ?cli.command, "cli.start");

    let runner = Runner::from_config(&cfg)?;
    let report = runner.run(cli.command).await?;

    println!("{}", serde_json::to_string_pretty(&report.body)?);
    Ok(if report.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
