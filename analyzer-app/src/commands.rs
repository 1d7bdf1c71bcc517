use analyzer_common::observability::LogConfig;
use analyzer_config::{AnalyzerConfig, HttpConfig, LoggingConfig};
use analyzer_core::{
    Address, InspectionResult, PageInspector, ValidationOutcome, normalize, validate,
};
use analyzer_http::{ClientSettings, DEFAULT_USER_AGENT};
use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that a raw address is well-formed and short enough.
    Validate { url: String },
    /// Print the canonical `scheme://host` form of an address.
    Normalize { url: String },
    /// Fetch an already-normalized address and report its SEO metadata.
    Check { address: String },
    /// Validate, normalize, then check a raw address.
    Analyze { url: String },
}

#[derive(Debug, Serialize)]
struct AnalyzeReport {
    validation: ValidationOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<InspectionResult>,
}

/// What a command printed and whether it counts as success for the exit code.
#[derive(Debug)]
pub struct Report {
    pub body: Value,
    pub ok: bool,
}

pub struct Runner {
    inspector: PageInspector,
}

impl Runner {
    pub fn from_config(cfg: &AnalyzerConfig) -> Result<Self> {
        let inspector = PageInspector::with_settings(client_settings(&cfg.http))?;
        Ok(Self { inspector })
    }

    pub async fn run(&self, command: Command) -> Result<Report> {
        match command {
            Command::Validate { url } => {
                let outcome = validate(&url);
                Ok(Report {
                    body: serde_json::to_value(outcome)?,
                    ok: true,
                })
            }
            Command::Normalize { url } => Ok(Report {
                body: json!({ "address": normalize(&url) }),
                ok: true,
            }),
            Command::Check { address } => {
                let result = self.inspector.check(&Address::from_stored(address)).await;
                Ok(Report {
                    ok: result.is_success(),
                    body: serde_json::to_value(result)?,
                })
            }
            Command::Analyze { url } => {
                let validation = validate(&url);
                if !validation.is_valid() {
                    tracing::info!(reason = ?validation.message(), "analyze.rejected");
                    let report = AnalyzeReport {
                        validation,
                        address: None,
                        result: None,
                    };
                    return Ok(Report {
                        body: serde_json::to_value(report)?,
                        ok: false,
                    });
                }

                let address = normalize(&url);
                let result = self.inspector.check(&address).await;
                let ok = result.is_success();
                let report = AnalyzeReport {
                    validation,
                    address: Some(address),
                    result: Some(result),
                };
                Ok(Report {
                    body: serde_json::to_value(report)?,
                    ok,
                })
            }
        }
    }
}

pub fn client_settings(cfg: &HttpConfig) -> ClientSettings {
    ClientSettings {
        timeout: cfg.timeout(),
        connect_timeout: cfg.connect_timeout(),
        user_agent: cfg
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
    }
}

pub fn log_config(cfg: &LoggingConfig, verbose: bool) -> LogConfig {
    LogConfig {
        log_dir: cfg.dir.clone(),
        emit_stderr: cfg.emit_stderr || verbose,
        format: cfg.format,
        default_filter: if verbose {
            "debug".to_string()
        } else {
            cfg.filter.clone()
        },
        ..LogConfig::default()
    }
}
