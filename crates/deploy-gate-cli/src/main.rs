// crates/deploy-gate-cli/src/main.rs
// ============================================================================
// Module: Deploy Gate CLI Entry Point
// Description: Command dispatcher for deployment decisions and config tooling.
// Purpose: Thin binding from request files to the canonical decision engine.
// Dependencies: clap, deploy-gate-config, deploy-gate-core, serde_json, tokio,
// tracing-subscriber.
// ============================================================================

//! ## Overview
//! `deploy-gate evaluate` reads a decision request, runs the decision engine,
//! prints the decision, and maps the verdict to the exit code: 0 when the
//! deployment is allowed, 2 when it is blocked, and 1 for usage or input
//! errors. Logs go to stderr so stdout stays machine-readable.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use deploy_gate_config::DeployGateConfig;
use deploy_gate_config::config_toml_example;
use deploy_gate_core::AuditLogger;
use deploy_gate_core::DecisionEngine;
use deploy_gate_core::DecisionRequest;
use deploy_gate_core::DeploymentDecision;
use deploy_gate_core::PredictorRegistry;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum size of a decision request file.
const MAX_REQUEST_BYTES: usize = 8 * 1024 * 1024;
/// Environment variable holding the log filter override.
const LOG_ENV: &str = "DEPLOY_GATE_LOG";
/// Exit status for a blocked deployment.
const EXIT_BLOCKED: u8 = 2;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "deploy-gate", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a deployment decision request.
    Evaluate(EvaluateCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for the `evaluate` command.
#[derive(Args, Debug)]
struct EvaluateCommand {
    /// Decision request JSON file.
    #[arg(long, value_name = "PATH")]
    request: PathBuf,
    /// Optional config file path (defaults to deploy-gate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Audit export directory (overrides `[audit].dir`).
    #[arg(long, value_name = "DIR")]
    audit_dir: Option<PathBuf>,
    /// Force ML prediction on for this request.
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "no_ml")]
    ml: bool,
    /// Force ML prediction off for this request.
    #[arg(long, action = ArgAction::SetTrue)]
    no_ml: bool,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

/// Decision output formats.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Pretty-printed decision JSON.
    Json,
    /// Human-readable summary.
    Text,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a Deploy Gate configuration file.
    Validate(ConfigValidateCommand),
    /// Print an example configuration with default values.
    Example,
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to deploy-gate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Exit status 2 is reserved for blocked deployments.
            let code = if err.use_stderr() { ExitCode::FAILURE } else { ExitCode::SUCCESS };
            let _ = err.print();
            return Ok(code);
        }
    };
    match cli.command {
        Commands::Evaluate(command) => command_evaluate(command).await,
        Commands::Config {
            command,
        } => command_config(command),
    }
}

// ============================================================================
// SECTION: Evaluate Command
// ============================================================================

/// Executes the evaluate command.
async fn command_evaluate(command: EvaluateCommand) -> CliResult<ExitCode> {
    let config = DeployGateConfig::load_or_default(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    init_tracing(&config.logging.filter);

    let bytes = read_bytes_with_limit(&command.request, MAX_REQUEST_BYTES)
        .map_err(|err| CliError::new(read_error_message(&command.request, &err)))?;
    let mut request: DecisionRequest = serde_json::from_slice(&bytes).map_err(|err| {
        CliError::new(format!("invalid decision request {}: {err}", command.request.display()))
    })?;
    apply_ml_override(&mut request, command.ml, command.no_ml);
    tracing::debug!(path = %command.request.display(), bytes = bytes.len(), "decision request loaded");

    let ml_requested = request.enable_ml_prediction.unwrap_or(config.ml.enabled);
    let registry = if ml_requested {
        PredictorRegistry::load(&config.model_sources(), config.model_load_timeout()).await
    } else {
        PredictorRegistry::empty()
    };
    let mut engine = DecisionEngine::new(config.to_engine_config(), registry);
    if let Some(index) = config.file_risk_index().map_err(|err| CliError::new(err.to_string()))? {
        engine = engine.with_file_risk_index(Arc::new(index));
    }
    let audit_dir = command.audit_dir.clone().or_else(|| config.audit_dir().map(Path::to_path_buf));
    let audit = audit_dir.as_ref().map(|_| Arc::new(AuditLogger::new()));
    if let Some(logger) = &audit {
        engine = engine.with_audit_logger(Arc::clone(logger));
    }

    let decision = engine.decide(&request).await.map_err(|err| CliError::new(err.to_string()))?;

    if let (Some(logger), Some(dir)) = (&audit, &audit_dir)
        && let Some(path) = logger.export_or_warn(dir)
    {
        tracing::info!(path = %path.display(), "audit run written");
    }

    let output = match command.format {
        OutputFormat::Json => serde_json::to_string_pretty(&decision)
            .map_err(|err| CliError::new(format!("failed to serialize decision: {err}")))?,
        OutputFormat::Text => render_text(&decision),
    };
    write_stdout_line(&output).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::from(exit_status(&decision)))
}

/// Applies the `--ml` / `--no-ml` flags to the request.
fn apply_ml_override(request: &mut DecisionRequest, ml: bool, no_ml: bool) {
    if ml {
        request.enable_ml_prediction = Some(true);
    } else if no_ml {
        request.enable_ml_prediction = Some(false);
    }
}

/// Maps a decision to the process exit status.
const fn exit_status(decision: &DeploymentDecision) -> u8 {
    if decision.can_deploy { 0 } else { EXIT_BLOCKED }
}

/// Renders a human-readable decision summary.
fn render_text(decision: &DeploymentDecision) -> String {
    let verdict = if decision.can_deploy { "ALLOWED" } else { "BLOCKED" };
    let mut output = String::new();
    let _ = writeln!(output, "Deployment {verdict}");
    let _ = writeln!(
        output,
        "Confidence: {:.1}% (required {:.0}% for {} risk)",
        decision.confidence, decision.required_confidence, decision.risk.category
    );
    let factors = decision.factors;
    let _ = writeln!(
        output,
        "Factors: risk {:.1}, test impact {:.1}, baseline stability {:.1}",
        factors.risk_weight, factors.test_impact, factors.baseline_stability
    );
    output.push_str("Reasoning:\n");
    for line in &decision.reasoning {
        let _ = writeln!(output, "  - {line}");
    }
    if !decision.degraded_signals.is_empty() {
        output.push_str("Degraded signals:\n");
        for entry in &decision.degraded_signals {
            let _ = writeln!(output, "  - {}: {}", entry.signal, entry.reason);
        }
    }
    output.truncate(output.trim_end().len());
    output
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    init_tracing(deploy_gate_config::DEFAULT_LOG_FILTER);
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
        ConfigCommand::Example => {
            write_stdout_line(config_toml_example().trim_end())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let _config = DeployGateConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    write_stdout_line("config ok").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Installs the stderr subscriber; `DEPLOY_GATE_LOG` overrides the config filter.
fn init_tracing(config_filter: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(config_filter))
        .unwrap_or_else(|_| EnvFilter::new(deploy_gate_config::DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let metadata = file.metadata().map_err(ReadLimitError::Io)?;
    let size = metadata.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        return Err(ReadLimitError::TooLarge {
            size: actual,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Formats a bounded read failure.
fn read_error_message(path: &Path, error: &ReadLimitError) -> String {
    match error {
        ReadLimitError::Io(err) => format!("failed to read {}: {err}", path.display()),
        ReadLimitError::TooLarge {
            size,
            limit,
        } => format!("{} is {size} bytes, exceeding the {limit} byte limit", path.display()),
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output stream error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
