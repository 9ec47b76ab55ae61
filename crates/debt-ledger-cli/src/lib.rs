#![forbid(unsafe_code)]

mod commands;
mod config;
mod helpers;
mod logging;

use clap::{error::ErrorKind, ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Generator, Shell};
use debt_ledger_core::{ErrorCode, ExitCode, MachineError};
use debt_ledger_reconcile::{LedgerSide, ReconcileError};
use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;

use config::{ReconcileOverrides, SettingsError};
use logging::LogFlags;

const DEBT_LEDGER_HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
Usage: {usage}

Options:
{options}

Commands:
{subcommands}
{after-help}";

#[derive(Parser)]
#[command(name = "debt-ledger", version)]
#[command(about = "Reconcile debt ledger fields from the authoritative ledger")]
#[command(help_template = DEBT_LEDGER_HELP_TEMPLATE)]
#[command(
    after_help = "Exit status:\n  0  no drift, or drift applied\n  1  drift found in preview\n  2  unreadable input, failed write, or bad arguments\n\nEnvironment:\n  DEBT_LEDGER_CONFIG      Config file path\n  DEBT_LEDGER_LOG_LEVEL   Log filter override\n  DEBT_LEDGER_LOG_JSON    Emit logs as JSON lines"
)]
struct Cli {
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[arg(long, global = true, default_value_t = false)]
    quiet: bool,
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[arg(long, global = true, default_value_t = false)]
    trace: bool,
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy authoritative field values into the target ledger
    Reconcile {
        #[arg(long, value_name = "PATH")]
        authoritative: Option<PathBuf>,
        #[arg(long, value_name = "PATH")]
        target: Option<PathBuf>,
        /// Rewrite the target ledger; without it nothing is written
        #[arg(long, default_value_t = false)]
        apply: bool,
        /// Mutable field to reconcile; repeat to list several
        #[arg(long = "field", value_name = "NAME")]
        fields: Vec<String>,
        #[arg(long, value_name = "NAME")]
        identity_field: Option<String>,
    },
    /// Print the resolved configuration and config search paths
    Config,
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
    Version,
}

#[derive(Clone, Copy)]
struct OutputMode {
    json: bool,
}

pub fn main_entry() -> ProcessExitCode {
    let wants_json = std::env::args().any(|arg| arg == "--json");
    match run() {
        Ok(code) => ProcessExitCode::from(code.code()),
        Err(err) => {
            emit_error(&err, wants_json);
            ProcessExitCode::from(err.exit_code.code())
        }
    }
}

fn run() -> Result<ExitCode, CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{err}");
                return Ok(ExitCode::Success);
            }
            _ => {
                return Err(CliError::usage("invalid command line arguments")
                    .with_detail("error", &err.to_string()));
            }
        },
    };
    logging::init_logging(LogFlags {
        quiet: cli.quiet,
        verbose: cli.verbose,
        trace: cli.trace,
    });
    let output_mode = OutputMode { json: cli.json };

    let command = cli
        .command
        .ok_or_else(|| CliError::usage("missing command; see --help"))?;
    match command {
        Commands::Reconcile {
            authoritative,
            target,
            apply,
            fields,
            identity_field,
        } => commands::run_reconcile(
            cli.config.as_deref(),
            ReconcileOverrides {
                authoritative,
                target,
                identity_field,
                fields,
            },
            apply,
            output_mode,
        ),
        Commands::Config => commands::run_config(cli.config.as_deref(), output_mode),
        Commands::Completion { shell } => {
            print_completion(shell);
            Ok(ExitCode::Success)
        }
        Commands::Version => commands::run_version(output_mode),
    }
}

fn print_completion<G: Generator>(generator: G) {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    generate(generator, &mut command, name, &mut std::io::stdout());
}

#[derive(Debug)]
struct CliError {
    exit_code: ExitCode,
    machine: MachineError,
}

impl CliError {
    fn failure(code: ErrorCode, message: &str) -> Self {
        Self {
            exit_code: ExitCode::Failure,
            machine: MachineError::new(code, message),
        }
    }

    fn usage(message: &str) -> Self {
        Self::failure(ErrorCode::UsageError, message)
    }

    fn internal(message: String) -> Self {
        Self::failure(ErrorCode::Internal, &message)
    }

    fn reconcile(error: &ReconcileError) -> Self {
        let err = Self::failure(error.error_code(), &error.to_string());
        match error {
            ReconcileError::Load { side, .. } => err.with_detail("ledger", side.as_str()),
            ReconcileError::Persist(_) => err.with_detail("ledger", LedgerSide::Target.as_str()),
            _ => err,
        }
    }

    fn from_settings(error: SettingsError) -> Self {
        match error {
            SettingsError::Config(message) => Self::failure(ErrorCode::ConfigError, &message),
            SettingsError::Schema {
                from_flags: true,
                message,
            } => Self::usage(&message),
            SettingsError::Schema {
                from_flags: false,
                message,
            } => Self::failure(ErrorCode::ConfigError, &message),
        }
    }

    fn with_detail(mut self, key: &str, value: &str) -> Self {
        self.machine = self.machine.with_detail(key, value);
        self
    }
}

fn emit_error(error: &CliError, machine_json: bool) {
    if machine_json {
        match serde_json::to_string(&error.machine) {
            Ok(payload) => eprintln!("{payload}"),
            Err(_) => eprintln!(
                "{{\"code\":\"internal_error\",\"message\":\"failed to encode structured error\",\"details\":{{}}}}"
            ),
        }
    } else {
        eprintln!("error: {}", error.machine.message);
    }
}
