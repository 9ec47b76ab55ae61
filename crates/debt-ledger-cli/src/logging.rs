use debt_ledger_core::{ENV_DEBT_LEDGER_LOG_JSON, ENV_DEBT_LEDGER_LOG_LEVEL};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::helpers::{env_bool, non_empty_env};

const DEFAULT_LEVEL: &str = "warn";

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct LogFlags {
    pub(crate) quiet: bool,
    pub(crate) verbose: u8,
    pub(crate) trace: bool,
}

impl LogFlags {
    fn forced_level(self) -> Option<&'static str> {
        if self.trace || self.verbose > 1 {
            Some("trace")
        } else if self.verbose == 1 {
            Some("debug")
        } else if self.quiet {
            Some("error")
        } else {
            None
        }
    }
}

pub(crate) fn build_filter(flags: LogFlags) -> EnvFilter {
    if let Some(level) = flags.forced_level() {
        return EnvFilter::new(level);
    }
    if let Some(directive) = non_empty_env(ENV_DEBT_LEDGER_LOG_LEVEL) {
        return EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

/// Logs go to stderr; stdout carries only the command result.
pub(crate) fn init_logging(flags: LogFlags) {
    let filter = build_filter(flags);
    let installed = if env_bool(ENV_DEBT_LEDGER_LOG_JSON, false) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
