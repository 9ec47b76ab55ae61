#![forbid(unsafe_code)]
//! Shared contracts for the debt-ledger workspace: the process exit-status
//! contract, the machine-readable error envelope, canonical JSON encoding and
//! configuration path resolution.

pub mod canonical;
mod config;
mod errors;

use sha2::{Digest, Sha256};

pub use config::{resolve_config_path, ConfigPathScope, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use errors::{ErrorCode, ExitCode, MachineError};

pub const CRATE_NAME: &str = "debt-ledger-core";

pub const ENV_DEBT_LEDGER_CONFIG: &str = "DEBT_LEDGER_CONFIG";
pub const ENV_DEBT_LEDGER_LOG_LEVEL: &str = "DEBT_LEDGER_LOG_LEVEL";
pub const ENV_DEBT_LEDGER_LOG_JSON: &str = "DEBT_LEDGER_LOG_JSON";

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
