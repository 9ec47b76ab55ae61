use debt_ledger_core::{resolve_config_path, ConfigPathScope, ENV_DEBT_LEDGER_CONFIG};
use debt_ledger_model::{LedgerSchema, DEFAULT_IDENTITY_FIELD, DEFAULT_MUTABLE_FIELDS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::helpers::non_empty_env;

pub(crate) const DEFAULT_AUTHORITATIVE_PATH: &str = "debt/master.jsonl";
pub(crate) const DEFAULT_TARGET_PATH: &str = "debt/deduped.jsonl";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    #[serde(default)]
    pub(crate) ledger: LedgerSection,
    #[serde(default)]
    pub(crate) reconcile: ReconcileSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LedgerSection {
    pub(crate) authoritative: Option<PathBuf>,
    pub(crate) target: Option<PathBuf>,
    pub(crate) identity_field: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ReconcileSection {
    pub(crate) fields: Option<Vec<String>>,
}

/// Where the loaded file came from, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ConfigSource {
    Flag,
    Env,
    Workspace,
    User,
    Defaults,
}

#[derive(Debug, Clone)]
pub(crate) struct LoadedConfig {
    pub(crate) source: ConfigSource,
    pub(crate) path: Option<PathBuf>,
    pub(crate) file: FileConfig,
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub(crate) struct ReconcileOverrides {
    pub(crate) authoritative: Option<PathBuf>,
    pub(crate) target: Option<PathBuf>,
    pub(crate) identity_field: Option<String>,
    pub(crate) fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ReconcileSettings {
    pub(crate) authoritative: PathBuf,
    pub(crate) target: PathBuf,
    pub(crate) identity_field: String,
    pub(crate) fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SettingsError {
    /// The file could not be read or parsed.
    Config(String),
    /// A flag or file value does not form a valid schema.
    Schema { from_flags: bool, message: String },
}

/// `explicit` (from `--config`) and `DEBT_LEDGER_CONFIG` name files that must
/// exist. Otherwise the workspace file, then the user file, are used when
/// present.
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, SettingsError> {
    if let Some(path) = explicit {
        return read_config(path, ConfigSource::Flag);
    }
    if let Some(path) = non_empty_env(ENV_DEBT_LEDGER_CONFIG) {
        return read_config(Path::new(&path), ConfigSource::Env);
    }
    for (scope, source) in [
        (ConfigPathScope::Workspace, ConfigSource::Workspace),
        (ConfigPathScope::User, ConfigSource::User),
    ] {
        let path = resolve_config_path(scope);
        if path.is_file() {
            return read_config(&path, source);
        }
    }
    Ok(LoadedConfig {
        source: ConfigSource::Defaults,
        path: None,
        file: FileConfig::default(),
    })
}

fn read_config(path: &Path, source: ConfigSource) -> Result<LoadedConfig, SettingsError> {
    let text = fs::read_to_string(path).map_err(|e| {
        SettingsError::Config(format!("failed to read {}: {e}", path.display()))
    })?;
    let file = parse_config(&text)
        .map_err(|e| SettingsError::Config(format!("failed to parse {}: {e}", path.display())))?;
    tracing::debug!(path = %path.display(), ?source, "config loaded");
    Ok(LoadedConfig {
        source,
        path: Some(path.to_path_buf()),
        file,
    })
}

pub(crate) fn parse_config(text: &str) -> Result<FileConfig, toml::de::Error> {
    toml::from_str(text)
}

impl LoadedConfig {
    /// defaults < file < flags.
    pub(crate) fn resolve(
        &self,
        overrides: ReconcileOverrides,
    ) -> Result<(ReconcileSettings, LedgerSchema), SettingsError> {
        let ledger = &self.file.ledger;
        let schema_from_flags = overrides.identity_field.is_some() || !overrides.fields.is_empty();
        let settings = ReconcileSettings {
            authoritative: overrides
                .authoritative
                .or_else(|| ledger.authoritative.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_AUTHORITATIVE_PATH)),
            target: overrides
                .target
                .or_else(|| ledger.target.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TARGET_PATH)),
            identity_field: overrides
                .identity_field
                .or_else(|| ledger.identity_field.clone())
                .unwrap_or_else(|| DEFAULT_IDENTITY_FIELD.to_string()),
            fields: if overrides.fields.is_empty() {
                self.file.reconcile.fields.clone().unwrap_or_else(|| {
                    DEFAULT_MUTABLE_FIELDS.iter().map(ToString::to_string).collect()
                })
            } else {
                overrides.fields
            },
        };
        let schema = LedgerSchema::new(&settings.identity_field, &settings.fields).map_err(|e| {
            SettingsError::Schema {
                from_flags: schema_from_flags,
                message: e.to_string(),
            }
        })?;
        Ok((settings, schema))
    }
}
