use debt_ledger_core::{resolve_config_path, ConfigPathScope, ExitCode};
use debt_ledger_reconcile::{ReconcileMode, ReconcileReport, Reconciler};
use debt_ledger_store::JsonlFileStore;
use serde_json::json;
use std::path::Path;

use crate::config::{load_config, ReconcileOverrides};
use crate::{helpers, CliError, OutputMode};

pub(crate) fn run_reconcile(
    config_path: Option<&Path>,
    overrides: ReconcileOverrides,
    apply: bool,
    output_mode: OutputMode,
) -> Result<ExitCode, CliError> {
    let loaded = load_config(config_path).map_err(CliError::from_settings)?;
    let (settings, schema) = loaded.resolve(overrides).map_err(CliError::from_settings)?;
    let mode = if apply {
        ReconcileMode::Apply
    } else {
        ReconcileMode::Preview
    };
    tracing::debug!(
        authoritative = %settings.authoritative.display(),
        target = %settings.target.display(),
        mode = mode.as_str(),
        "starting reconcile"
    );

    let authoritative = JsonlFileStore::new(&settings.authoritative);
    let target = JsonlFileStore::new(&settings.target);
    let outcome = Reconciler::new(schema, mode)
        .run(&authoritative, &target)
        .map_err(|e| CliError::reconcile(&e))?;
    let report = ReconcileReport::from_outcome(&outcome);

    if output_mode.json {
        let payload = report
            .render_json()
            .map_err(|e| CliError::internal(e.to_string()))?;
        println!("{payload}");
    } else {
        print!("{}", report.render_human());
    }
    Ok(report.exit_code())
}

pub(crate) fn run_config(
    config_path: Option<&Path>,
    output_mode: OutputMode,
) -> Result<ExitCode, CliError> {
    let loaded = load_config(config_path).map_err(CliError::from_settings)?;
    let (settings, _) = loaded
        .resolve(ReconcileOverrides::default())
        .map_err(CliError::from_settings)?;
    helpers::emit_ok(
        output_mode,
        &json!({
            "source": loaded.source,
            "config_path": loaded.path,
            "workspace_config": resolve_config_path(ConfigPathScope::Workspace),
            "user_config": resolve_config_path(ConfigPathScope::User),
            "settings": settings,
        }),
    )
    .map_err(CliError::internal)?;
    Ok(ExitCode::Success)
}

pub(crate) fn run_version(output_mode: OutputMode) -> Result<ExitCode, CliError> {
    if output_mode.json {
        helpers::emit_ok(
            output_mode,
            &json!({
                "name": "debt-ledger",
                "version": env!("CARGO_PKG_VERSION"),
            }),
        )
        .map_err(CliError::internal)?;
    } else {
        println!("debt-ledger {}", env!("CARGO_PKG_VERSION"));
    }
    Ok(ExitCode::Success)
}
