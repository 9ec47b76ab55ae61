use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const MASTER: &str = concat!(
    "{\"identity\":\"h1\",\"severity\":\"S0\",\"status\":\"open\"}\n",
    "{\"identity\":\"h2\",\"severity\":\"S2\",\"status\":\"resolved\"}\n",
);
const DEDUPED: &str = concat!(
    "{\"identity\":\"h1\",\"severity\":\"S1\",\"status\":\"open\",\"file\":\"src/a.rs\"}\n",
    "{\"identity\":\"\",\"severity\":\"S3\",\"status\":\"open\"}\n",
    "{\"identity\":\"h9\", \"severity\":\"S3\", \"status\":\"open\"}\n",
);
const DEDUPED_RECONCILED: &str = concat!(
    "{\"identity\":\"h1\",\"severity\":\"S0\",\"status\":\"open\",\"file\":\"src/a.rs\"}\n",
    "{\"identity\":\"\",\"severity\":\"S3\",\"status\":\"open\"}\n",
    "{\"identity\":\"h9\", \"severity\":\"S3\", \"status\":\"open\"}\n",
);

/// A workspace with `debt/master.jsonl` and `debt/deduped.jsonl` at the
/// default locations.
fn workspace(master: &str, deduped: &str) -> TempDir {
    let tmp = tempfile::tempdir().expect("tempdir");
    let debt = tmp.path().join("debt");
    fs::create_dir(&debt).expect("debt dir");
    fs::write(debt.join("master.jsonl"), master).expect("master");
    fs::write(debt.join("deduped.jsonl"), deduped).expect("deduped");
    tmp
}

fn cli(root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_debt-ledger"));
    cmd.current_dir(root)
        .env("HOME", root)
        .env("XDG_CONFIG_HOME", root.join("xdg"))
        .env_remove("DEBT_LEDGER_CONFIG")
        .env_remove("DEBT_LEDGER_LOG_LEVEL")
        .env_remove("DEBT_LEDGER_LOG_JSON")
        .env_remove("RUST_LOG");
    cmd
}

fn deduped(root: &Path) -> String {
    fs::read_to_string(root.join("debt/deduped.jsonl")).expect("read deduped")
}

#[test]
fn preview_reports_drift_and_exits_one() {
    let ws = workspace(MASTER, DEDUPED);
    let output = cli(ws.path())
        .args(["--json", "reconcile"])
        .output()
        .expect("run preview");
    assert_eq!(output.status.code(), Some(1));
    let report: Value = serde_json::from_slice(&output.stdout).expect("report json");
    assert_eq!(report["mode"], "preview");
    assert_eq!(report["authoritative"]["records"], 2);
    assert_eq!(report["target"]["records"], 3);
    assert_eq!(report["target"]["unkeyed_records"], 1);
    assert_eq!(report["correlated"], 1);
    assert_eq!(report["severity_changes"], 1);
    assert_eq!(report["status_changes"], 0);
    assert_eq!(report["total_changes"], 1);
    assert_eq!(report["applied"], false);
    assert_eq!(report["change_set"][0]["identity"], "h1");
    assert_eq!(report["change_set"][0]["line"], 1);
    assert_eq!(deduped(ws.path()), DEDUPED);
}

#[test]
fn apply_rewrites_target_and_exits_zero() {
    let ws = workspace(MASTER, DEDUPED);
    let output = cli(ws.path())
        .args(["reconcile", "--apply"])
        .output()
        .expect("run apply");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(deduped(ws.path()), DEDUPED_RECONCILED);
    assert_eq!(
        fs::read_to_string(ws.path().join("debt/master.jsonl")).expect("master"),
        MASTER
    );
    let text = String::from_utf8(output.stdout).expect("utf8");
    assert!(text.contains("applied: yes"));
}

#[test]
fn second_apply_does_not_rewrite_target() {
    let ws = workspace(MASTER, DEDUPED_RECONCILED);
    let path = ws.path().join("debt/deduped.jsonl");
    let before = fs::metadata(&path).and_then(|m| m.modified()).expect("mtime");

    let output = cli(ws.path())
        .args(["--json", "reconcile", "--apply"])
        .output()
        .expect("run apply");
    assert_eq!(output.status.code(), Some(0));
    let report: Value = serde_json::from_slice(&output.stdout).expect("report json");
    assert_eq!(report["total_changes"], 0);
    assert_eq!(report["applied"], false);
    assert!(report.get("target_fingerprint_after").is_none());
    assert_eq!(
        fs::metadata(&path).and_then(|m| m.modified()).expect("mtime"),
        before
    );
    assert_eq!(deduped(ws.path()), DEDUPED_RECONCILED);
}

#[test]
fn json_and_human_reports_agree_on_counts() {
    let ws = workspace(MASTER, DEDUPED);
    let json_out = cli(ws.path())
        .args(["--json", "reconcile"])
        .output()
        .expect("json run");
    let human_out = cli(ws.path())
        .arg("reconcile")
        .output()
        .expect("human run");
    assert_eq!(json_out.status.code(), human_out.status.code());

    let report: Value = serde_json::from_slice(&json_out.stdout).expect("report json");
    let human = String::from_utf8(human_out.stdout).expect("utf8");
    for (label, key) in [
        ("severity changes", "severity_changes"),
        ("status changes", "status_changes"),
        ("total changes", "total_changes"),
        ("correlated", "correlated"),
    ] {
        assert!(
            human.contains(&format!("{label}: {}", report[key])),
            "human output disagrees on {label}"
        );
    }
    assert!(human.contains("rerun with --apply"));
}

#[test]
fn missing_authoritative_file_exits_two() {
    let ws = workspace(MASTER, DEDUPED);
    fs::remove_file(ws.path().join("debt/master.jsonl")).expect("remove master");
    let output = cli(ws.path())
        .args(["--json", "reconcile", "--apply"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let err: Value = serde_json::from_slice(&output.stderr).expect("machine error");
    assert_eq!(err["code"], "input_unreadable");
    assert_eq!(err["details"]["ledger"], "authoritative");
    assert_eq!(deduped(ws.path()), DEDUPED);
}

#[test]
fn failed_write_exits_two_and_keeps_target_bytes() {
    let ws = workspace(MASTER, DEDUPED);
    fs::create_dir(ws.path().join("debt/.deduped.jsonl.reconcile.tmp")).expect("block staging");
    let output = cli(ws.path())
        .args(["--json", "reconcile", "--apply"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(2));
    let err: Value = serde_json::from_slice(&output.stderr).expect("machine error");
    assert_eq!(err["code"], "output_unwritable");
    assert_eq!(deduped(ws.path()), DEDUPED);
}

#[test]
fn malformed_lines_are_skipped_and_reported() {
    let ws = workspace(MASTER, &format!("not json\n\n{DEDUPED}"));
    let output = cli(ws.path())
        .args(["--json", "reconcile", "--apply"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(0));
    let report: Value = serde_json::from_slice(&output.stdout).expect("report json");
    assert_eq!(report["target"]["malformed_lines"], serde_json::json!([1]));
    assert_eq!(report["target"]["blank_lines"], 1);
    assert_eq!(deduped(ws.path()), DEDUPED_RECONCILED);
}

#[test]
fn explicit_paths_and_fields_override_defaults() {
    let ws = workspace("", "");
    fs::write(ws.path().join("a.jsonl"), MASTER).expect("a");
    fs::write(ws.path().join("t.jsonl"), DEDUPED).expect("t");
    let output = cli(ws.path())
        .args([
            "--json",
            "reconcile",
            "--authoritative",
            "a.jsonl",
            "--target",
            "t.jsonl",
            "--field",
            "status",
        ])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(0));
    let report: Value = serde_json::from_slice(&output.stdout).expect("report json");
    assert_eq!(report["total_changes"], 0);
    assert_eq!(report["target"]["location"], "t.jsonl");
}

#[test]
fn workspace_config_file_is_honoured() {
    let ws = workspace("", "");
    fs::create_dir(ws.path().join(".debt-ledger")).expect("config dir");
    fs::write(
        ws.path().join(".debt-ledger/config.toml"),
        "[ledger]\nauthoritative = \"m.jsonl\"\ntarget = \"d.jsonl\"\n",
    )
    .expect("config");
    fs::write(ws.path().join("m.jsonl"), MASTER).expect("m");
    fs::write(ws.path().join("d.jsonl"), DEDUPED).expect("d");

    let output = cli(ws.path())
        .args(["--json", "reconcile"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(1));
    let report: Value = serde_json::from_slice(&output.stdout).expect("report json");
    assert_eq!(report["authoritative"]["location"], "m.jsonl");

    let output = cli(ws.path())
        .args(["--json", "config"])
        .output()
        .expect("run config");
    assert!(output.status.success());
    let payload: Value = serde_json::from_slice(&output.stdout).expect("config json");
    assert_eq!(payload["source"], "workspace");
    assert_eq!(payload["settings"]["target"], "d.jsonl");
}

#[test]
fn invalid_explicit_config_is_a_config_error() {
    let ws = workspace(MASTER, DEDUPED);
    fs::write(ws.path().join("bad.toml"), "[ledger]\nunknown = 1\n").expect("bad config");
    let output = cli(ws.path())
        .args(["--json", "--config", "bad.toml", "reconcile"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(2));
    let err: Value = serde_json::from_slice(&output.stderr).expect("machine error");
    assert_eq!(err["code"], "config_error");

    let output = cli(ws.path())
        .args(["--json", "reconcile"])
        .env("DEBT_LEDGER_CONFIG", "absent.toml")
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(2));
    let err: Value = serde_json::from_slice(&output.stderr).expect("machine error");
    assert_eq!(err["code"], "config_error");
}

#[test]
fn invalid_field_flags_are_usage_errors() {
    let ws = workspace(MASTER, DEDUPED);
    let output = cli(ws.path())
        .args(["--json", "reconcile", "--field", "identity"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(2));
    let err: Value = serde_json::from_slice(&output.stderr).expect("machine error");
    assert_eq!(err["code"], "usage_error");
}

#[test]
fn logs_stay_off_stdout() {
    let ws = workspace(MASTER, DEDUPED);
    let output = cli(ws.path())
        .args(["--json", "--trace", "reconcile"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(1));
    let _: Value = serde_json::from_slice(&output.stdout).expect("stdout stays one json object");
    assert!(!output.stderr.is_empty());
}
