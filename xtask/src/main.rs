use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

/// Runs `cargo` with `args` in `root` and returns its exit status code.
fn cargo(root: &Path, args: &[&str]) -> Result<i32, String> {
    let rendered = args.join(" ");
    let status = Command::new(env::var("CARGO").unwrap_or_else(|_| "cargo".to_string()))
        .args(args)
        .current_dir(root)
        .status()
        .map_err(|e| format!("failed to run `cargo {rendered}`: {e}"))?;
    status
        .code()
        .ok_or_else(|| format!("`cargo {rendered}` was terminated by a signal"))
}

fn require_success(root: &Path, args: &[&str]) -> Result<u8, String> {
    match cargo(root, args)? {
        0 => Ok(0),
        code => Err(format!("command failed ({code}): cargo {}", args.join(" "))),
    }
}

fn workspace_root() -> Result<PathBuf, String> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| "failed to resolve workspace root".to_string())
}

/// Preview reconcile against the workspace config. Exit status 1 means the
/// target ledger has drifted from the authoritative one.
fn drift_check(root: &Path, extra: &[String]) -> Result<u8, String> {
    let mut args = vec!["run", "--quiet", "-p", "debt-ledger-cli", "--", "reconcile"];
    args.extend(extra.iter().map(String::as_str));
    match cargo(root, &args)? {
        code @ (0 | 1) => Ok(u8::try_from(code).unwrap_or(2)),
        code => Err(format!("drift check failed with status {code}")),
    }
}

fn main() -> ExitCode {
    let mut argv = env::args().skip(1);
    let arg = argv.next().unwrap_or_else(|| "help".to_string());
    let rest: Vec<String> = argv.collect();
    let root = match workspace_root() {
        Ok(root) => root,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    let result = match arg.as_str() {
        "fmt" => require_success(&root, &["fmt", "--all", "--", "--check"]),
        "lint" => require_success(
            &root,
            &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        ),
        "test" => require_success(&root, &["test", "--workspace"]),
        "drift-check" => drift_check(&root, &rest),
        "help" | "--help" | "-h" => {
            eprintln!("xtask commands:");
            eprintln!("  fmt           check formatting");
            eprintln!("  lint          clippy with warnings denied");
            eprintln!("  test          run the workspace tests");
            eprintln!("  drift-check   preview reconcile; exits 1 on drift");
            Ok(0)
        }
        _ => Err(format!(
            "unknown xtask command: {arg} (try `cargo run -p xtask -- help`)"
        )),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(2)
        }
    }
}
