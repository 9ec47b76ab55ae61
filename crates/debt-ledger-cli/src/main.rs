#![forbid(unsafe_code)]

fn main() -> std::process::ExitCode {
    debt_ledger_cli::main_entry()
}
