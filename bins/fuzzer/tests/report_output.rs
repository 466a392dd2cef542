//! The binary's stdout must be the JSON report and nothing else

use std::process::Command;

use serde::Deserialize;

#[derive(Deserialize)]
struct ReportHeader {
    seed: u64,
    trials_run: usize,
}

#[test]
fn stdout_holds_only_the_report_while_logging() {
    let output = Command::new(env!("CARGO_BIN_EXE_fuzzer"))
        .env("DSC_FUZZ_SEED", "2024")
        .env("DSC_FUZZ_TRIALS", "2")
        .env("DSC_FUZZ_STEPS", "8")
        .env("RUST_LOG", "info")
        .output()
        .unwrap();

    let code = output.status.code();
    assert!(matches!(code, Some(0) | Some(1)), "unexpected exit {code:?}");

    let report: ReportHeader = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report.seed, 2024);
    assert!(report.trials_run >= 1 && report.trials_run <= 2);

    let logs = String::from_utf8_lossy(&output.stderr);
    assert!(logs.contains("solvency check"), "missing summary log in {logs:?}");
}
