//! Solvency fuzzer runner
//! Runs a campaign against the simulated chain and prints the report as JSON

use std::process::ExitCode;

use anyhow::Context;
use dsc_fuzz_chain::SimulatedChainFactory;
use dsc_fuzz_config::FuzzConfig;
use dsc_fuzz_engine::Fuzzer;
use tracing::{error, info};

fn main() -> anyhow::Result<ExitCode> {
  dsc_fuzz_telemetry::init("info")?;

  let config = FuzzConfig::from_env().context("loading fuzzer configuration")?;
  let fuzzer = Fuzzer::new(config, SimulatedChainFactory::default()).context("building fuzzer")?;
  let report = fuzzer.run().context("running campaign")?;

  println!("{}", serde_json::to_string_pretty(&report)?);

  if report.is_failure() {
    let len = report.counterexample().map_or(0, |sequence| sequence.len());
    error!(seed = report.seed, trials = report.trials_run, counterexample_len = len, "solvency check failed");
    return Ok(ExitCode::FAILURE);
  }

  info!(seed = report.seed, trials = report.trials_run, "solvency check passed");
  Ok(ExitCode::SUCCESS)
}
