//! Implementation of the `preflight` run.
//!
//! Seeds the three stores, verifies them, and on success stays up for the
//! configured linger so the container's logs can be read before it exits.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info};

use preflight_lib::report::Provision;
use preflight_lib::{Backends, Config, Progress, Stage, StageReport, run};

use crate::output::{format_duration, print_error, print_info, print_stat, print_success};

/// Prints confirmation lines as stages pass.
struct Printer {
  verbose: bool,
}

impl Progress for Printer {
  fn stage_passed(&mut self, _stage: Stage, report: &StageReport) {
    for line in confirmations(report) {
      print_success(&line);
    }
    if self.verbose {
      for (label, value) in stats(report) {
        print_stat(label, &value);
      }
    }
  }
}

/// Execute the full bootstrap and sanity-check run.
///
/// Exits the process with status 1 on the first failed stage.
pub fn cmd_run(verbose: bool, linger: Option<Duration>) -> Result<()> {
  let mut config = Config::from_env().context("Failed to load configuration")?;
  if let Some(linger) = linger {
    config.timing.linger = linger;
  }
  info!(
    arangodb = %config.document.address,
    postgres = %config.relational.address,
    redis = %config.cache.address,
    "starting preflight run"
  );
  let backends = Backends::from_config(&config);
  let mut printer = Printer { verbose };

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  if let Err(err) = rt.block_on(run(&config, &backends, &mut printer)) {
    error!(stage = %err.stage, "preflight run aborted");
    print_error(&err.to_string());
    std::process::exit(1);
  }

  print_success("All sanity checks passed.");
  print_info(&format!(
    "Sleeping for {}...",
    humantime::format_duration(config.timing.linger)
  ));
  info!(linger = ?config.timing.linger, "holding process open");
  rt.block_on(tokio::time::sleep(config.timing.linger));
  info!("linger elapsed, exiting");

  Ok(())
}

fn created_or_exists(kind: &str, name: &str, state: Provision) -> String {
  match state {
    Provision::Created => format!("{} '{}' created", kind, name),
    Provision::AlreadyPresent => format!("{} '{}' already exists", kind, name),
  }
}

fn confirmations(report: &StageReport) -> Vec<String> {
  match report {
    StageReport::DocumentSetup(setup) => vec![
      created_or_exists("ArangoDB database", &setup.database, setup.database_state),
      created_or_exists("ArangoDB collection", &setup.collection, setup.collection_state),
      match setup.document_state {
        Provision::Created => "ArangoDB test document inserted".to_string(),
        Provision::AlreadyPresent => "ArangoDB test document already exists, skipping insertion".to_string(),
      },
    ],
    StageReport::RelationalSetup(setup) => vec![
      created_or_exists("PostgreSQL database", &setup.database, setup.database_state),
      format!("PostgreSQL table '{}' created or already exists", setup.table),
      match setup.row_state() {
        Provision::Created => "PostgreSQL test row inserted".to_string(),
        Provision::AlreadyPresent => "PostgreSQL test row already present".to_string(),
      },
    ],
    StageReport::CacheSetup(setup) => setup.keys.iter().map(|key| format!("Redis key '{}' set", key)).collect(),
    StageReport::DocumentVerified(_) => vec!["ArangoDB Sanity Check passed with document validation".to_string()],
    StageReport::RelationalVerified(_) => {
      vec!["PostgreSQL Sanity Check passed with row validation and performance check".to_string()]
    }
    StageReport::CacheVerified(verified) => vec![
      format!("Redis ping response: {}", verified.pong),
      "Redis Sanity Check passed with key validation and performance check".to_string(),
    ],
  }
}

fn stats(report: &StageReport) -> Vec<(&'static str, String)> {
  match report {
    StageReport::DocumentVerified(verified) => vec![
      ("Server", format!("{} {}", verified.server.server, verified.server.version)),
      ("Attempts", verified.attempts.to_string()),
    ],
    StageReport::RelationalVerified(verified) => vec![
      ("Matching rows", verified.matching_rows.to_string()),
      ("Response time", format_duration(verified.latency)),
    ],
    StageReport::CacheVerified(verified) => vec![("Response time", format_duration(verified.latency))],
    _ => Vec::new(),
  }
}
