//! The six-stage bootstrap-then-verify run.
//!
//! Stages run strictly in order and the first failure ends the run:
//! 1. document store setup
//! 2. relational store setup
//! 3. cache setup
//! 4. document store check
//! 5. relational store check
//! 6. cache check

use std::fmt;

use thiserror::Error;
use tracing::{error, info};

use crate::cache::{self, CacheBackend, RedisBackend};
use crate::config::Config;
use crate::document::{self, ArangoBackend, DocumentBackend};
use crate::error::{CheckError, Store};
use crate::relational::{self, PostgresBackend, RelationalBackend};
use crate::report::StageReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
  SetupDocument,
  SetupRelational,
  SetupCache,
  VerifyDocument,
  VerifyRelational,
  VerifyCache,
}

impl Stage {
  /// Execution order.
  pub const ALL: [Stage; 6] = [
    Stage::SetupDocument,
    Stage::SetupRelational,
    Stage::SetupCache,
    Stage::VerifyDocument,
    Stage::VerifyRelational,
    Stage::VerifyCache,
  ];

  pub fn store(&self) -> Store {
    match self {
      Stage::SetupDocument | Stage::VerifyDocument => Store::Document,
      Stage::SetupRelational | Stage::VerifyRelational => Store::Relational,
      Stage::SetupCache | Stage::VerifyCache => Store::Cache,
    }
  }

  pub fn is_setup(&self) -> bool {
    matches!(self, Stage::SetupDocument | Stage::SetupRelational | Stage::SetupCache)
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_setup() {
      write!(f, "{} setup", self.store())
    } else {
      write!(f, "{} sanity check", self.store())
    }
  }
}

/// The stage that stopped the run and why.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct StageError {
  pub stage: Stage,
  #[source]
  pub source: CheckError,
}

/// Receives each stage's report as soon as the stage passes.
pub trait Progress {
  fn stage_passed(&mut self, stage: Stage, report: &StageReport);
}

/// Discards all progress.
impl Progress for () {
  fn stage_passed(&mut self, _stage: Stage, _report: &StageReport) {}
}

/// The three store backends a run talks to.
#[derive(Debug, Clone)]
pub struct Backends<D, R, C> {
  pub document: D,
  pub relational: R,
  pub cache: C,
}

impl Backends<ArangoBackend, PostgresBackend, RedisBackend> {
  /// ArangoDB, PostgreSQL and Redis backends for `config`.
  pub fn from_config(config: &Config) -> Self {
    Self {
      document: ArangoBackend::new(&config.document),
      relational: PostgresBackend::new(&config.relational),
      cache: RedisBackend::new(&config.cache.address, config.timing.cache_op_timeout),
    }
  }
}

/// Run every stage in order, stopping at the first failure.
///
/// Returns the reports of all six stages on success.
pub async fn run<D, R, C, P>(
  config: &Config,
  backends: &Backends<D, R, C>,
  progress: &mut P,
) -> Result<Vec<StageReport>, StageError>
where
  D: DocumentBackend,
  R: RelationalBackend,
  C: CacheBackend,
  P: Progress + ?Sized,
{
  let timing = &config.timing;
  let mut reports = Vec::with_capacity(Stage::ALL.len());

  let report = document::bootstrap(&backends.document, &config.document, timing.probe_timeout).await;
  passed(progress, &mut reports, Stage::SetupDocument, report.map(StageReport::DocumentSetup))?;

  let report = relational::bootstrap(&backends.relational, &config.relational, timing.probe_timeout).await;
  passed(progress, &mut reports, Stage::SetupRelational, report.map(StageReport::RelationalSetup))?;

  let report = cache::bootstrap(&backends.cache, &config.cache, timing.probe_timeout).await;
  passed(progress, &mut reports, Stage::SetupCache, report.map(StageReport::CacheSetup))?;

  let report = document::verify(&backends.document, &config.document, &timing.document_retry).await;
  passed(progress, &mut reports, Stage::VerifyDocument, report.map(StageReport::DocumentVerified))?;

  let report = relational::verify(&backends.relational, &config.relational, timing.latency_threshold).await;
  passed(progress, &mut reports, Stage::VerifyRelational, report.map(StageReport::RelationalVerified))?;

  let report = cache::verify(&backends.cache, &config.cache, timing.latency_threshold).await;
  passed(progress, &mut reports, Stage::VerifyCache, report.map(StageReport::CacheVerified))?;

  info!("all sanity checks passed");
  Ok(reports)
}

fn passed<P: Progress + ?Sized>(
  progress: &mut P,
  reports: &mut Vec<StageReport>,
  stage: Stage,
  result: Result<StageReport, CheckError>,
) -> Result<(), StageError> {
  match result {
    Ok(report) => {
      info!(%stage, "stage passed");
      progress.stage_passed(stage, &report);
      reports.push(report);
      Ok(())
    }
    Err(source) => {
      error!(%stage, error = %source, "stage failed");
      Err(StageError { stage, source })
    }
  }
}
