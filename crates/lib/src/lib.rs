//! preflight-lib: bootstrap and sanity checks for a three-store backend
//!
//! A run seeds and then verifies, in a fixed order:
//! - `document`: an ArangoDB database, collection and keyed test document
//! - `relational`: a PostgreSQL database, table and named test row
//! - `cache`: two Redis keys
//!
//! Every stage probes the store's TCP port first and the first failure ends
//! the run. See [`pipeline::run`].

pub mod arango;
pub mod cache;
pub mod config;
pub mod consts;
pub mod document;
pub mod error;
pub mod latency;
pub mod pipeline;
pub mod probe;
pub mod relational;
pub mod report;
pub mod retry;

#[cfg(test)]
mod testutil;

pub use config::Config;
pub use error::{CheckError, Store};
pub use pipeline::{Backends, Progress, Stage, StageError, run};
pub use report::StageReport;
