mod cmd;
mod output;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// preflight - seed and sanity-check ArangoDB, PostgreSQL and Redis
///
/// Store addresses can be overridden with PREFLIGHT_{ARANGODB,POSTGRES,REDIS}_{HOST,PORT}.
#[derive(Parser)]
#[command(name = "preflight")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long)]
  verbose: bool,

  /// How long to stay up after all checks pass (e.g. "10s", "1m")
  #[arg(long, value_parser = humantime::parse_duration)]
  linger: Option<Duration>,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  cmd::cmd_run(cli.verbose, cli.linger)
}
