//! Binary entrypoint: validate configuration, run one notification cycle.
//!
//! Exit codes:
//! - 0: the quality gate was evaluated (a failed Slack push still counts)
//! - 1: the cycle aborted (fetch or parse failed)
//! - 2: the configuration is invalid

use clap::Parser;
use gate_notifier::{Config, Environment, HttpTransport, Notifier, NotifierError};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "gate-notifier", about = "Push Sonar quality gate results to Slack")]
struct Cli {
  /// Slack incoming webhook URL.
  #[arg(long, env = "SSP_HOOK")]
  hook: String,

  /// SonarQube base URL.
  #[arg(long, env = "SSP_SONAR_URL")]
  sonar_url: String,

  /// Sonar project name; may contain ${VAR} tokens.
  #[arg(long, env = "SSP_JOB_NAME")]
  job_name: String,

  /// Branch appended to the project name; may contain ${VAR} tokens.
  #[arg(long, env = "SSP_BRANCH_NAME", default_value = "")]
  branch_name: String,

  /// Post to this channel instead of the webhook default.
  #[arg(long, env = "SSP_CHANNEL")]
  channel: Option<String>,

  #[arg(long, env = "SSP_USERNAME")]
  username: Option<String>,

  #[arg(long, env = "SSP_PASSWORD", hide_env_values = true)]
  password: Option<String>,

  /// Build parameter KEY=VALUE; overrides environment variables of the same name.
  #[arg(long = "param", value_parser = parse_param)]
  params: Vec<(String, String)>,

  #[arg(short, long)]
  verbose: bool,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
  raw
    .split_once('=')
    .map(|(k, v)| (k.trim().to_string(), v.to_string()))
    .filter(|(k, _)| !k.is_empty())
    .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))
}

fn main() {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
    )
    .with_target(false)
    .with_writer(std::io::stderr)
    .init();

  if let Err(e) = run(cli) {
    tracing::error!(error = %e, "notification cycle failed");
    std::process::exit(if e.is_fatal() { 1 } else { 2 });
  }
}

fn run(cli: Cli) -> Result<(), NotifierError> {
  let config = Config::new(
    &cli.hook,
    &cli.sonar_url,
    &cli.job_name,
    &cli.branch_name,
    cli.channel.as_deref(),
    cli.username.as_deref(),
    cli.password.as_deref(),
  );
  config.validate()?;

  let env = Environment::layered(std::env::vars(), cli.params);
  let notifier = Notifier::new(config, HttpTransport);
  let report = notifier.run_cycle(&env)?;

  tracing::info!(
    project = %report.names.target(),
    status = ?report.status(),
    delivered = report.delivered,
    "cycle complete"
  );
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn param_splits_on_first_equals() {
    assert_eq!(
      parse_param("QUERY=a=b").unwrap(),
      ("QUERY".to_string(), "a=b".to_string())
    );
    assert!(parse_param("NOEQUALS").is_err());
    assert!(parse_param("=value").is_err());
  }

  #[test]
  fn cli_collects_repeated_params() {
    let cli = Cli::try_parse_from([
      "gate-notifier",
      "--hook",
      "https://hooks.example.com/x",
      "--sonar-url",
      "http://sonar",
      "--job-name",
      "proj",
      "--param",
      "A=1",
      "--param",
      "B=2",
    ])
    .unwrap();
    assert_eq!(cli.params.len(), 2);
    assert_eq!(cli.branch_name, "");
  }
}
