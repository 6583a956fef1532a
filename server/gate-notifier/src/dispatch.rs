//! Notification cycle: resolve name, fetch, parse, compose, send.

use std::fmt;

use crate::compose::{self, Headline};
use crate::config::Config;
use crate::env::Environment;
use crate::error::NotifierError;
use crate::report;
use crate::transport::Transport;
use crate::types::{GateStatus, NotificationPayload, Verdict};

/// Query for the measures the verdict is built from.
pub const RESOURCES_PATH: &str = "/api/resources?metrics=alert_status,quality_gate_details,new_major_violations,new_critical_violations,new_minor_violations&includealerts=true&includetrends=true";

/// Steps of one cycle, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  ResolveName,
  Fetch,
  Parse,
  Compose,
  Send,
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::ResolveName => "resolve_name",
      Self::Fetch => "fetch",
      Self::Parse => "parse",
      Self::Compose => "compose",
      Self::Send => "send",
    })
  }
}

/// Names resolved for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNames {
  pub job_name: String,
  pub branch: Option<String>,
}

impl ResolvedNames {
  pub fn target(&self) -> String {
    report::target_name(&self.job_name, self.branch.as_deref())
  }
}

/// Outcome of a cycle that reached the send step.
#[derive(Debug, Clone)]
pub struct CycleReport {
  pub names: ResolvedNames,
  pub verdict: Verdict,
  pub payload: NotificationPayload,
  /// Whether the chat server accepted the message. Not part of cycle success.
  pub delivered: bool,
}

impl CycleReport {
  pub fn status(&self) -> Option<GateStatus> {
    self.payload.attachments.first().map(|a| a.title)
  }
}

/// Runs notification cycles against one configuration.
pub struct Notifier<T> {
  config: Config,
  transport: T,
}

impl<T: Transport> Notifier<T> {
  pub fn new(config: Config, transport: T) -> Self {
    Self { config, transport }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Run one cycle. `Err` means the cycle aborted before anything was sent.
  pub fn run_cycle(&self, env: &Environment) -> Result<CycleReport, NotifierError> {
    let names = self.resolve_names(env);
    let target = names.target();
    tracing::debug!(phase = %Phase::ResolveName, target = %target, "resolved project name");

    let body = self.fetch_report()?;

    let verdict = report::verdict_for(&body, &target)?;
    tracing::debug!(phase = %Phase::Parse, ?verdict, "evaluated quality gate");

    let payload = compose::compose(
      &Headline {
        sonar_url: &self.config.sonar_url,
        job_name: &names.job_name,
        channel: self.config.channel.as_deref(),
      },
      &verdict,
    );
    if verdict.alert.is_none() && !verdict.has_violations() {
      tracing::info!(
        project = %target,
        "no failed quality checks found for project, nothing to report"
      );
    }

    let delivered = self.send(&payload);

    Ok(CycleReport {
      names,
      verdict,
      payload,
      delivered,
    })
  }

  /// Resolution never aborts: a missing branch variable drops the suffix,
  /// a missing job variable keeps the template text.
  fn resolve_names(&self, env: &Environment) -> ResolvedNames {
    let job_name = env.resolve(&self.config.job_name).unwrap_or_else(|e| {
      tracing::warn!(phase = %Phase::ResolveName, error = %e, "using job name template as is");
      self.config.job_name.clone()
    });

    let branch = match env.resolve(&self.config.branch_name) {
      Ok(b) if !b.trim().is_empty() => Some(b.trim().to_string()),
      Ok(_) => None,
      Err(e) => {
        tracing::warn!(phase = %Phase::ResolveName, error = %e, "no branch suffix");
        None
      }
    };

    ResolvedNames { job_name, branch }
  }

  fn fetch_report(&self) -> Result<String, NotifierError> {
    let url = format!("{}{}", self.config.sonar_url, RESOURCES_PATH);
    tracing::info!(phase = %Phase::Fetch, url = %url, "calling SonarQube");

    let reply = self
      .transport
      .get(&url, self.config.auth.as_ref())
      .inspect_err(|e| {
        tracing::error!(phase = %Phase::Fetch, error = %e, "could not get Sonar results");
      })?;

    if !reply.is_ok() {
      let err = NotifierError::Status {
        code: reply.status,
        reason: reply.reason,
      };
      tracing::error!(phase = %Phase::Fetch, error = %err, "got a non 200 response from SonarQube");
      return Err(err);
    }
    Ok(reply.body)
  }

  /// Post the payload. Failures are logged and reported as `false`.
  fn send(&self, payload: &NotificationPayload) -> bool {
    let body = match serde_json::to_string(payload) {
      Ok(b) => b,
      Err(e) => {
        tracing::warn!(phase = %Phase::Compose, error = %e, "could not serialize notification");
        return false;
      }
    };

    tracing::info!(phase = %Phase::Send, "pushing notification to the Slack channel");
    match self.transport.post_json(&self.config.hook, &body) {
      Ok(reply) if reply.is_ok() => true,
      Ok(reply) => {
        tracing::warn!(
          phase = %Phase::Send,
          status = reply.status,
          body = %body,
          "could not push to Slack, got a non 200 response"
        );
        false
      }
      Err(e) => {
        tracing::warn!(phase = %Phase::Send, error = %e, "could not push to Slack");
        false
      }
    }
  }
}
