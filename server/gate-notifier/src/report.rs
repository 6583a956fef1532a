//! Parse the analysis server's resource report and derive a verdict.

use crate::error::NotifierError;
use crate::types::*;

/// Longest slice of a bad body echoed into the log.
const BODY_EXCERPT_LEN: usize = 512;

/// Project name as the analysis server knows it: `<job> <branch>`.
pub fn target_name(job_name: &str, branch: Option<&str>) -> String {
  match branch.map(str::trim).filter(|b| !b.is_empty()) {
    Some(b) => format!("{} {}", job_name, b).trim().to_string(),
    None => job_name.trim().to_string(),
  }
}

/// Deserialize the response body into report entries.
pub fn parse_entries(body: &str) -> Result<Vec<ReportEntry>, NotifierError> {
  serde_json::from_str(body).map_err(|e| {
    tracing::error!(
      error = %e,
      body = excerpt(body),
      "could not parse the response from Sonar"
    );
    NotifierError::Json(e)
  })
}

/// Find the entry named exactly `target` and evaluate its measures.
pub fn evaluate(entries: &[ReportEntry], target: &str) -> Result<Verdict, NotifierError> {
  let entry = entries
    .iter()
    .find(|e| e.name == target)
    .ok_or_else(|| NotifierError::ProjectNotFound(target.to_string()))?;

  let mut verdict = Verdict {
    dashboard_id: entry.id.clone(),
    branch: entry.branch.clone(),
    ..Verdict::default()
  };

  for msr in &entry.measures {
    match MeasureKey::parse(&msr.key) {
      Some(MeasureKey::AlertStatus) => {
        if let Some(alert) = alert_of(msr) {
          verdict.alert = Some(alert);
        }
      }
      Some(MeasureKey::NewCriticalViolations) => verdict.critical_delta = delta_of(msr),
      Some(MeasureKey::NewMajorViolations) => verdict.major_delta = delta_of(msr),
      Some(MeasureKey::NewMinorViolations) => verdict.minor_delta = delta_of(msr),
      None => {}
    }
  }

  Ok(verdict)
}

/// Parse + evaluate in one step; either both succeed or the cycle aborts.
pub fn verdict_for(body: &str, target: &str) -> Result<Verdict, NotifierError> {
  let entries = parse_entries(body)?;
  evaluate(&entries, target).inspect_err(|e| {
    tracing::error!(error = %e, entries = entries.len(), "no matching project in Sonar report");
  })
}

fn alert_of(msr: &Measure) -> Option<GateAlert> {
  let level = msr.alert_level.as_deref()?;
  let status = GateStatus::from_alert_level(level)?;
  let text = msr
    .alert_text
    .as_deref()
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .map(String::from)
    .unwrap_or_else(|| format!("Quality gate status: {}", status));
  Some(GateAlert { status, text })
}

/// Non-zero delta as a count; zero, missing and unreadable values are absent.
fn delta_of(msr: &Measure) -> Option<u64> {
  let raw = msr.delta.as_deref()?.trim();
  let unsigned = raw.strip_prefix('+').unwrap_or(raw);
  let count = match unsigned.parse::<u64>() {
    Ok(n) => n,
    Err(_) => match unsigned.parse::<f64>() {
      Ok(f) if f.is_finite() && f >= 0.0 => f.round() as u64,
      _ => {
        tracing::warn!(key = %msr.key, delta = raw, "ignoring unreadable violation delta");
        return None;
      }
    },
  };
  (count > 0).then_some(count)
}

fn excerpt(body: &str) -> &str {
  if body.len() <= BODY_EXCERPT_LEN {
    return body;
  }
  let mut end = BODY_EXCERPT_LEN;
  while !body.is_char_boundary(end) {
    end -= 1;
  }
  &body[..end]
}
