//! Core types for the notifier (JSON contracts + internal models).

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Inbound types (JSON contract with the analysis server)
// ---------------------------------------------------------------------------

/// One project record from `/api/resources`. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportEntry {
  pub name: String,
  #[serde(default)]
  pub branch: Option<String>,
  #[serde(deserialize_with = "string_or_number")]
  pub id: String,
  #[serde(default, rename = "msr", alias = "measures")]
  pub measures: Vec<Measure>,
}

/// One metric of a project snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct Measure {
  pub key: String,
  #[serde(default, rename = "alert", alias = "alertLevel")]
  pub alert_level: Option<String>,
  #[serde(default, rename = "alert_text", alias = "alertText")]
  pub alert_text: Option<String>,
  #[serde(
    default,
    rename = "fvar1",
    alias = "delta",
    deserialize_with = "opt_string_or_number"
  )]
  pub delta: Option<String>,
}

/// Measure keys this notifier understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureKey {
  AlertStatus,
  NewCriticalViolations,
  NewMajorViolations,
  NewMinorViolations,
}

impl MeasureKey {
  pub fn parse(key: &str) -> Option<Self> {
    match key {
      "alert_status" => Some(Self::AlertStatus),
      "new_critical_violations" => Some(Self::NewCriticalViolations),
      "new_major_violations" => Some(Self::NewMajorViolations),
      "new_minor_violations" => Some(Self::NewMinorViolations),
      _ => None,
    }
  }
}

/// Sonar serves ids and trend values either as JSON strings or numbers.
fn string_or_number<'de, D>(de: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Raw {
    Text(String),
    Int(i64),
    Float(f64),
  }

  Ok(match Raw::deserialize(de)? {
    Raw::Text(s) => s,
    Raw::Int(n) => n.to_string(),
    Raw::Float(f) => f.to_string(),
  })
}

fn opt_string_or_number<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  struct Wrap(#[serde(deserialize_with = "string_or_number")] String);

  Ok(Option::<Wrap>::deserialize(de)?.map(|w| w.0))
}

// ---------------------------------------------------------------------------
// Gate status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateStatus {
  Green,
  Warn,
  Error,
}

impl GateStatus {
  /// Alert levels that count as a failed gate. `OK` and anything unknown yield `None`.
  pub fn from_alert_level(level: &str) -> Option<Self> {
    if level.eq_ignore_ascii_case("ERROR") {
      Some(Self::Error)
    } else if level.eq_ignore_ascii_case("WARN") {
      Some(Self::Warn)
    } else {
      None
    }
  }

  /// Slack attachment color.
  pub fn color(self) -> &'static str {
    match self {
      Self::Green => "good",
      Self::Warn => "warning",
      Self::Error => "danger",
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Green => "GREEN",
      Self::Warn => "WARN",
      Self::Error => "ERROR",
    }
  }
}

impl fmt::Display for GateStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ---------------------------------------------------------------------------
// Verdict (derived, one per cycle)
// ---------------------------------------------------------------------------

/// Alert reported by the server's `alert_status` measure. Text is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateAlert {
  pub status: GateStatus,
  pub text: String,
}

/// Result of evaluating one report entry.
///
/// Deltas are `Some` only when non-zero; a zero delta must not produce a
/// violation line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
  pub alert: Option<GateAlert>,
  pub critical_delta: Option<u64>,
  pub major_delta: Option<u64>,
  pub minor_delta: Option<u64>,
  pub dashboard_id: String,
  pub branch: Option<String>,
}

impl Verdict {
  pub fn has_violations(&self) -> bool {
    self.critical_delta.is_some() || self.major_delta.is_some() || self.minor_delta.is_some()
  }

  /// Non-absent deltas, most severe first.
  pub fn violations(&self) -> Vec<(Severity, u64)> {
    [
      (Severity::Critical, self.critical_delta),
      (Severity::Major, self.major_delta),
      (Severity::Minor, self.minor_delta),
    ]
    .into_iter()
    .filter_map(|(sev, delta)| delta.map(|n| (sev, n)))
    .collect()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
  Critical,
  Major,
  Minor,
}

impl Severity {
  pub fn label(self) -> &'static str {
    match self {
      Self::Critical => "Critical",
      Self::Major => "Major",
      Self::Minor => "Minor",
    }
  }
}

// ---------------------------------------------------------------------------
// Outbound types (JSON contract with the chat webhook)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub channel: Option<String>,
  pub username: String,
  pub text: String,
  pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
  pub fallback: String,
  pub color: String,
  pub title: GateStatus,
  pub text: String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub fields: Vec<AttachmentField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentField {
  pub title: String,
  pub value: String,
  pub short: bool,
}
