//! Turn a verdict into the chat message.

use url::Url;

use crate::types::*;

pub const SENDER_NAME: &str = "Sonar Slack Pusher";
pub const NO_ISSUES_TEXT: &str = "No Issues found";
pub const ISSUES_TEXT: &str = "Issues found";

const DASHBOARD_PATH: &str = "/dashboard/index/";

/// Per-cycle inputs the composer needs besides the verdict.
#[derive(Debug, Clone, Copy)]
pub struct Headline<'a> {
  pub sonar_url: &'a str,
  pub job_name: &'a str,
  pub channel: Option<&'a str>,
}

/// Final gate status and its display text.
///
/// Without an alert, new violations alone fail the gate.
pub fn resolve_status(verdict: &Verdict) -> (GateStatus, String) {
  match &verdict.alert {
    Some(alert) => (alert.status, alert.text.clone()),
    None if verdict.has_violations() => (GateStatus::Error, ISSUES_TEXT.to_string()),
    None => (GateStatus::Green, NO_ISSUES_TEXT.to_string()),
  }
}

/// Link to the project's dashboard, or `None` if no valid URL can be built.
pub fn dashboard_link(sonar_url: &str, id: &str) -> Option<String> {
  let raw = format!("{}{}{}", sonar_url, DASHBOARD_PATH, id);
  let mut url = match Url::parse(&raw) {
    Ok(u) => u,
    Err(e) => {
      tracing::warn!(link = %raw, error = %e, "could not create link to Sonar job");
      return None;
    }
  };
  if url.cannot_be_a_base() {
    tracing::warn!(link = %raw, "could not create link to Sonar job");
    return None;
  }
  let path = collapse_slashes(url.path());
  url.set_path(&path);
  Some(url.to_string())
}

/// One line per non-absent delta, e.g. `Major Violation added:3`.
pub fn violation_lines(verdict: &Verdict) -> Vec<(Severity, String)> {
  verdict
    .violations()
    .into_iter()
    .map(|(sev, n)| (sev, format!("{} Violation added:{}", sev.label(), n)))
    .collect()
}

pub fn compose(head: &Headline<'_>, verdict: &Verdict) -> NotificationPayload {
  let (status, status_text) = resolve_status(verdict);

  let link = dashboard_link(head.sonar_url, &verdict.dashboard_id);
  let mut text = match link {
    Some(l) => format!("<{}|*Sonar job*>", l),
    None => "*Sonar job*".to_string(),
  };
  text.push_str(&format!("\n*Job:* {}", head.job_name));
  if let Some(branch) = &verdict.branch {
    text.push_str(&format!("\n*Branch:* {}", branch));
  }

  let fields = violation_lines(verdict)
    .into_iter()
    .map(|(sev, line)| AttachmentField {
      title: sev.label().to_string(),
      value: line,
      short: false,
    })
    .collect();

  NotificationPayload {
    channel: head.channel.map(String::from),
    username: SENDER_NAME.to_string(),
    text,
    attachments: vec![Attachment {
      fallback: status_text.clone(),
      color: status.color().to_string(),
      title: status,
      text: status_text,
      fields,
    }],
  }
}

fn collapse_slashes(path: &str) -> String {
  let mut out = String::with_capacity(path.len());
  for c in path.chars() {
    if c == '/' && out.ends_with('/') {
      continue;
    }
    out.push(c);
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  const HEAD: Headline<'static> = Headline {
    sonar_url: "https://sonar.example.com",
    job_name: "proj",
    channel: None,
  };

  fn verdict() -> Verdict {
    Verdict {
      dashboard_id: "202".into(),
      ..Verdict::default()
    }
  }

  #[test]
  fn no_alert_no_violations_is_green() {
    let (status, text) = resolve_status(&verdict());
    assert_eq!(status, GateStatus::Green);
    assert_eq!(text, "No Issues found");
  }

  #[test]
  fn violations_without_alert_are_an_error() {
    let v = Verdict {
      major_delta: Some(3),
      ..verdict()
    };
    let payload = compose(&HEAD, &v);
    let att = &payload.attachments[0];
    assert_eq!(att.title, GateStatus::Error);
    assert_eq!(att.color, "danger");
    assert_eq!(att.text, "Issues found");
    assert_eq!(att.fields.len(), 1);
    assert_eq!(att.fields[0].value, "Major Violation added:3");
  }

  #[test]
  fn server_alert_is_used_verbatim() {
    let v = Verdict {
      alert: Some(GateAlert {
        status: GateStatus::Warn,
        text: "Coverage on new code < 80".into(),
      }),
      minor_delta: Some(1),
      ..verdict()
    };
    let (status, text) = resolve_status(&v);
    assert_eq!(status, GateStatus::Warn);
    assert_eq!(text, "Coverage on new code < 80");
  }

  #[test]
  fn headline_links_dashboard_and_names_branch() {
    let v = Verdict {
      branch: Some("develop".into()),
      ..verdict()
    };
    let payload = compose(&HEAD, &v);
    assert_eq!(
      payload.text,
      "<https://sonar.example.com/dashboard/index/202|*Sonar job*>\n*Job:* proj\n*Branch:* develop"
    );
    assert_eq!(payload.username, "Sonar Slack Pusher");
    assert!(payload.channel.is_none());
  }

  #[test]
  fn link_path_separators_are_normalized() {
    assert_eq!(
      dashboard_link("http://sonar:9000//ctx/", "7").as_deref(),
      Some("http://sonar:9000/ctx/dashboard/index/7")
    );
    assert_eq!(
      dashboard_link("http://sonar/a/../b", "1").as_deref(),
      Some("http://sonar/b/dashboard/index/1")
    );
  }

  #[test]
  fn bad_base_url_omits_link() {
    assert!(dashboard_link("not a url", "1").is_none());
    let payload = compose(
      &Headline {
        sonar_url: "::",
        ..HEAD
      },
      &verdict(),
    );
    assert!(payload.text.starts_with("*Sonar job*\n*Job:* proj"));
  }

  #[test]
  fn channel_override_is_serialized_only_when_set() {
    let json = serde_json::to_value(compose(&HEAD, &verdict())).unwrap();
    assert!(json.get("channel").is_none());
    assert!(json["attachments"][0].get("fields").is_none());

    let head = Headline {
      channel: Some("#quality"),
      ..HEAD
    };
    let json = serde_json::to_value(compose(&head, &verdict())).unwrap();
    assert_eq!(json["channel"], "#quality");
    assert_eq!(json["attachments"][0]["title"], "GREEN");
    assert_eq!(json["attachments"][0]["color"], "good");
  }

  #[test]
  fn payload_round_trips_through_json() {
    let v = Verdict {
      alert: Some(GateAlert {
        status: GateStatus::Error,
        text: "Foo".into(),
      }),
      critical_delta: Some(1),
      major_delta: Some(3),
      branch: Some("branchX".into()),
      ..verdict()
    };
    let head = Headline {
      channel: Some("#builds"),
      ..HEAD
    };
    let payload = compose(&head, &v);
    let text = serde_json::to_string(&payload).unwrap();
    let back: NotificationPayload = serde_json::from_str(&text).unwrap();
    assert_eq!(back, payload);
    assert_eq!(back.attachments[0].fields[0].value, "Critical Violation added:1");
  }
}
