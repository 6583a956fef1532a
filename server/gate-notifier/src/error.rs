//! Structured error types for the notifier.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifierError {
  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  #[error("unresolved variable: ${{{0}}}")]
  Unresolved(String),

  #[error("transport: {0}")]
  Transport(String),

  #[error("non 200 response: '{code} : {reason}'")]
  Status { code: u16, reason: String },

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("no project named '{0}' in the analysis report")]
  ProjectNotFound(String),
}

impl NotifierError {
  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn transport(msg: impl Into<String>) -> Self {
    Self::Transport(msg.into())
  }

  /// Errors that end a cycle before anything is sent.
  pub fn is_fatal(&self) -> bool {
    matches!(
      self,
      Self::Transport(_) | Self::Status { .. } | Self::Json(_) | Self::ProjectNotFound(_)
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_error_mentions_code_and_reason() {
    let err = NotifierError::Status {
      code: 401,
      reason: "Unauthorized".into(),
    };
    assert_eq!(err.to_string(), "non 200 response: '401 : Unauthorized'");
  }

  #[test]
  fn unresolved_error_shows_token() {
    let err = NotifierError::Unresolved("GIT_BRANCH".into());
    assert_eq!(err.to_string(), "unresolved variable: ${GIT_BRANCH}");
  }

  #[test]
  fn only_fetch_and_parse_errors_are_fatal() {
    assert!(NotifierError::ProjectNotFound("p".into()).is_fatal());
    assert!(NotifierError::transport("refused").is_fatal());
    assert!(!NotifierError::Unresolved("X".into()).is_fatal());
    assert!(!NotifierError::validation("hook", "must not be empty").is_fatal());
  }
}
