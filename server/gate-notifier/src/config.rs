//! Notifier configuration: endpoints, name templates and credentials.

use url::Url;

use crate::error::NotifierError;

/// Credentials for the analysis server. Only built for a non-empty username.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
  pub username: String,
  pub password: String,
}

impl BasicAuth {
  /// Value for the `Authorization` header.
  pub fn header_value(&self) -> String {
    use base64::Engine as _;
    let raw = format!("{}:{}", self.username, self.password);
    format!("Basic {}", base64::engine::general_purpose::STANDARD.encode(raw))
  }
}

impl std::fmt::Debug for BasicAuth {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("BasicAuth")
      .field("username", &self.username)
      .field("password", &"***")
      .finish()
  }
}

#[derive(Debug, Clone)]
pub struct Config {
  /// Chat webhook the notification is posted to.
  pub hook: String,
  /// Analysis server base URL, without trailing slash.
  pub sonar_url: String,
  /// Project name template; may contain `${VAR}` tokens.
  pub job_name: String,
  /// Branch template appended to the job name; empty means no branch.
  pub branch_name: String,
  /// Channel override for the webhook's default channel.
  pub channel: Option<String>,
  pub auth: Option<BasicAuth>,
}

impl Config {
  /// Build a config from raw settings, trimming every value.
  pub fn new(
    hook: &str,
    sonar_url: &str,
    job_name: &str,
    branch_name: &str,
    channel: Option<&str>,
    username: Option<&str>,
    password: Option<&str>,
  ) -> Self {
    let sonar_url = sonar_url.trim();
    let sonar_url = sonar_url.strip_suffix('/').unwrap_or(sonar_url);

    let channel = channel.map(str::trim).filter(|c| !c.is_empty()).map(String::from);
    let auth = username
      .map(str::trim)
      .filter(|u| !u.is_empty())
      .map(|u| BasicAuth {
        username: u.to_string(),
        password: password.unwrap_or_default().to_string(),
      });

    Self {
      hook: hook.trim().to_string(),
      sonar_url: sonar_url.to_string(),
      job_name: job_name.trim().to_string(),
      branch_name: branch_name.trim().to_string(),
      channel,
      auth,
    }
  }

  /// Reject configurations no cycle could succeed with.
  pub fn validate(&self) -> Result<(), NotifierError> {
    check_url("hook", &self.hook)?;
    check_url("sonar_url", &self.sonar_url)?;
    if self.job_name.is_empty() {
      return Err(NotifierError::validation(
        "job_name",
        "please enter a Sonar job name",
      ));
    }
    Ok(())
  }
}

fn check_url(field: &str, value: &str) -> Result<(), NotifierError> {
  if value.is_empty() {
    return Err(NotifierError::validation(field, "please specify a valid URL"));
  }
  Url::parse(value)
    .map(|_| ())
    .map_err(|e| NotifierError::validation(field, &format!("please specify a valid URL: {}", e)))
}
