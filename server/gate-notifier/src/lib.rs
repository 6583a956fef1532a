//! Sonar quality-gate notifier: one synchronous cycle per invocation.
//!
//! Resolves the project name from build variables, fetches the quality-gate
//! measures from the analysis server, derives a GREEN/WARN/ERROR verdict and
//! posts one Slack-compatible message describing it.
//!
//! No retries, no persisted state; each cycle builds everything from scratch.

pub mod compose;
pub mod config;
pub mod dispatch;
pub mod env;
pub mod error;
pub mod report;
pub mod transport;
pub mod types;

pub use config::Config;
pub use dispatch::{CycleReport, Notifier};
pub use env::Environment;
pub use error::NotifierError;
pub use transport::{HttpReply, HttpTransport, Transport};
pub use types::{GateStatus, NotificationPayload, Verdict};
