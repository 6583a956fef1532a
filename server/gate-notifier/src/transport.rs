//! HTTP seam: the two single-shot calls a cycle makes.

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use crate::config::BasicAuth;
use crate::error::NotifierError;

/// Status line and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
  pub status: u16,
  pub reason: String,
  pub body: String,
}

impl HttpReply {
  pub fn is_ok(&self) -> bool {
    self.status == 200
  }
}

/// Blocking request/response transport. One attempt per call, no retries.
pub trait Transport {
  fn get(&self, url: &str, auth: Option<&BasicAuth>) -> Result<HttpReply, NotifierError>;

  fn post_json(&self, url: &str, body: &str) -> Result<HttpReply, NotifierError>;
}

impl<T: Transport + ?Sized> Transport for &T {
  fn get(&self, url: &str, auth: Option<&BasicAuth>) -> Result<HttpReply, NotifierError> {
    (**self).get(url, auth)
  }

  fn post_json(&self, url: &str, body: &str) -> Result<HttpReply, NotifierError> {
    (**self).post_json(url, body)
  }
}

/// `reqwest` transport. A client lives only for the call it serves.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpTransport;

impl HttpTransport {
  fn client() -> Result<Client, NotifierError> {
    Client::builder()
      .build()
      .map_err(|e| NotifierError::transport(e.to_string()))
  }

  fn read(resp: reqwest::blocking::Response) -> Result<HttpReply, NotifierError> {
    let status = resp.status();
    let body = resp
      .text()
      .map_err(|e| NotifierError::transport(e.to_string()))?;
    Ok(HttpReply {
      status: status.as_u16(),
      reason: status.canonical_reason().unwrap_or_default().to_string(),
      body,
    })
  }
}

impl Transport for HttpTransport {
  fn get(&self, url: &str, auth: Option<&BasicAuth>) -> Result<HttpReply, NotifierError> {
    let client = Self::client()?;
    let mut req = client.get(url);
    if let Some(auth) = auth {
      req = req.header(AUTHORIZATION, auth.header_value());
    }
    let resp = req
      .send()
      .map_err(|e| NotifierError::transport(e.to_string()))?;
    Self::read(resp)
  }

  fn post_json(&self, url: &str, body: &str) -> Result<HttpReply, NotifierError> {
    let client = Self::client()?;
    let resp = client
      .post(url)
      .header(CONTENT_TYPE, "application/json")
      .body(body.to_string())
      .send()
      .map_err(|e| NotifierError::transport(e.to_string()))?;
    Self::read(resp)
  }
}
