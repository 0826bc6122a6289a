use std::time::Duration;

use anyhow::Context;
use b2i_shared::postgrest::{
  ApiError,
  ClientConfig,
  Method,
  Request,
  Response
};
use tracing::{
  debug,
  warn
};

use super::Backend;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Executes requests against the hosted
/// store over HTTPS.
#[derive(Debug, Clone)]
pub struct RestBackend {
  http:   reqwest::blocking::Client,
  config: ClientConfig
}

impl RestBackend {
  pub fn new(
    config: ClientConfig
  ) -> anyhow::Result<Self> {
    let http =
      reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(
          REQUEST_TIMEOUT_SECS
        ))
        .build()
        .context(
          "failed building HTTP client \
           for the remote store"
        )?;
    Ok(Self { http, config })
  }
}

impl Backend for RestBackend {
  #[tracing::instrument(
    skip(self, request),
    fields(
      method = request.method.as_str(),
      path = %request.path
    )
  )]
  fn execute(
    &self,
    request: &Request
  ) -> Result<Response, ApiError> {
    let url = request.url(&self.config.url)?;
    let method = match request.method {
      | Method::Get => reqwest::Method::GET,
      | Method::Post => reqwest::Method::POST,
      | Method::Patch => {
        reqwest::Method::PATCH
      }
      | Method::Delete => {
        reqwest::Method::DELETE
      }
    };

    let mut builder =
      self.http.request(method, url.as_str());
    for (name, value) in &request.headers {
      builder =
        builder.header(name.as_str(), value.as_str());
    }
    if let Some(body) = request.body_text() {
      builder = builder.body(body);
    }

    let response =
      builder.send().map_err(|err| {
        warn!(error = %err, "request failed");
        ApiError::Transport(err.to_string())
      })?;
    let status = response.status().as_u16();
    let body = response.text().map_err(
      |err| {
        ApiError::Transport(format!(
          "failed reading response body: \
           {err}"
        ))
      }
    )?;

    debug!(status, bytes = body.len(), "response received");
    Ok(Response::new(status, body))
  }
}
