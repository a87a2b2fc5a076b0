//! ApiClient: thin JSON-over-HTTP helper shared by the HTTP governance and run backends.

use std::time::Duration;

use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{BackendError, ValidationError};

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

fn transport(e: reqwest::Error) -> BackendError {
    BackendError::Transport(e.to_string())
}

impl ApiClient {
    /// `timeout` bounds connect and each JSON request; event streams are only bounded on connect.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(transport)?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_settings(settings: &env_config::Settings) -> Result<Self, BackendError> {
        Self::new(settings.api_url.clone(), settings.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn check(resp: Response) -> Result<Response, BackendError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// GET `path` and decode the JSON body. Undecodable bodies are validation errors.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let resp = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport)?;
        let bytes = Self::check(resp).await?.bytes().await.map_err(transport)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| BackendError::Validation(ValidationError::Malformed(e.to_string())))
    }

    /// Sends `body` as JSON with `method`; any 2xx counts as acknowledgement.
    pub async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<(), BackendError> {
        let url = self.url(path);
        debug!(%url, %method, "send");
        let resp = self
            .http
            .request(method, &url)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        Self::check(resp).await.map(|_| ())
    }

    /// Opens a `text/event-stream` GET; the caller reads the body incrementally.
    pub async fn open_event_stream(&self, path: &str) -> Result<Response, BackendError> {
        let url = self.url(path);
        debug!(%url, "GET (event stream)");
        let resp = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(transport)?;
        Self::check(resp).await
    }
}
