//! HTTP transport to the dashboard backend

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::config::BackendConfig;
use crate::query::join_url;
use crate::{Error, Result};

/// Request transport used by the dispatcher
///
/// Implementations return the decoded JSON body of a 2xx response and map
/// everything else (network errors, 4xx/5xx, non-JSON bodies) to an error.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET for `path` with the given query pairs
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value>;

    /// Issue a POST of a JSON body to `path`
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value>;
}

/// [`Transport`] over `reqwest`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport from backend settings
    ///
    /// # Errors
    ///
    /// Returns error if the auth header is invalid or the client can't be built
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();

        if let Some(ref token) = config.auth_token {
            let name = HeaderName::from_bytes(config.auth_header.as_bytes()).map_err(|e| {
                Error::Config(format!("invalid auth header {:?}: {e}", config.auth_header))
            })?;
            let mut value = HeaderValue::from_str(token)
                .map_err(|e| Error::Config(format!("invalid auth token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL every path is joined onto
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check the status and decode the JSON body
    async fn read_json(response: reqwest::Response) -> Result<Value> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| Error::MalformedResponse(format!("response body is not JSON: {e}")))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value> {
        let url = join_url(&self.base_url, path);
        tracing::trace!(%url, params = query.len(), "GET");

        let response = self.client.get(&url).query(query).send().await?;
        Self::read_json(response).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = join_url(&self.base_url, path);
        tracing::trace!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await?;
        Self::read_json(response).await
    }
}
