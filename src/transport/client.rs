// HTTP transport for the key-value service.
// Builds requests against the configured host and maps statuses and bodies to errors.

use async_trait::async_trait;
use reqwest::{
    Client, Response,
    header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT},
};
use serde_json::Value;
use tracing::debug;

use crate::config::KvConfig;
use crate::error::{KvError, Result};

use super::Transport;

const USER_AGENT_VALUE: &str = concat!("ezkv/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    origin: String,
}

impl HttpTransport {
    /// Create a transport for the host in `config`.
    pub fn new(config: &KvConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(KvError::Network)?;

        Ok(Self {
            client,
            origin: config.origin(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.origin, path)
    }

    /// Check response status and convert errors.
    fn check_response(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(KvError::Status {
                status,
                url: response.url().to_string(),
            })
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, path: &str) -> Result<Value> {
        let url = self.url(path);
        debug!(url = %url, "GET");

        let response = self.client.get(&url).send().await?;
        debug!(url = %url, status = %response.status(), "GET response");
        let response = Self::check_response(response)?;

        // Decode separately so a bad body is a parse error, not a network one.
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn put(&self, path: &str, body: &Value) -> Result<()> {
        let url = self.url(path);
        let data = serde_json::to_string(body)?;
        debug!(url = %url, bytes = data.len(), "PUT");

        let response = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(data)
            .send()
            .await?;
        debug!(url = %url, status = %response.status(), "PUT response");
        Self::check_response(response)?;
        Ok(())
    }

    async fn del(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        debug!(url = %url, "DELETE");

        let response = self.client.delete(&url).send().await?;
        debug!(url = %url, status = %response.status(), "DELETE response");
        Self::check_response(response)?;
        Ok(())
    }
}
