//! HTTP client for the RabbitMQ management API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderValue};
use tracing::{debug, trace};

use crate::config::RabbitConfig;
use crate::document::Document;
use crate::error::FetchError;

/// Source of management API documents.
///
/// `endpoint` is the resource name below `/api/`, e.g. `overview`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, endpoint: &str) -> Result<Document, FetchError>;
}

/// [`Fetcher`] backed by the broker's HTTP management API.
///
/// Issues a single `GET {url}/api/{endpoint}` per fetch with basic auth and a
/// bounded timeout. Failed requests are not retried.
#[derive(Debug, Clone)]
pub struct ManagementClient {
    client: Client,
    base_url: String,
    user: String,
    password: String,
    timeout: Duration,
}

impl ManagementClient {
    /// Create a client from the broker connection settings.
    pub fn new(config: &RabbitConfig) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .user_agent(concat!("rabbitmq-exporter/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            user: config.user.clone(),
            password: config.password.clone(),
            timeout,
        })
    }

    /// Full URL of an API resource.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/api/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    fn map_send_error(&self, endpoint: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                endpoint: endpoint.to_string(),
                timeout: self.timeout,
            }
        } else {
            FetchError::request(endpoint, error_chain(&err))
        }
    }
}

/// Render an error with its sources, outermost first, joined by ": ".
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[async_trait]
impl Fetcher for ManagementClient {
    async fn fetch(&self, endpoint: &str) -> Result<Document, FetchError> {
        let url = self.endpoint_url(endpoint);
        debug!(%url, "Fetching management API resource");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.user, Some(&self.password))
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|e| self.map_send_error(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_send_error(endpoint, e))?;
        trace!(%url, bytes = body.len(), "Received management API response");

        Document::from_slice(&body).map_err(|e| FetchError::decode(endpoint, e))
    }
}
