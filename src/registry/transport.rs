//! Catalog transport: how raw catalog documents are fetched.

use crate::error::{ApiError, TransportError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Fetches catalog resources by path relative to the registry root.
#[async_trait]
pub trait CatalogTransport: Send + Sync {
    async fn get_text(&self, path: &str) -> Result<String, TransportError>;
}

/// HTTP transport against a static registry host.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    http: Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("agt/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CatalogTransport for HttpTransport {
    async fn get_text(&self, path: &str) -> Result<String, TransportError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        tracing::debug!(url = %url, "GET");

        let response = self.http.get(&url).send().await?;
        match response.status() {
            status if status.is_success() => Ok(response.text().await?),
            StatusCode::NOT_FOUND => Err(TransportError::NotFound { url }),
            status => Err(TransportError::Status {
                url,
                status: status.as_u16(),
            }),
        }
    }
}
