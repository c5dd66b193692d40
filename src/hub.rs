//! Hub API client: email-code login and authenticated publishing.

use crate::agent::AgentMetadata;
use crate::error::ApiError;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct SendCodeRequest<'a> {
    email: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    code: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HubUser {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub user: Option<HubUser>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Client for the hub web API.
#[derive(Debug, Clone)]
pub struct HubClient {
    base_url: String,
    http: Client,
    token: Option<String>,
}

impl HubClient {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("agt/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: api_url.trim_end_matches('/').to_string(),
            http,
            token: None,
        })
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the hub to email a one-time login code.
    pub async fn send_code(&self, email: &str) -> Result<(), ApiError> {
        let url = format!("{}/api/auth/send-code", self.base_url);
        tracing::debug!(url = %url, "POST");
        let body = SendCodeRequest {
            email,
            kind: "login",
        };
        let response = self.http.post(&url).json(&body).send().await.map_err(network)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(parse_error(response).await)
        }
    }

    /// Redeem a login code for an API token.
    pub async fn login(&self, email: &str, code: &str) -> Result<LoginResponse, ApiError> {
        let url = format!("{}/api/cli/login", self.base_url);
        tracing::debug!(url = %url, "POST");
        let body = LoginRequest { email, code };
        let response = self.http.post(&url).json(&body).send().await.map_err(network)?;
        json_response(response).await
    }

    /// Submit validated metadata and the raw agent file.
    pub async fn publish(
        &self,
        metadata: &AgentMetadata,
        file_name: &str,
        content: &str,
    ) -> Result<PublishResponse, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::AuthRequired)?;
        let url = format!("{}/api/cli/publish", self.base_url);
        tracing::debug!(url = %url, agent = %metadata.id, "POST");

        let metadata_json = serde_json::to_string(metadata).map_err(|e| {
            ApiError::ConfigError(format!("Failed to serialize agent metadata: {}", e))
        })?;
        let file = Part::text(content.to_string())
            .file_name(file_name.to_string())
            .mime_str("text/markdown")
            .map_err(network)?;
        let form = Form::new().text("metadata", metadata_json).part("file", file);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(network)?;
        json_response(response).await
    }
}

fn network(err: reqwest::Error) -> ApiError {
    ApiError::HubError {
        status: err.status().map(|s| s.as_u16()).unwrap_or(0),
        message: err.to_string(),
    }
}

async fn parse_error(response: reqwest::Response) -> ApiError {
    let status = response.status().as_u16();
    if status == 401 {
        return ApiError::AuthRequired;
    }
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body
            .error
            .or(body.message)
            .unwrap_or_else(|| format!("HTTP {}", status)),
        Err(_) => format!("HTTP {}", status),
    };
    ApiError::HubError { status, message }
}

async fn json_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    if response.status().is_success() {
        response.json().await.map_err(network)
    } else {
        Err(parse_error(response).await)
    }
}
