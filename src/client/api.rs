//! HTTP call against the users router. No timeout is applied; the request
//! lives as long as the server takes to answer.

use super::{config::ClientConfig, errors::AppError};
use crate::APP_USER_AGENT;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub const REGISTER_PATH: &str = "/api/users/register";

/// Body of `POST /api/users/register`.
#[derive(Serialize, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Only the status and the optional `message` are consulted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationResponse {
    pub status: u16,
    pub message: Option<String>,
}

#[async_trait]
pub trait RegistrationApi: Send + Sync {
    /// Returns `Ok` for any 2xx status and `Err(AppError::Http)` otherwise.
    async fn register(&self, request: &RegistrationRequest)
        -> Result<RegistrationResponse, AppError>;
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    /// # Errors
    /// Return error if the HTTP client cannot be built
    pub fn new(config: ClientConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .map_err(|err| AppError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self { http, config })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl RegistrationApi for ApiClient {
    #[instrument(skip(self))]
    async fn register(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationResponse, AppError> {
        let url = self.config.url(REGISTER_PATH);
        debug!("POST {url}");

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| AppError::Network(format!("Unable to reach the server: {err}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| AppError::Parse(format!("Failed to read response: {err}")))?;

        classify(status, &body)
    }
}

#[derive(Deserialize)]
struct MessageEnvelope {
    message: Option<String>,
}

/// Splits a raw response into success or `AppError::Http`.
fn classify(status: u16, body: &str) -> Result<RegistrationResponse, AppError> {
    let message = extract_message(body);

    if (200..300).contains(&status) {
        Ok(RegistrationResponse { status, message })
    } else {
        Err(AppError::Http { status, message })
    }
}

/// The server `message`, verbatim. An empty string counts as no message.
fn extract_message(body: &str) -> Option<String> {
    let envelope: MessageEnvelope = serde_json::from_str(body).ok()?;
    envelope.message.filter(|message| !message.is_empty())
}
