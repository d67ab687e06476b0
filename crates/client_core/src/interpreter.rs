use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use shared::{
    error::ApiError,
    protocol::{InterpretationRequest, InterpretationResponse, INTERPRET_ROUTE},
};
use thiserror::Error;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Any way the interpretation call can fail. The session recovers from all of
/// them with the fallback narrative.
#[derive(Debug, Error)]
pub enum InterpretClientError {
    #[error("invalid interpretation service url: {0}")]
    InvalidUrl(String),
    #[error("interpretation service unreachable: {0}")]
    Network(#[from] reqwest::Error),
    #[error("interpretation service returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("interpretation service returned a malformed payload: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait Interpreter: Send + Sync {
    async fn interpret(&self, request: &InterpretationRequest)
        -> Result<String, InterpretClientError>;
}

pub struct HttpInterpreter {
    http: Client,
    endpoint: Url,
}

impl HttpInterpreter {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, InterpretClientError> {
        let mut base = Url::parse(server_url)
            .map_err(|err| InterpretClientError::InvalidUrl(format!("{server_url}: {err}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(InterpretClientError::InvalidUrl(format!(
                "{server_url}: server_url must start with http:// or https://"
            )));
        }
        // Keep any path prefix, e.g. a deployment mounted under /api.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(INTERPRET_ROUTE.trim_start_matches('/'))
            .map_err(|err| InterpretClientError::InvalidUrl(format!("{server_url}: {err}")))?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Interpreter for HttpInterpreter {
    async fn interpret(
        &self,
        request: &InterpretationRequest,
    ) -> Result<String, InterpretClientError> {
        let res = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let bytes = res.bytes().await.unwrap_or_default();
            let message = serde_json::from_slice::<ApiError>(&bytes)
                .map(|err| err.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
            return Err(InterpretClientError::Status { status, message });
        }

        let bytes = res.bytes().await?;
        let body: InterpretationResponse = serde_json::from_slice(&bytes)
            .map_err(|err| InterpretClientError::Malformed(err.to_string()))?;
        if body.interpretation.trim().is_empty() {
            return Err(InterpretClientError::Malformed(
                "interpretation is empty".to_string(),
            ));
        }
        Ok(body.interpretation)
    }
}

#[cfg(test)]
#[path = "tests/interpreter_tests.rs"]
mod tests;
