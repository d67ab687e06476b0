use std::{fmt::Write as _, sync::Arc};

use axum::http::StatusCode;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::InterpretationRequest,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::upstream::{GeneratorError, TextGenerator};

pub const MAX_QUESTION_CHARS: usize = 500;
const READING_WORD_BUDGET: usize = 200;

#[derive(Debug, Error)]
pub enum InterpretError {
    #[error("method not allowed; send a POST request")]
    MethodNotAllowed,
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("interpretation service is missing its upstream credential")]
    Misconfigured,
    #[error(transparent)]
    Upstream(#[from] GeneratorError),
}

impl InterpretError {
    pub fn code(&self) -> ErrorCode {
        match self {
            InterpretError::MethodNotAllowed | InterpretError::BadRequest(_) => {
                ErrorCode::BadRequest
            }
            InterpretError::Misconfigured => ErrorCode::Misconfigured,
            InterpretError::Upstream(_) => ErrorCode::UpstreamError,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            InterpretError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            InterpretError::BadRequest(_) => StatusCode::BAD_REQUEST,
            InterpretError::Misconfigured => StatusCode::INTERNAL_SERVER_ERROR,
            InterpretError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Client-facing error. Upstream detail stays in the server log.
    pub fn to_api_error(&self) -> ApiError {
        let message = match self {
            InterpretError::Upstream(_) => "failed to generate interpretation".to_string(),
            InterpretError::Misconfigured => "interpretation service is not configured".to_string(),
            other => other.to_string(),
        };
        ApiError::new(self.code(), message)
    }
}

/// Stateless interpretation service: validate, build one prompt, call the
/// generator once.
#[derive(Clone)]
pub struct InterpretationService {
    credential: Option<String>,
    generator: Arc<dyn TextGenerator>,
}

impl InterpretationService {
    pub fn new(credential: Option<String>, generator: Arc<dyn TextGenerator>) -> Self {
        let credential = credential
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        Self {
            credential,
            generator,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credential.is_some()
    }

    /// Handles a raw request body end to end.
    pub async fn interpret_body(&self, body: &[u8]) -> Result<String, InterpretError> {
        let credential = self.credential()?;
        let request = parse_request(body)?;
        self.generate(credential, &request).await
    }

    fn credential(&self) -> Result<&str, InterpretError> {
        self.credential
            .as_deref()
            .ok_or(InterpretError::Misconfigured)
    }

    async fn generate(
        &self,
        credential: &str,
        request: &InterpretationRequest,
    ) -> Result<String, InterpretError> {
        let prompt = build_prompt(request);
        match self.generator.generate(credential, &prompt).await {
            Ok(text) => {
                info!(chars = text.len(), "interpretation generated");
                Ok(text)
            }
            Err(error) => {
                warn!(%error, "upstream generator failed");
                Err(error.into())
            }
        }
    }
}

pub fn parse_request(body: &[u8]) -> Result<InterpretationRequest, InterpretError> {
    if body.is_empty() {
        return Err(InterpretError::BadRequest("request body is empty".into()));
    }
    let request: InterpretationRequest = serde_json::from_slice(body)
        .map_err(|err| InterpretError::BadRequest(err.to_string()))?;
    validate_request(&request)?;
    Ok(request)
}

fn validate_request(request: &InterpretationRequest) -> Result<(), InterpretError> {
    let question = request.question.trim();
    if question.is_empty() {
        return Err(InterpretError::BadRequest("question is required".into()));
    }
    if question.chars().count() > MAX_QUESTION_CHARS {
        return Err(InterpretError::BadRequest(format!(
            "question exceeds {MAX_QUESTION_CHARS} characters"
        )));
    }
    for (position, card) in request.cards.iter() {
        if card.name.trim().is_empty() {
            return Err(InterpretError::BadRequest(format!(
                "{} card is missing a name",
                position.name().to_ascii_lowercase()
            )));
        }
    }
    Ok(())
}

pub fn build_prompt(request: &InterpretationRequest) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "A querent has asked the cards: \"{}\"",
        request.question.trim()
    );
    prompt.push('\n');
    prompt.push_str("They drew three cards in a Past, Present, Future spread:\n");
    for (position, card) in request.cards.iter() {
        let keywords = if card.keywords.is_empty() {
            "none given".to_string()
        } else {
            card.keywords.join(", ")
        };
        let _ = writeln!(
            prompt,
            "- {}: {} ({}). Keywords: {}.",
            position.name(),
            card.name.trim(),
            card.orientation,
            keywords
        );
    }
    prompt.push('\n');
    let _ = write!(
        prompt,
        "Write one cohesive reading that flows from the past through the present \
         into the future and speaks directly to the question. Name each card and \
         reflect whether it is upright or reversed. Keep it under {READING_WORD_BUDGET} \
         words of plain prose, without headings or lists."
    );
    prompt
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
