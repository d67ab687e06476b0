use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::upstream::{GeneratorError, TextGenerator};

/// Generator double that records prompts and counts calls.
#[derive(Clone, Default)]
pub(crate) struct RecordingGenerator {
    calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingGenerator {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().expect("lock").last().cloned()
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate(&self, _credential: &str, prompt: &str) -> Result<String, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().expect("lock").push(prompt.to_string());
        if self.fail {
            return Err(GeneratorError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "overloaded".into(),
            });
        }
        Ok("Your past of new beginnings gives way to a present of will and a future of hope.".into())
    }
}

pub(crate) fn sample_request_json() -> serde_json::Value {
    serde_json::json!({
        "question": "Will I find love?",
        "cards": {
            "past": { "name": "The Fool", "orientation": "upright", "keywords": ["beginnings", "innocence"] },
            "present": { "name": "The Magician", "orientation": "reversed", "keywords": ["willpower"] },
            "future": { "name": "The Star", "orientation": "upright", "keywords": ["hope"] }
        }
    })
}
