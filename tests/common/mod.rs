use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use narrative_engine::llm::{LlmAdapter, LlmError};

/// Returns scripted responses in sequence, looping the last one once
/// exhausted. Real model output isn't deterministic, so scenario tests
/// script the exchange instead.
pub struct MockLlmAdapter {
    responses: Mutex<VecDeque<String>>,
}

impl MockLlmAdapter {
    #[must_use]
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(str::to_string).collect()),
        }
    }
}

#[async_trait]
impl LlmAdapter for MockLlmAdapter {
    async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        let mut queue = self.responses.lock().unwrap();
        if queue.len() > 1 {
            Ok(queue.pop_front().unwrap())
        } else {
            Ok(queue.front().cloned().unwrap_or_default())
        }
    }
}
