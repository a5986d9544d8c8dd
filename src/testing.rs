//! In-memory backend for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::backend::{ModelBackend, ModelDescriptor};
use crate::error::BackendError;
use crate::state::ChatMessage;

#[derive(Debug, Clone)]
pub struct ChatCall {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

pub struct StubBackend {
    models: Option<Vec<ModelDescriptor>>,
    answer: Option<String>,
    failures: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<ChatCall>>,
}

impl StubBackend {
    pub fn with_models(names: &[&str]) -> Self {
        Self {
            models: Some(names.iter().map(|n| ModelDescriptor::named(*n)).collect()),
            answer: None,
            failures: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Listing fails as if nothing were listening.
    pub fn unreachable() -> Self {
        Self {
            models: None,
            ..Self::with_models(&[])
        }
    }

    /// Every successful chat returns this text instead of echoing the prompt.
    pub fn answering(mut self, answer: &str) -> Self {
        self.answer = Some(answer.to_string());
        self
    }

    pub fn fail_next_chat(&self, message: &str) {
        self.failures.lock().unwrap().push_back(message.to_string());
    }

    pub fn chat_calls(&self) -> Vec<ChatCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelBackend for StubBackend {
    fn location(&self) -> &str {
        "http://stub:11434"
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, BackendError> {
        self.models
            .clone()
            .ok_or_else(|| BackendError::InvalidResponse("connection refused".to_string()))
    }

    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String, BackendError> {
        self.calls.lock().unwrap().push(ChatCall {
            model: model.to_string(),
            messages: messages.to_vec(),
        });
        if let Some(message) = self.failures.lock().unwrap().pop_front() {
            return Err(BackendError::InvalidResponse(message));
        }
        let prompt = messages.last().map(ChatMessage::content).unwrap_or_default();
        Ok(self
            .answer
            .clone()
            .unwrap_or_else(|| format!("{model} says: {prompt}")))
    }
}
