//! One interactive session: the model choice, the conversation, and the
//! submit/answer cycle. The terminal front-end drives this; so do the one-shot
//! CLI mode and the tests.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::backend::ModelBackend;
use crate::error::{Error, Result};
use crate::processor::QuestionProcessor;
use crate::registry::ModelRegistry;
use crate::state::{ChatMessage, Conversation};

pub struct Session {
    registry: ModelRegistry,
    selected: Option<usize>,
    conversation: Conversation,
    processor: QuestionProcessor,
}

/// A question whose user turn is already recorded and whose answer is still
/// owed. Runs detached from the session so the caller can keep rendering.
pub struct PendingQuestion {
    processor: QuestionProcessor,
    prompt: String,
    model: String,
}

impl PendingQuestion {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn run(self) -> Result<String> {
        self.processor.ask(&self.prompt, &self.model).await
    }
}

impl Session {
    /// Lists the backend's models and opens an empty conversation.
    ///
    /// `preferred_model` wins over the first listed model when the backend has
    /// it. A failed listing is returned as `BackendUnavailable`; an empty one is
    /// not an error, the session just refuses prompts.
    pub async fn start(
        backend: Arc<dyn ModelBackend>,
        preferred_model: Option<&str>,
    ) -> Result<Self> {
        let registry = ModelRegistry::fetch(backend.as_ref()).await?;
        Ok(Self::with_registry(backend, registry, preferred_model))
    }

    pub fn with_registry(
        backend: Arc<dyn ModelBackend>,
        registry: ModelRegistry,
        preferred_model: Option<&str>,
    ) -> Self {
        let selected = preferred_model
            .and_then(|name| registry.position(name))
            .or_else(|| (!registry.is_empty()).then_some(0));

        match selected.and_then(|i| registry.get(i)) {
            Some(model) => info!(model = %model.name, "session started"),
            None => info!("session started without any local models"),
        }

        Self {
            registry,
            selected,
            conversation: Conversation::new(),
            processor: QuestionProcessor::new(backend),
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn has_models(&self) -> bool {
        !self.registry.is_empty()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_model(&self) -> Option<&str> {
        self.selected
            .and_then(|i| self.registry.get(i))
            .map(|m| m.name.as_str())
    }

    /// Targets later questions at another model. Out-of-range indexes are ignored.
    pub fn select_model(&mut self, index: usize) -> Option<&str> {
        let name = self.registry.get(index)?.name.as_str();
        if self.selected != Some(index) {
            info!(model = name, "model selected");
        }
        self.selected = Some(index);
        Some(name)
    }

    pub fn select_model_by_name(&mut self, name: &str) -> bool {
        match self.registry.position(name) {
            Some(index) => self.select_model(index).is_some(),
            None => false,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Records the user turn and returns the question to run, or `None` when
    /// there is nothing to ask (blank prompt) or no model to ask it of.
    pub fn begin_turn(&mut self, prompt: &str) -> Option<PendingQuestion> {
        if prompt.trim().is_empty() {
            debug!("ignoring blank prompt");
            return None;
        }
        let model = self.selected_model()?.to_string();

        self.conversation.append(ChatMessage::user(prompt));
        Some(PendingQuestion {
            processor: self.processor.clone(),
            prompt: prompt.to_string(),
            model,
        })
    }

    /// Appends the answer, or logs the failure and hands it back for display.
    /// A failed question leaves its user turn unanswered.
    pub fn finish_turn(&mut self, answer: Result<String>) -> Result<()> {
        match answer {
            Ok(content) => {
                self.conversation.append(ChatMessage::assistant(content));
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "error processing prompt");
                Err(e)
            }
        }
    }

    /// A whole cycle, awaited inline. `Ok(None)` means the prompt was refused.
    pub async fn submit(&mut self, prompt: &str) -> Result<Option<&ChatMessage>> {
        let Some(question) = self.begin_turn(prompt) else {
            return Ok(None);
        };
        let answer = question.run().await;
        self.finish_turn(answer)?;
        Ok(self.conversation.last())
    }

    /// One question with the answer text back, for the non-interactive mode.
    /// A prompt `submit` would refuse is an error here.
    pub async fn ask_once(&mut self, prompt: &str) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(Error::EmptyPrompt);
        }
        if !self.has_models() {
            return Err(Error::NoModels);
        }
        match self.submit(prompt).await? {
            Some(reply) => Ok(reply.content().to_string()),
            None => Err(Error::EmptyPrompt),
        }
    }
}
