use std::sync::Arc;

use tracing::info;

use crate::backend::ModelBackend;
use crate::error::{Error, Result};
use crate::state::ChatMessage;

/// Sends one question at a time to a model and hands back the full answer.
#[derive(Clone)]
pub struct QuestionProcessor {
    backend: Arc<dyn ModelBackend>,
}

impl QuestionProcessor {
    pub fn new(backend: Arc<dyn ModelBackend>) -> Self {
        Self { backend }
    }

    /// The request carries only this prompt; earlier turns are not replayed.
    pub async fn ask(&self, prompt: &str, model: &str) -> Result<String> {
        info!(question = prompt, model, "processing question");

        let messages = [ChatMessage::user(prompt)];
        let answer = self
            .backend
            .chat(model, &messages)
            .await
            .map_err(|source| Error::Inference {
                model: model.to_string(),
                source,
            })?;

        info!("question processed and response generated");
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubBackend;

    #[tokio::test]
    async fn sends_only_the_prompt_to_the_named_model() {
        let stub = Arc::new(StubBackend::with_models(&["llama3"]));
        let processor = QuestionProcessor::new(stub.clone());

        let answer = processor.ask("why is the sky blue?", "llama3").await.unwrap();
        assert_eq!(answer, "llama3 says: why is the sky blue?");

        let calls = stub.chat_calls();
        assert_eq!(calls[0].messages, [ChatMessage::user("why is the sky blue?")]);
    }

    #[tokio::test]
    async fn backend_failure_is_an_inference_error() {
        let stub = Arc::new(StubBackend::with_models(&["llama3"]));
        stub.fail_next_chat("out of memory");
        let processor = QuestionProcessor::new(stub);

        match processor.ask("hi", "llama3").await {
            Err(Error::Inference { model, source }) => {
                assert_eq!(model, "llama3");
                assert!(source.to_string().contains("out of memory"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
