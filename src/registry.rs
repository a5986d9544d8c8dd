//! Model registry reader: the one-off listing taken at session start.

use tracing::info;

use crate::backend::{ModelBackend, ModelDescriptor};
use crate::error::{Error, Result};

/// Models reported by the backend when the session started. Never refreshed.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
}

impl ModelRegistry {
    pub async fn fetch(backend: &dyn ModelBackend) -> Result<Self> {
        let models = backend
            .list_models()
            .await
            .map_err(|source| Error::BackendUnavailable {
                url: backend.location().to_string(),
                source,
            })?;

        info!("extracting model names");
        let registry = Self::from_models(models);
        info!(names = ?registry.names(), "extracted model names");
        Ok(registry)
    }

    pub fn from_models(models: Vec<ModelDescriptor>) -> Self {
        Self { models }
    }

    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn get(&self, index: usize) -> Option<&ModelDescriptor> {
        self.models.get(index)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.models.iter().position(|m| m.name == name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::state::ChatMessage;
    use async_trait::async_trait;

    struct FixedListing(Result<Vec<ModelDescriptor>, BackendError>);

    #[async_trait]
    impl ModelBackend for FixedListing {
        fn location(&self) -> &str {
            "http://stub:11434"
        }

        async fn list_models(&self) -> Result<Vec<ModelDescriptor>, BackendError> {
            match &self.0 {
                Ok(models) => Ok(models.clone()),
                Err(e) => Err(BackendError::InvalidResponse(e.to_string())),
            }
        }

        async fn chat(&self, _: &str, _: &[ChatMessage]) -> Result<String, BackendError> {
            unreachable!("registry never chats")
        }
    }

    #[tokio::test]
    async fn keeps_backend_order() {
        let backend = FixedListing(Ok(vec![
            ModelDescriptor::named("mistral"),
            ModelDescriptor::named("llama3"),
            ModelDescriptor::named("gemma"),
        ]));
        let registry = ModelRegistry::fetch(&backend).await.unwrap();
        assert_eq!(registry.names(), ["mistral", "llama3", "gemma"]);
        assert_eq!(registry.position("llama3"), Some(1));
        assert_eq!(registry.position("phi"), None);
    }

    #[tokio::test]
    async fn listing_failure_is_backend_unavailable() {
        let backend = FixedListing(Err(BackendError::InvalidResponse("refused".into())));
        let err = ModelRegistry::fetch(&backend).await.unwrap_err();
        match err {
            Error::BackendUnavailable { url, .. } => assert_eq!(url, "http://stub:11434"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
