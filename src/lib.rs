pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod ollama;
pub mod processor;
pub mod registry;
pub mod session;
pub mod state;
pub mod tui;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use backend::{ModelBackend, ModelDescriptor};
pub use config::Config;
pub use error::{BackendError, Error, Result};
pub use ollama::OllamaClient;
pub use processor::QuestionProcessor;
pub use registry::ModelRegistry;
pub use session::{PendingQuestion, Session};
pub use state::{ChatMessage, ChatRole, Conversation};
