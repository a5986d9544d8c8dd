//! Error types shared by the backend seam, the session and the front-end.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the inference backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("backend returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum Error {
    /// The model listing could not be fetched. Fatal for session startup.
    #[error("backend unavailable at {url}: {source}")]
    BackendUnavailable {
        url: String,
        #[source]
        source: BackendError,
    },
    /// A chat call failed. The session stays usable.
    #[error("model '{model}' failed to answer: {source}")]
    Inference {
        model: String,
        #[source]
        source: BackendError,
    },
    /// One-shot mode was given nothing to ask.
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("no models available; pull one with `ollama pull llama3`")]
    NoModels,
    #[error("question task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("could not write config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inference_error_names_the_model() {
        let err = Error::Inference {
            model: "llama3".into(),
            source: BackendError::InvalidResponse("missing message".into()),
        };
        assert_eq!(
            err.to_string(),
            "model 'llama3' failed to answer: invalid response: missing message"
        );
    }

    #[test]
    fn unavailable_backend_shows_the_status() {
        let err = Error::BackendUnavailable {
            url: "http://localhost:11434".into(),
            source: BackendError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: "starting".into(),
            },
        };
        assert!(err.to_string().contains("503 Service Unavailable"));
    }
}
