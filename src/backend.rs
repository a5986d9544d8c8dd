//! The boundary between the session and whatever serves the models.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::BackendError;
use crate::state::ChatMessage;

/// A model the backend can serve, as reported by its listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelDescriptor {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

impl ModelDescriptor {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: None,
            modified_at: None,
        }
    }

    /// Size in a short human form ("4.7 GB"), when the backend reported one.
    pub fn display_size(&self) -> Option<String> {
        const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
        let mut value = self.size? as f64;
        let mut unit = 0;
        while value >= 1000.0 && unit < UNITS.len() - 1 {
            value /= 1000.0;
            unit += 1;
        }
        Some(if unit == 0 {
            format!("{} {}", value, UNITS[unit])
        } else {
            format!("{:.1} {}", value, UNITS[unit])
        })
    }

    /// Calendar date of the last change ("2024-05-01"), from the RFC 3339 stamp.
    pub fn modified_date(&self) -> Option<&str> {
        let stamp = self.modified_at.as_deref()?;
        stamp.split('T').next().filter(|date| !date.is_empty())
    }

    /// Size and date on one line, whichever of them is known.
    pub fn details(&self) -> Option<String> {
        match (self.display_size(), self.modified_date()) {
            (Some(size), Some(date)) => Some(format!("{} · {}", size, date)),
            (Some(size), None) => Some(size),
            (None, Some(date)) => Some(date.to_string()),
            (None, None) => None,
        }
    }
}

#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Where the backend lives, for error messages and logs.
    fn location(&self) -> &str;

    /// Models available locally, in the backend's own order.
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, BackendError>;

    /// One non-streaming chat completion. Returns the reply text.
    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String, BackendError>;
}
