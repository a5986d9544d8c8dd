use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{Error, Result};
use crate::ollama::{normalize_base_url, DEFAULT_BASE_URL};

pub const HOST_ENV_VAR: &str = "OLLAMA_HOST";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ollama_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Reads the user's config file. A missing file gives the defaults; so does
    /// an unreadable one, with a warning.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        let parsed = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()));
        match parsed {
            Ok(config) => config,
            Err(reason) => {
                warn!(path = %path.display(), %reason, "ignoring unreadable config");
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let io_err = |source: std::io::Error| Error::Config {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| io_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        fs::write(path, content).map_err(io_err)
    }

    /// Remembers `model` as the one to preselect next time.
    pub fn save_default_model_to(path: &Path, model: &str) -> Result<()> {
        let mut config = Self::load_from(path);
        config.default_model = Some(model.to_string());
        config.save_to(path)
    }

    /// Flag, then `OLLAMA_HOST`, then the file, then the stock local address.
    pub fn resolve_base_url(&self, flag: Option<&str>, env_host: Option<&str>) -> String {
        let raw = flag
            .or(env_host)
            .or(self.ollama_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL);
        normalize_base_url(raw)
    }

    pub fn resolve_log_file(&self, flag: Option<&Path>) -> Option<PathBuf> {
        flag.map(Path::to_path_buf)
            .or_else(|| self.log_file.clone())
            .or_else(|| dirs::data_local_dir().map(|d| d.join("sigma").join("sigma.log")))
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("sigma").join("config.json"))
    }
}
