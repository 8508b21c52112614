//! Configuration types for Recipebook

use crate::error::RecipebookError;
use crate::traits::RecipebookResult;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Client-side configuration used by the store and the HTTP transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend base URL
    pub api_url: String,

    /// Collection path appended to the base URL
    pub collection_path: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Logging level
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8080".to_string(),
            collection_path: "/api/recipes".to_string(),
            timeout_secs: 30,
            log_level: "info".to_string(),
        }
    }
}

/// Mock backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// API listen address
    pub listen_addr: String,

    /// Path segment collections are mounted under
    pub api_root: String,

    /// Enable CORS
    pub enable_cors: bool,

    /// Seed database file, built-in seed when absent
    pub seed_file: Option<PathBuf>,

    /// Logging level
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            api_root: "api".to_string(),
            enable_cors: true,
            seed_file: None,
            log_level: "info".to_string(),
        }
    }
}

/// JSON (de)serialization shared by the config types
pub trait JsonConfig: Serialize + DeserializeOwned + Sized {
    /// Serialize to pretty JSON
    fn to_json(&self) -> RecipebookResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| RecipebookError::SerializationError(e.to_string()))
    }

    /// Load from JSON
    fn from_json(json: &str) -> RecipebookResult<Self> {
        serde_json::from_str(json).map_err(|e| RecipebookError::ConfigError(e.to_string()))
    }

    /// Load from a JSON file
    fn load(path: impl AsRef<Path>) -> RecipebookResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RecipebookError::ConfigError(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }
}

impl JsonConfig for ClientConfig {}
impl JsonConfig for ServerConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_client_config_uses_defaults() {
        let config = ClientConfig::from_json(r#"{"api_url": "http://localhost:9000"}"#).unwrap();
        assert_eq!(config.api_url, "http://localhost:9000");
        assert_eq!(config.collection_path, "/api/recipes");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_server_config_json() {
        let config = ServerConfig {
            enable_cors: false,
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(ServerConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_bad_config_is_config_error() {
        let err = ClientConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, RecipebookError::ConfigError(_)));

        let err = ServerConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, RecipebookError::ConfigError(_)));
    }
}
