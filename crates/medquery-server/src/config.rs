//! Configuration system for the medquery server
//!
//! Loads configuration from:
//! 1. config.yaml - operational settings (server, store, models, logging)
//! 2. .env file - secrets (API keys)
//!
//! Environment variables always override config.yaml values.

use medquery_core::intent::GraphicIntentKey;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Relational store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the DuckDB store file
    pub path: String,

    /// Path to the optional INSERT dump loaded at provisioning time
    pub dump_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "./data/hospital_data.duckdb".to_string(),
            dump_path: "./data/data_dump.sql".to_string(),
        }
    }
}

/// Model endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL for the chat model; None means the provider default
    #[serde(default)]
    pub chat_api_base: Option<String>,

    /// Chat model for intent classification and table selection
    pub chat_model: String,

    /// OpenAI-compatible base URL of the local code model (Ollama /v1)
    pub code_api_base: String,

    /// Code-generation model for SQL synthesis
    pub code_model: String,

    /// Upper bound on any single gateway call, in seconds
    pub timeout_secs: u64,

    /// Wire key naming the graphic intent (deployments differ)
    #[serde(default)]
    pub graphic_intent_key: GraphicIntentKey,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            chat_api_base: None,
            chat_model: "gpt-4o".to_string(),
            code_api_base: "http://127.0.0.1:11434/v1".to_string(),
            code_model: "pxlksr/defog_sqlcoder-7b-2:F16".to_string(),
            timeout_secs: 30,
            graphic_intent_key: GraphicIntentKey::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or module-specific
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// Output destination: stdout, file, both
    pub output: String,

    /// Directory for log files
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            output: "stdout".to_string(),
            directory: "./logs".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub models: ModelConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from YAML file with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;

        if let Ok(host) = std::env::var("MEDQUERY_SERVER_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("MEDQUERY_SERVER_PORT") {
            if let Ok(port_num) = port.parse() {
                config.server.port = port_num;
            }
        }

        if let Ok(path) = std::env::var("MEDQUERY_STORE_PATH") {
            config.store.path = path;
        }
        if let Ok(path) = std::env::var("MEDQUERY_DUMP_PATH") {
            config.store.dump_path = path;
        }

        if let Ok(base) = std::env::var("OPENAI_API_BASE") {
            config.models.chat_api_base = Some(base);
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            config.models.chat_model = model;
        }
        if let Ok(base) = std::env::var("MEDQUERY_CODE_API_BASE") {
            config.models.code_api_base = base;
        }
        if let Ok(model) = std::env::var("MEDQUERY_CODE_MODEL") {
            config.models.code_model = model;
        }
        if let Ok(secs) = std::env::var("MEDQUERY_GATEWAY_TIMEOUT_SECS") {
            if let Ok(secs_num) = secs.parse() {
                config.models.timeout_secs = secs_num;
            }
        }
        if let Ok(key) = std::env::var("MEDQUERY_GRAPHIC_INTENT_KEY") {
            match key.as_str() {
                "GRAPHIC_GENERATIONS" => {
                    config.models.graphic_intent_key = GraphicIntentKey::GraphicGenerations
                }
                "DATA_GENERATION" => {
                    config.models.graphic_intent_key = GraphicIntentKey::DataGeneration
                }
                _ => {}
            }
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            config.logging.format = format;
        }
        if let Ok(output) = std::env::var("LOG_OUTPUT") {
            config.logging.output = output;
        }
        if let Ok(dir) = std::env::var("LOG_DIR") {
            config.logging.directory = dir;
        }

        Ok(config)
    }

    /// Get OpenAI API key from environment (must be in .env)
    pub fn get_openai_api_key() -> Result<String, ConfigError> {
        std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))
    }

    /// Set logging environment variables for the logging module
    pub fn apply_logging_env(&self) {
        std::env::set_var("RUST_LOG", &self.logging.level);
        std::env::set_var("LOG_FORMAT", &self.logging.format);
        std::env::set_var("LOG_OUTPUT", &self.logging.output);
        std::env::set_var("LOG_DIR", &self.logging.directory);
    }
}
