//! Error hierarchy for the docstring generation stack
//!
//! The generator never hands these to its callers; they travel between the
//! model client and the orchestrator so the orchestrator can pick a recovery
//! path (bounded retry or fallback) instead of failing.

use thiserror::Error;

/// Top-level error type for docsmith components
#[derive(Debug, Error)]
pub enum DocgenError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM communication error: {0}")]
    LLM(#[from] LLMError),

    #[error("File system error: {0}")]
    FileSystem(#[from] FileSystemError),

    #[error("Invalid metadata in {path}: {reason}")]
    Metadata { path: String, reason: String },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required config: {config_key}")]
    MissingRequired { config_key: String },

    #[error("Invalid config value: {config_key} = '{value}' - {reason}")]
    InvalidValue {
        config_key: String,
        value: String,
        reason: String,
    },

    #[error("Environment variable error: {var_name} - {reason}")]
    EnvVarError { var_name: String, reason: String },
}

/// Model client errors
#[derive(Debug, Error)]
pub enum LLMError {
    #[error("Model client misconfigured: {0}")]
    Configuration(#[from] ConfigError),

    #[error("API request failed: {provider} - {status_code}: {body}")]
    APIRequest {
        provider: String,
        status_code: u16,
        body: String,
    },

    #[error("Transport failure: {provider} - {reason}")]
    Transport { provider: String, reason: String },

    #[error("Response parsing failed: {reason}")]
    ResponseParsing { reason: String },

    #[error("Empty response from {provider}")]
    EmptyResponse { provider: String },
}

impl LLMError {
    /// How the orchestrator should react to this error.
    pub fn recovery_strategy(&self) -> RecoveryStrategy {
        match self {
            LLMError::EmptyResponse { .. } => RecoveryStrategy::Retry { max_attempts: 2 },
            LLMError::Configuration(_)
            | LLMError::APIRequest { .. }
            | LLMError::Transport { .. }
            | LLMError::ResponseParsing { .. } => RecoveryStrategy::Fallback,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, LLMError::Configuration(_))
    }
}

/// File system errors
#[derive(Debug, Error)]
pub enum FileSystemError {
    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("IO error: {operation} on {path} - {reason}")]
    IO {
        operation: String,
        path: String,
        reason: String,
    },
}

impl FileSystemError {
    pub fn from_io(operation: &str, path: &str, error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            FileSystemError::NotFound {
                path: path.to_string(),
            }
        } else {
            FileSystemError::IO {
                operation: operation.to_string(),
                path: path.to_string(),
                reason: error.to_string(),
            }
        }
    }
}

/// Result type aliases for convenience
pub type DocgenResult<T> = Result<T, DocgenError>;
pub type LLMResult<T> = Result<T, LLMError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type FileSystemResult<T> = Result<T, FileSystemError>;

/// Error recovery strategies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Ask again with a perturbed prompt
    Retry { max_attempts: u32 },
    /// Switch to the degraded generation path
    Fallback,
}

#[macro_export]
macro_rules! llm_error {
    ($variant:ident { $($field:ident: $value:expr),+ }) => {
        $crate::LLMError::$variant { $($field: $value),+ }
    };
}
