//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    /// Non-success answer from the inference provider.
    ///
    /// `status` is the HTTP status when the provider answered at all, and
    /// `reason` is the machine-readable `error.status` / `details[].reason`
    /// pulled out of the Gemini error envelope when present.
    #[error("{message}")]
    AiProvider {
        status: Option<u16>,
        reason: Option<String>,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generic error: {0}")]
    Generic(String),
}

impl Error {
    /// Provider error without transport metadata.
    pub fn ai_provider(message: impl Into<String>) -> Self {
        Error::AiProvider {
            status: None,
            reason: None,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
