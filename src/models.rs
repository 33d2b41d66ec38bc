//! Data models and configuration
//!
//! Defines the per-request inference payload, the credential lookup, and the
//! environment-driven service configuration.

use crate::ai::gemini::client::DEFAULT_BASE_URL;
use crate::{Error, Result};
use std::time::Duration;

/// One image-understanding call: instruction, image, and output mode.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub instruction: String,
    pub image: Vec<u8>,
    pub mime_type: String,
    /// Ask the model for a single JSON document as its whole answer.
    pub structured_output: bool,
}

impl InferenceRequest {
    pub fn new(instruction: impl Into<String>, image: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            image,
            mime_type: mime_type.into(),
            structured_output: false,
        }
    }

    pub fn structured(mut self) -> Self {
        self.structured_output = true;
        self
    }
}

/// Decoded image upload handed over by the HTTP boundary or the CLI.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "NEXT_PUBLIC_GEMINI_API_KEY"];

/// Where the Gemini API key comes from.
///
/// The key is resolved on every request, so rotating the environment (or a
/// `.env` reload) takes effect without a restart.
#[derive(Debug, Clone, Default)]
pub enum Credentials {
    #[default]
    Environment,
    Static(Option<String>),
}

impl Credentials {
    pub fn resolve(&self) -> Option<String> {
        match self {
            Credentials::Environment => API_KEY_VARS
                .iter()
                .filter_map(|var| std::env::var(var).ok())
                .find(|value| !value.trim().is_empty()),
            Credentials::Static(key) => key.clone().filter(|k| !k.trim().is_empty()),
        }
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_base_url: String,
    pub gemini_timeout: Duration,
    pub bind_addr: String,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_base_url: DEFAULT_BASE_URL.to_string(),
            gemini_timeout: Duration::from_secs(60),
            bind_addr: "127.0.0.1:3000".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Ok(Self {
            gemini_base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or(defaults.gemini_base_url),
            gemini_timeout: match std::env::var("GEMINI_TIMEOUT_SECS") {
                Ok(raw) => Duration::from_secs(parse_number("GEMINI_TIMEOUT_SECS", &raw)?),
                Err(_) => defaults.gemini_timeout,
            },
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            max_upload_bytes: match std::env::var("MAX_UPLOAD_BYTES") {
                Ok(raw) => parse_number("MAX_UPLOAD_BYTES", &raw)?,
                Err(_) => defaults.max_upload_bytes,
            },
        })
    }
}

fn parse_number<T: std::str::FromStr>(var: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a positive integer, got '{}'", var, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_credentials_treat_blank_as_missing() {
        assert_eq!(Credentials::Static(Some("  ".to_string())).resolve(), None);
        assert_eq!(Credentials::Static(None).resolve(), None);
        assert_eq!(
            Credentials::Static(Some("key".to_string())).resolve(),
            Some("key".to_string())
        );
    }

    #[test]
    fn test_structured_builder_sets_flag() {
        let request = InferenceRequest::new("describe", vec![1], "image/png");
        assert!(!request.structured_output);
        assert!(request.structured().structured_output);
    }

    #[test]
    fn test_parse_number_rejects_garbage() {
        let err = parse_number::<u64>("GEMINI_TIMEOUT_SECS", "soon").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(parse_number::<usize>("MAX_UPLOAD_BYTES", " 1024 ").unwrap(), 1024);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gemini_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.gemini_timeout, Duration::from_secs(60));
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }
}
