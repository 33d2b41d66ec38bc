//! AI service integration for image understanding
//!
//! Provides the interface to the Gemini generative-language API used to
//! analyze outfit photos, plus a scripted mock for tests.

pub mod gemini;
pub mod mime;
pub mod mock;

pub use gemini::{GeminiConnector, GeminiInferenceClient};
pub use mock::MockInferenceClient;

use crate::models::InferenceRequest;
use crate::Result;
use async_trait::async_trait;

/// The two black-box operations of the external inference service.
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Bare model identifiers (no `models/` prefix), as advertised by the
    /// provider.
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Runs `request` against `model` and returns the generated text.
    async fn generate_content(&self, model: &str, request: &InferenceRequest) -> Result<String>;

    /// Text-only generation, used to probe whether a model is reachable.
    async fn generate_text(&self, model: &str, prompt: &str) -> Result<String>;
}

/// Builds a short-lived [`InferenceService`] from a credential.
///
/// One value is created per inbound request; nothing about the session
/// outlives it.
pub trait InferenceConnector: Send + Sync {
    fn connect(&self, api_key: String) -> Box<dyn InferenceService>;
}
