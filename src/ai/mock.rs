use super::{InferenceConnector, InferenceService};
use crate::models::InferenceRequest;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail {
        status: Option<u16>,
        reason: Option<String>,
        message: String,
    },
}

impl Reply {
    fn to_result(&self) -> Result<String> {
        match self {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail {
                status,
                reason,
                message,
            } => Err(Error::AiProvider {
                status: *status,
                reason: reason.clone(),
                message: message.clone(),
            }),
        }
    }
}

/// Scripted [`InferenceService`] keyed by model identifier.
///
/// Clones share state, so a clone kept by a test observes calls made through
/// the boxed service handed out by [`InferenceConnector::connect`].
#[derive(Clone, Default)]
pub struct MockInferenceClient {
    models: Arc<Mutex<Option<Vec<String>>>>,
    replies: Arc<Mutex<HashMap<String, Reply>>>,
    calls: Arc<Mutex<Vec<String>>>,
    list_calls: Arc<Mutex<usize>>,
    connected_keys: Arc<Mutex<Vec<String>>>,
}

impl MockInferenceClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Models returned by `list_models`. Without this, discovery fails.
    pub fn with_models(self, models: &[&str]) -> Self {
        *self.models.lock().unwrap() = Some(models.iter().map(|m| m.to_string()).collect());
        self
    }

    pub fn with_text(self, model: &str, text: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(model.to_string(), Reply::Text(text.to_string()));
        self
    }

    pub fn with_error(self, model: &str, message: &str) -> Self {
        self.with_provider_error(model, None, None, message)
    }

    pub fn with_provider_error(
        self,
        model: &str,
        status: Option<u16>,
        reason: Option<&str>,
        message: &str,
    ) -> Self {
        self.replies.lock().unwrap().insert(
            model.to_string(),
            Reply::Fail {
                status,
                reason: reason.map(str::to_string),
                message: message.to_string(),
            },
        );
        self
    }

    /// Models passed to `generate_content`/`generate_text`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn list_call_count(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }

    pub fn connected_keys(&self) -> Vec<String> {
        self.connected_keys.lock().unwrap().clone()
    }

    fn reply_for(&self, model: &str) -> Result<String> {
        self.calls.lock().unwrap().push(model.to_string());
        match self.replies.lock().unwrap().get(model) {
            Some(reply) => reply.to_result(),
            None => Err(Error::AiProvider {
                status: Some(404),
                reason: Some("NOT_FOUND".to_string()),
                message: format!("models/{} is not found", model),
            }),
        }
    }
}

#[async_trait]
impl InferenceService for MockInferenceClient {
    async fn list_models(&self) -> Result<Vec<String>> {
        *self.list_calls.lock().unwrap() += 1;
        self.models
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::ai_provider("model listing unavailable"))
    }

    async fn generate_content(&self, model: &str, _request: &InferenceRequest) -> Result<String> {
        self.reply_for(model)
    }

    async fn generate_text(&self, model: &str, _prompt: &str) -> Result<String> {
        self.reply_for(model)
    }
}

impl InferenceConnector for MockInferenceClient {
    fn connect(&self, api_key: String) -> Box<dyn InferenceService> {
        self.connected_keys.lock().unwrap().push(api_key);
        Box::new(self.clone())
    }
}
