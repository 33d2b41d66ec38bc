use super::types::ErrorEnvelope;
use crate::{Error, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Lightweight Gemini REST client shared by the inference operations.
///
/// Unlike the per-model clients it is keyed only by credential: the model is
/// a per-call argument so a single value can walk a list of candidates.
pub struct GeminiHttpClient {
    pub(crate) client: Client,
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    timeout: Duration,
}

impl GeminiHttpClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, timeout, Client::new())
    }

    pub fn new_with_client(api_key: String, timeout: Duration, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Strips a leading `models/` so callers may pass either form.
    pub fn model_id(model: &str) -> &str {
        model.strip_prefix("models/").unwrap_or(model)
    }

    async fn send<Resp: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<Resp> {
        let response = builder
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Gemini: {}", e);
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            tracing::error!("Gemini API error (status {}): {}", status, error_text);
            let envelope = serde_json::from_str::<ErrorEnvelope>(&error_text).ok();
            let reason = envelope.as_ref().and_then(|e| e.error.reason());
            let detail = envelope
                .map(|e| e.error.message)
                .filter(|message| !message.is_empty())
                .unwrap_or(error_text);
            return Err(Error::AiProvider {
                status: Some(status.as_u16()),
                reason,
                message: format!("Gemini API error (status {}): {}", status, detail),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}\nBody: {}", e, body);
            Error::ai_provider(format!("Failed to parse Gemini response: {}", e))
        })
    }

    /// Calls Gemini's `models.list` endpoint (first page only).
    pub async fn list_models<Resp: DeserializeOwned>(&self) -> Result<Resp> {
        let url = format!("{}/v1beta/models", self.base_url);
        self.send(self.client.get(&url)).await
    }

    /// Calls Gemini's `generateContent` endpoint for `model`.
    pub async fn generate_content<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        model: &str,
        request: &Req,
    ) -> Result<Resp> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            Self::model_id(model)
        );
        self.send(
            self.client
                .post(&url)
                .header("Content-Type", "application/json")
                .json(request),
        )
        .await
    }
}
