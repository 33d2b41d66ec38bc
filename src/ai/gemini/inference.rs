//! Gemini implementation of [`InferenceService`].

use super::client::GeminiHttpClient;
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData,
    ListModelsResponse, Part,
};
use crate::ai::{InferenceConnector, InferenceService};
use crate::models::InferenceRequest;
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Finish reasons that make a candidate unusable even when it carries text.
const BLOCKED_FINISH_REASONS: [&str; 6] = [
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
    "IMAGE_SAFETY",
];

pub struct GeminiInferenceClient {
    http: GeminiHttpClient,
}

impl GeminiInferenceClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, timeout, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, timeout: Duration, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, timeout, client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    fn build_request(request: &InferenceRequest) -> GenerateContentRequest {
        use base64::Engine as _;
        let data = base64::engine::general_purpose::STANDARD.encode(&request.image);

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::Text {
                        text: request.instruction.clone(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: request.mime_type.clone(),
                            data,
                        },
                    },
                ],
            }],
            generation_config: request.structured_output.then(|| GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
            }),
        }
    }

    /// Concatenates the text parts of the first candidate, surfacing blocked
    /// prompts and blocked candidates as provider errors.
    fn extract_text(response: GenerateContentResponse) -> Result<String> {
        let Some(candidate) = response.candidates.into_iter().next() else {
            if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
                return Err(Error::AiProvider {
                    status: None,
                    message: format!("Gemini blocked the prompt due to {}", reason),
                    reason: Some(reason),
                });
            }
            return Err(Error::ai_provider("No candidates in Gemini response"));
        };

        if let Some(reason) = candidate
            .finish_reason
            .filter(|r| BLOCKED_FINISH_REASONS.contains(&r.as_str()))
        {
            return Err(Error::AiProvider {
                status: None,
                message: format!("Candidate was blocked due to {}", reason),
                reason: Some(reason),
            });
        }

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text),
                Part::InlineData { .. } => None,
            })
            .collect();

        if text.is_empty() {
            return Err(Error::ai_provider("No text in Gemini response"));
        }
        Ok(text)
    }
}

#[async_trait]
impl InferenceService for GeminiInferenceClient {
    async fn list_models(&self) -> Result<Vec<String>> {
        let response: ListModelsResponse = self.http.list_models().await?;

        Ok(response
            .models
            .into_iter()
            .map(|m| GeminiHttpClient::model_id(&m.name).to_string())
            .collect())
    }

    async fn generate_content(&self, model: &str, request: &InferenceRequest) -> Result<String> {
        tracing::debug!(
            "Sending {} byte {} image to Gemini model {} (structured: {})",
            request.image.len(),
            request.mime_type,
            model,
            request.structured_output
        );

        let body = Self::build_request(request);
        let response: GenerateContentResponse = self.http.generate_content(model, &body).await?;
        Self::extract_text(response)
    }

    async fn generate_text(&self, model: &str, prompt: &str) -> Result<String> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::Text {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: None,
        };
        let response: GenerateContentResponse = self.http.generate_content(model, &body).await?;
        Self::extract_text(response)
    }
}

/// Connector producing a [`GeminiInferenceClient`] per request while sharing
/// one `reqwest` connection pool.
#[derive(Clone)]
pub struct GeminiConnector {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl GeminiConnector {
    pub fn new(client: reqwest::Client, base_url: String, timeout: Duration) -> Self {
        Self {
            client,
            base_url,
            timeout,
        }
    }
}

impl InferenceConnector for GeminiConnector {
    fn connect(&self, api_key: String) -> Box<dyn InferenceService> {
        Box::new(
            GeminiInferenceClient::new_with_client(api_key, self.timeout, self.client.clone())
                .with_base_url(self.base_url.clone()),
        )
    }
}
