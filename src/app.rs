//! Application orchestration for the outfit analysis flows.

use crate::ai::{GeminiConnector, InferenceConnector};
use crate::comparison::normalize_comparison;
use crate::fallback::{analyze_image, FailureKind, Success};
use crate::models::{Config, Credentials, ImageUpload, InferenceRequest};
use crate::{prompts, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Models probed by [`App::check_models`], in recommendation order.
pub const PROBE_MODELS: [&str; 4] = [
    "gemini-pro-vision",
    "gemini-pro",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
];

const NO_MODEL_AVAILABLE: &str = "사용 가능한 모델이 없습니다.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelAvailability {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelCheckReport {
    pub message: String,
    pub results: BTreeMap<String, ModelAvailability>,
    pub recommendation: String,
}

/// Holds the per-request inference wiring shared by every handler.
pub struct App {
    connector: Box<dyn InferenceConnector>,
    credentials: Credentials,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub connector: Box<dyn InferenceConnector>,
    pub credentials: Credentials,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices) -> Self {
        Self {
            connector: services.connector,
            credentials: services.credentials,
        }
    }

    /// Construct an app talking to Gemini with the key from the environment.
    pub fn new(config: &Config) -> Result<Self> {
        // One connection pool shared by every per-request client.
        let http_client = reqwest::Client::builder().build()?;
        info!(
            "Inference provider: Gemini ({}, timeout {}s)",
            config.gemini_base_url,
            config.gemini_timeout.as_secs()
        );

        Ok(Self::with_services(AppServices {
            connector: Box::new(GeminiConnector::new(
                http_client,
                config.gemini_base_url.clone(),
                config.gemini_timeout,
            )),
            credentials: Credentials::Environment,
        }))
    }

    async fn run(&self, request: InferenceRequest) -> std::result::Result<Success, FailureKind> {
        let outcome = analyze_image(
            self.credentials.resolve(),
            self.connector.as_ref(),
            &request,
        )
        .await;
        info!("Attempted models: [{}]", outcome.attempted.join(", "));
        outcome.into_result().map_err(|failure| failure.kind)
    }

    /// Free-form outfit analysis.
    pub async fn analyze(&self, upload: ImageUpload) -> std::result::Result<String, FailureKind> {
        let request = InferenceRequest::new(
            prompts::instruction(prompts::ANALYZE),
            upload.bytes,
            upload.mime_type,
        );
        let success = self.run(request).await?;
        Ok(success.text)
    }

    /// Strict-JSON celebrity/budget comparison.
    pub async fn automate(&self, upload: ImageUpload) -> std::result::Result<Value, FailureKind> {
        let request = InferenceRequest::new(
            prompts::instruction(prompts::AUTOMATE),
            upload.bytes,
            upload.mime_type,
        )
        .structured();
        let success = self.run(request).await?;
        info!(
            "Comparison generated by {} ({} chars)",
            success.model,
            success.text.len()
        );
        normalize_comparison(&success.text)
    }

    /// Probes [`PROBE_MODELS`] one at a time with a text-only request.
    pub async fn check_models(&self) -> std::result::Result<ModelCheckReport, FailureKind> {
        let api_key = self
            .credentials
            .resolve()
            .ok_or(FailureKind::MissingCredential)?;
        let service = self.connector.connect(api_key);

        let mut results = BTreeMap::new();
        let mut recommendation = None;
        for model in PROBE_MODELS {
            let availability = match service.generate_text(model, prompts::PROBE).await {
                Ok(_) => {
                    info!("Model {} is available", model);
                    recommendation.get_or_insert(model);
                    ModelAvailability {
                        available: true,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!("Model {} is unavailable: {}", model, e);
                    ModelAvailability {
                        available: false,
                        error: Some(e.to_string()),
                    }
                }
            };
            results.insert(model.to_string(), availability);
        }

        Ok(ModelCheckReport {
            message: "모델 가용성 확인 완료".to_string(),
            results,
            recommendation: recommendation.unwrap_or(NO_MODEL_AVAILABLE).to_string(),
        })
    }
}
