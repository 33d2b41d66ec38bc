use super::candidates::resolve_candidates;
use super::classify::{classify, FailureKind};
use crate::ai::{InferenceConnector, InferenceService};
use crate::models::InferenceRequest;
use crate::{Error, Result};
use std::future::Future;
use tracing::{error, info, warn};

const NO_CANDIDATES_DETAIL: &str = "no candidate models were attempted";

/// Raw result of walking a candidate list.
#[derive(Debug)]
pub struct Attempts<T> {
    /// Identifiers actually tried, in order.
    pub attempted: Vec<String>,
    /// First success together with the identifier that produced it.
    pub success: Option<(String, T)>,
    /// Error from the most recent failed attempt.
    pub last_error: Option<Error>,
}

/// Tries `attempt` for each candidate in order and stops at the first `Ok`.
///
/// Empty identifiers are skipped without being recorded. Each candidate is
/// tried at most once and attempts never overlap.
pub async fn first_success<T, F, Fut>(candidates: &[String], mut attempt: F) -> Attempts<T>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempts = Attempts {
        attempted: Vec::new(),
        success: None,
        last_error: None,
    };

    for model in candidates {
        if model.trim().is_empty() {
            continue;
        }
        attempts.attempted.push(model.clone());

        info!("Trying model {}...", model);
        match attempt(model.clone()).await {
            Ok(value) => {
                info!("Model {} succeeded", model);
                attempts.success = Some((model.clone(), value));
                break;
            }
            Err(e) => {
                warn!("Model {} failed: {}", model, e);
                attempts.last_error = Some(e);
            }
        }
    }

    attempts
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Success {
    pub model: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    /// Raw detail of the last attempt's error.
    pub detail: String,
}

/// Terminal result of one fallback run.
#[derive(Debug, Clone)]
pub struct AggregateOutcome {
    pub attempted: Vec<String>,
    pub result: std::result::Result<Success, Failure>,
}

impl AggregateOutcome {
    pub fn missing_credential() -> Self {
        Self {
            attempted: Vec::new(),
            result: Err(Failure {
                kind: FailureKind::MissingCredential,
                detail: FailureKind::MissingCredential.to_string(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn text(&self) -> Option<&str> {
        self.result.as_ref().ok().map(|s| s.text.as_str())
    }

    pub fn into_result(self) -> std::result::Result<Success, Failure> {
        self.result
    }
}

impl From<Attempts<String>> for AggregateOutcome {
    fn from(attempts: Attempts<String>) -> Self {
        let result = match (attempts.success, attempts.last_error) {
            (Some((model, text)), _) => Ok(Success { model, text }),
            (None, Some(err)) => Err(Failure {
                kind: classify(&err),
                detail: err.to_string(),
            }),
            (None, None) => Err(Failure {
                kind: FailureKind::UpstreamError(NO_CANDIDATES_DETAIL.to_string()),
                detail: NO_CANDIDATES_DETAIL.to_string(),
            }),
        };

        if let Err(failure) = &result {
            error!(
                "All attempted models ({}) failed: {}",
                attempts.attempted.join(", "),
                failure.detail
            );
        }

        Self {
            attempted: attempts.attempted,
            result,
        }
    }
}

/// Runs an [`InferenceRequest`] across candidate models for one request.
pub struct FallbackRequester<'a> {
    service: &'a dyn InferenceService,
}

impl<'a> FallbackRequester<'a> {
    pub fn new(service: &'a dyn InferenceService) -> Self {
        Self { service }
    }

    /// Discovers candidates, then walks them until the first success.
    pub async fn request_with_fallback(&self, request: &InferenceRequest) -> AggregateOutcome {
        let candidates = resolve_candidates(self.service).await;
        self.request_with_candidates(&candidates, request).await
    }

    pub async fn request_with_candidates(
        &self,
        candidates: &[String],
        request: &InferenceRequest,
    ) -> AggregateOutcome {
        let service = self.service;
        first_success(candidates, |model| async move {
            service.generate_content(&model, request).await
        })
        .await
        .into()
    }
}

/// Entry point for the HTTP boundary and the CLI.
///
/// A missing credential short-circuits before any client is built or any
/// network call is made.
pub async fn analyze_image(
    credential: Option<String>,
    connector: &dyn InferenceConnector,
    request: &InferenceRequest,
) -> AggregateOutcome {
    let Some(api_key) = credential else {
        error!("Gemini API key is not configured");
        return AggregateOutcome::missing_credential();
    };

    let service = connector.connect(api_key);
    FallbackRequester::new(service.as_ref())
        .request_with_fallback(request)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockInferenceClient;
    use crate::fallback::STATIC_FALLBACK_MODELS;
    use pretty_assertions::assert_eq;

    fn request() -> InferenceRequest {
        InferenceRequest::new("analyze", vec![0xFF, 0xD8, 0xFF], "image/jpeg")
    }

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_nth_candidate_success_records_n_attempts() {
        let client = MockInferenceClient::new()
            .with_error("m1", "boom")
            .with_error("m2", "boom")
            .with_text("m3", "found it")
            .with_text("m4", "never reached");

        let outcome = FallbackRequester::new(&client)
            .request_with_candidates(&names(&["m1", "m2", "m3", "m4"]), &request())
            .await;

        assert_eq!(outcome.attempted, names(&["m1", "m2", "m3"]));
        assert_eq!(
            outcome.result,
            Ok(Success {
                model: "m3".to_string(),
                text: "found it".to_string()
            })
        );
        assert_eq!(client.calls(), names(&["m1", "m2", "m3"]));
    }

    #[tokio::test]
    async fn test_quota_then_auth_then_success() {
        let client = MockInferenceClient::new()
            .with_provider_error("m1", Some(429), Some("RESOURCE_EXHAUSTED"), "quota")
            .with_provider_error("m2", Some(400), Some("API_KEY_INVALID"), "bad key")
            .with_text("m3", "ok");

        let outcome = FallbackRequester::new(&client)
            .request_with_candidates(&names(&["m1", "m2", "m3"]), &request())
            .await;

        assert_eq!(outcome.text(), Some("ok"));
        assert_eq!(outcome.attempted, names(&["m1", "m2", "m3"]));
    }

    #[tokio::test]
    async fn test_all_generic_failures_keep_last_detail() {
        let client = MockInferenceClient::new()
            .with_error("m1", "m1 exploded")
            .with_error("m2", "m2 exploded")
            .with_error("m3", "m3 exploded");

        let outcome = FallbackRequester::new(&client)
            .request_with_candidates(&names(&["m1", "m2", "m3"]), &request())
            .await;

        assert_eq!(outcome.attempted, names(&["m1", "m2", "m3"]));
        let failure = outcome.into_result().unwrap_err();
        assert_eq!(
            failure.kind,
            FailureKind::UpstreamError("m3 exploded".to_string())
        );
        assert_eq!(failure.detail, "m3 exploded");
    }

    #[tokio::test]
    async fn test_last_failure_drives_classification() {
        let client = MockInferenceClient::new()
            .with_error("m1", "generic")
            .with_provider_error("m2", Some(429), None, "Too Many Requests");

        let outcome = FallbackRequester::new(&client)
            .request_with_candidates(&names(&["m1", "m2"]), &request())
            .await;

        assert_eq!(
            outcome.into_result().unwrap_err().kind,
            FailureKind::QuotaExceeded
        );
    }

    #[tokio::test]
    async fn test_empty_identifiers_are_skipped() {
        let client = MockInferenceClient::new().with_text("m1", "ok");

        let outcome = FallbackRequester::new(&client)
            .request_with_candidates(&names(&["", "  ", "m1"]), &request())
            .await;

        assert_eq!(outcome.attempted, names(&["m1"]));
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_empty_candidate_list_synthesizes_detail() {
        let client = MockInferenceClient::new();

        let outcome = FallbackRequester::new(&client)
            .request_with_candidates(&[], &request())
            .await;

        assert!(outcome.attempted.is_empty());
        let failure = outcome.into_result().unwrap_err();
        assert_eq!(failure.detail, NO_CANDIDATES_DETAIL);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_discovered_candidates_are_used() {
        let client = MockInferenceClient::new()
            .with_models(&["models/gemini-2.5-flash", "models/text-embedding-004"])
            .with_text("gemini-2.5-flash", "discovered");

        let outcome = FallbackRequester::new(&client)
            .request_with_fallback(&request())
            .await;

        assert_eq!(outcome.attempted, names(&["gemini-2.5-flash"]));
        assert_eq!(outcome.text(), Some("discovered"));
    }

    #[tokio::test]
    async fn test_discovery_failure_alone_is_not_a_failure() {
        let client = MockInferenceClient::new().with_text("gemini-2.0-flash-exp", "fine");

        let outcome = FallbackRequester::new(&client)
            .request_with_fallback(&request())
            .await;

        assert_eq!(client.list_call_count(), 1);
        assert_eq!(outcome.attempted, names(&["gemini-2.0-flash-exp"]));
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_every_static_candidate_fails_in_order() {
        let client = MockInferenceClient::new();

        let outcome = FallbackRequester::new(&client)
            .request_with_fallback(&request())
            .await;

        assert_eq!(outcome.attempted, names(&STATIC_FALLBACK_MODELS));
        assert_eq!(client.calls(), names(&STATIC_FALLBACK_MODELS));
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_missing_credential_short_circuits() {
        let connector = MockInferenceClient::new().with_text("gemini-2.0-flash-exp", "ok");

        let outcome = analyze_image(None, &connector, &request()).await;

        assert!(outcome.attempted.is_empty());
        assert_eq!(
            outcome.into_result().unwrap_err().kind,
            FailureKind::MissingCredential
        );
        assert!(connector.connected_keys().is_empty());
        assert_eq!(connector.list_call_count(), 0);
        assert!(connector.calls().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_image_connects_with_credential() {
        let connector = MockInferenceClient::new().with_text("gemini-2.0-flash-exp", "ok");

        let outcome = analyze_image(Some("secret".to_string()), &connector, &request()).await;

        assert_eq!(connector.connected_keys(), names(&["secret"]));
        assert_eq!(outcome.text(), Some("ok"));
    }

    #[tokio::test]
    async fn test_first_success_is_generic_over_output() {
        let candidates = names(&["a", "bb", "ccc"]);

        let attempts = first_success(&candidates, |model| async move {
            if model.len() < 2 {
                Err(Error::Generic(format!("{} too short", model)))
            } else {
                Ok(model.len())
            }
        })
        .await;

        assert_eq!(attempts.attempted, names(&["a", "bb"]));
        assert_eq!(attempts.success, Some(("bb".to_string(), 2)));
        assert!(attempts.last_error.is_some());
    }
}
