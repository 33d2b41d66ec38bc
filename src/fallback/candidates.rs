use crate::ai::InferenceService;
use tracing::{info, warn};

/// Known models, newest/cheapest first. Used verbatim when discovery is
/// unavailable or yields nothing usable.
pub const STATIC_FALLBACK_MODELS: [&str; 5] = [
    "gemini-2.0-flash-exp",
    "gemini-1.5-flash-002",
    "gemini-1.5-flash",
    "gemini-pro-vision",
    "gemini-pro",
];

/// Substrings marking lightweight, general, or vision-capable variants.
pub const CAPABILITY_HINTS: [&str; 3] = ["flash", "pro", "vision"];

pub const MAX_DISCOVERED_CANDIDATES: usize = 5;

/// Narrows a raw model listing to at most [`MAX_DISCOVERED_CANDIDATES`]
/// image-capable identifiers, preserving listing order.
pub fn filter_discovered(models: &[String]) -> Vec<String> {
    models
        .iter()
        .map(String::as_str)
        .map(|name| name.strip_prefix("models/").unwrap_or(name))
        .filter(|name| !name.is_empty() && !name.contains("embedding"))
        .filter(|name| CAPABILITY_HINTS.iter().any(|hint| name.contains(hint)))
        .take(MAX_DISCOVERED_CANDIDATES)
        .map(str::to_string)
        .collect()
}

fn static_fallback() -> Vec<String> {
    STATIC_FALLBACK_MODELS.iter().map(|m| m.to_string()).collect()
}

/// Candidate list for one request. Never fails: discovery problems only
/// select the static list.
pub async fn resolve_candidates(service: &dyn InferenceService) -> Vec<String> {
    match service.list_models().await {
        Ok(models) => {
            info!("Available models: {:?}", models);
            let filtered = filter_discovered(&models);
            if filtered.is_empty() {
                info!("No image-capable models discovered, using default model list");
                static_fallback()
            } else {
                filtered
            }
        }
        Err(e) => {
            warn!("Model listing failed, using default model list: {}", e);
            static_fallback()
        }
    }
}
