pub mod client;
pub mod inference;
pub mod types;

pub use inference::{GeminiConnector, GeminiInferenceClient};

#[cfg(test)]
pub(crate) mod test_support {
    use wiremock::matchers::{method, path_regex};
    use wiremock::MockBuilder;

    pub const GENERATE_CONTENT_PATH_REGEX: &str = r"^/v1beta/models/[^/]+:generateContent$";

    pub fn post_path_regex(pattern: &str) -> MockBuilder {
        wiremock::Mock::given(method("POST")).and(path_regex(pattern))
    }

    pub fn text_response(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })
    }
}
