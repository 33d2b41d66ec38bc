use crate::Error;
use thiserror::Error;

/// Caller-facing failure taxonomy. `Display` yields the user-facing message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    #[error("Gemini API 키가 설정되지 않았습니다.")]
    MissingCredential,

    #[error("Gemini API 키가 유효하지 않습니다. API 키를 확인해주세요.")]
    InvalidCredential,

    #[error("API 사용량 한도를 초과했습니다. 잠시 후 다시 시도해주세요.")]
    QuotaExceeded,

    #[error("이미지가 안전 필터에 의해 차단되었습니다.")]
    ContentRejected,

    #[error("API 오류: {0}")]
    UpstreamError(String),

    #[error("AI 응답을 해석하는 데 실패했습니다.")]
    MalformedResponse,

    #[error("AI 응답 형식이 올바르지 않습니다.")]
    InvalidResponseShape,
}

const CREDENTIAL_REASONS: [&str; 4] = [
    "API_KEY_INVALID",
    "API_KEY_EXPIRED",
    "UNAUTHENTICATED",
    "PERMISSION_DENIED",
];

const QUOTA_REASONS: [&str; 3] = ["RESOURCE_EXHAUSTED", "QUOTA_EXCEEDED", "RATE_LIMIT_EXCEEDED"];

const CONTENT_REASONS: [&str; 5] = [
    "SAFETY",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
    "IMAGE_SAFETY",
];

/// Maps a provider error onto [`FailureKind`].
///
/// Structured metadata (error reason, then HTTP status) wins; the message
/// text is only consulted when neither is conclusive.
pub fn classify(err: &Error) -> FailureKind {
    if let Error::AiProvider { status, reason, .. } = err {
        if let Some(reason) = reason.as_deref() {
            if CREDENTIAL_REASONS.contains(&reason) {
                return FailureKind::InvalidCredential;
            }
            if QUOTA_REASONS.contains(&reason) {
                return FailureKind::QuotaExceeded;
            }
            if CONTENT_REASONS.contains(&reason) {
                return FailureKind::ContentRejected;
            }
        }
        match status {
            Some(401) => return FailureKind::InvalidCredential,
            Some(429) => return FailureKind::QuotaExceeded,
            _ => {}
        }
    }
    classify_message(&err.to_string())
}

fn classify_message(message: &str) -> FailureKind {
    if message.contains("API_KEY_INVALID") || message.contains("401") {
        FailureKind::InvalidCredential
    } else if message.contains("QUOTA_EXCEEDED")
        || message.contains("RESOURCE_EXHAUSTED")
        || message.contains("429")
    {
        FailureKind::QuotaExceeded
    } else if message.contains("SAFETY") {
        FailureKind::ContentRejected
    } else {
        FailureKind::UpstreamError(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(status: Option<u16>, reason: Option<&str>, message: &str) -> Error {
        Error::AiProvider {
            status,
            reason: reason.map(str::to_string),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_invalid_key_reason_on_bad_request() {
        let err = provider(Some(400), Some("API_KEY_INVALID"), "API key not valid");
        assert_eq!(classify(&err), FailureKind::InvalidCredential);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            classify(&provider(Some(401), None, "nope")),
            FailureKind::InvalidCredential
        );
        assert_eq!(
            classify(&provider(Some(429), None, "slow down")),
            FailureKind::QuotaExceeded
        );
    }

    #[test]
    fn test_resource_exhausted_reason() {
        let err = provider(Some(429), Some("RESOURCE_EXHAUSTED"), "quota");
        assert_eq!(classify(&err), FailureKind::QuotaExceeded);
    }

    #[test]
    fn test_safety_block() {
        let err = provider(None, Some("SAFETY"), "Candidate was blocked due to SAFETY");
        assert_eq!(classify(&err), FailureKind::ContentRejected);
    }

    #[test]
    fn test_message_fallback_without_metadata() {
        assert_eq!(
            classify(&Error::Generic("[GoogleGenerativeAI Error]: 429 Too Many Requests".into())),
            FailureKind::QuotaExceeded
        );
        assert_eq!(
            classify(&Error::ai_provider("API_KEY_INVALID")),
            FailureKind::InvalidCredential
        );
        assert_eq!(
            classify(&Error::ai_provider("response blocked: SAFETY")),
            FailureKind::ContentRejected
        );
    }

    #[test]
    fn test_anything_else_is_upstream_error_with_raw_message() {
        let err = provider(Some(500), Some("INTERNAL"), "Gemini API error (status 500): oops");
        assert_eq!(
            classify(&err),
            FailureKind::UpstreamError("Gemini API error (status 500): oops".to_string())
        );
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            FailureKind::UpstreamError("boom".to_string()).to_string(),
            "API 오류: boom"
        );
        assert_eq!(
            FailureKind::MissingCredential.to_string(),
            "Gemini API 키가 설정되지 않았습니다."
        );
    }
}
