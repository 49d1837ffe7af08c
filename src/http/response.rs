//! Mapping guard decisions to HTTP responses.
//!
//! Error bodies share one shape:
//! `{"error": {"code": "GEN-...", "http_code": 401, "message": "..."}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::guard::GuardOutcome;
use crate::policy::LimitTier;

/// Status, error code and message for a denial.
pub fn denial_parts(outcome: GuardOutcome) -> Option<(StatusCode, &'static str, &'static str)> {
    let parts = match outcome {
        GuardOutcome::Allowed => return None,
        GuardOutcome::MethodNotAllowed => (
            StatusCode::METHOD_NOT_ALLOWED,
            "GEN-METHOD-NOT-ALLOWED",
            "Method Not Allowed",
        ),
        GuardOutcome::Unauthorized => (StatusCode::UNAUTHORIZED, "GEN-UNAUTHORIZED", "Unauthorized"),
        GuardOutcome::Forbidden => (StatusCode::FORBIDDEN, "GEN-FORBIDDEN", "Forbidden"),
        GuardOutcome::LimitExceeded(LimitTier::Key) => (
            StatusCode::TOO_MANY_REQUESTS,
            "GEN-UNWILLING",
            "You have reached the limit for using this API.",
        ),
        GuardOutcome::LimitExceeded(LimitTier::Method) => (
            StatusCode::TOO_MANY_REQUESTS,
            "GEN-UNWILLING",
            "The limit for using this API method has been reached",
        ),
    };
    Some(parts)
}

/// JSON error response.
pub fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    let body = json!({
        "error": {
            "code": code,
            "http_code": status.as_u16(),
            "message": message,
        }
    });
    (status, Json(body)).into_response()
}

/// Response for a denied request. `Allowed` has no response of its own and
/// maps to 500 if it ever reaches here.
pub fn denial_response(outcome: GuardOutcome) -> Response {
    match denial_parts(outcome) {
        Some((status, code, message)) => error_response(status, code, message),
        None => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "GEN-INTERNAL-ERROR",
            "Internal Error",
        ),
    }
}

/// Response when a store the guard depends on is unreachable.
pub fn unavailable_response() -> Response {
    error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        "GEN-UNAVAILABLE",
        "Service Unavailable",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denial_statuses() {
        let cases = [
            (GuardOutcome::MethodNotAllowed, StatusCode::METHOD_NOT_ALLOWED),
            (GuardOutcome::Unauthorized, StatusCode::UNAUTHORIZED),
            (GuardOutcome::Forbidden, StatusCode::FORBIDDEN),
            (GuardOutcome::LimitExceeded(LimitTier::Key), StatusCode::TOO_MANY_REQUESTS),
            (GuardOutcome::LimitExceeded(LimitTier::Method), StatusCode::TOO_MANY_REQUESTS),
        ];
        for (outcome, status) in cases {
            assert_eq!(denial_response(outcome).status(), status, "{outcome}");
        }
        assert!(denial_parts(GuardOutcome::Allowed).is_none());
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = denial_response(GuardOutcome::LimitExceeded(LimitTier::Method));
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["error"]["code"], "GEN-UNWILLING");
        assert_eq!(body["error"]["http_code"], 429);
        assert_eq!(
            body["error"]["message"],
            "The limit for using this API method has been reached"
        );
    }
}
