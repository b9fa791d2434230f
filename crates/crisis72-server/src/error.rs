//! Error types for the game API.
//!
//! [`ApiError`] turns session failures into HTTP responses with a JSON
//! body of the form `{"error": "...", "status": 409}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use crisis72_core::rules::RuleError;
use crisis72_core::session::SessionError;

/// Errors that can occur in the game API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A session operation was rejected or failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The requested resource does not exist (yet).
    #[error("not found: {0}")]
    NotFound(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Session(
                SessionError::Busy
                | SessionError::WrongPhase { .. }
                | SessionError::Superseded
                | SessionError::Rule(RuleError::GameAlreadyOver),
            ) => StatusCode::CONFLICT,
            Self::Session(
                SessionError::UnknownOption { .. }
                | SessionError::Rule(RuleError::MissingEffect { .. }),
            ) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Session(SessionError::Content { .. }) => StatusCode::BAD_GATEWAY,
            Self::Session(SessionError::Interrupted(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use crisis72_core::content::ContentError;
    use crisis72_core::session::NEXT_STEP_FAILED_MESSAGE;

    use super::*;

    #[test]
    fn statuses_follow_the_failure_kind() {
        assert_eq!(ApiError::from(SessionError::Busy).status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::from(SessionError::UnknownOption {
                option_id: String::from("Z")
            })
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::NotFound(String::from("report")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(SessionError::Interrupted(String::from("task panicked"))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn content_errors_show_the_player_message() {
        let err = ApiError::from(SessionError::Content {
            message: NEXT_STEP_FAILED_MESSAGE.to_owned(),
            source: ContentError::TimedOut { timeout_ms: 30_000 },
        });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), NEXT_STEP_FAILED_MESSAGE);
    }
}
