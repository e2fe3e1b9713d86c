use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// General error type for store implementations, configuration and handlers.
///
/// The resolver itself never returns this type; store and session provider
/// implementations do, and the resolver folds their failures into the
/// resulting [`AuthContext`](crate::context::AuthContext).
#[derive(Debug, thiserror::Error)]
pub enum PinpointError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// JSON body written for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
    error_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retryable: Option<bool>,
}

impl PinpointError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) | Self::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Whether the client may retry the same request later.
    ///
    /// Infrastructure faults are retryable; authorization decisions are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_))
    }

    /// Message safe to send to clients. 5xx details stay in the server log.
    fn safe_message(&self) -> String {
        match self {
            Self::NotFound(msg) => format!("Not found: {}", msg),
            Self::BadRequest(msg) => format!("Bad request: {}", msg),
            Self::Unauthorized(msg) => format!("Unauthorized: {}", msg),
            Self::Forbidden(msg) => format!("Forbidden: {}", msg),
            Self::Internal(_) | Self::Anyhow(_) => "Internal server error".to_string(),
            Self::ServiceUnavailable(_) => "Service unavailable".to_string(),
        }
    }
}

impl IntoResponse for PinpointError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_id = uuid::Uuid::new_v4().to_string();

        tracing::error!(
            status = status.as_u16(),
            error_id = %error_id,
            error = %self,
            "Request failed"
        );

        let body = ErrorResponse {
            error: self.safe_message(),
            error_id,
            retryable: self.is_retryable().then_some(true),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for store implementations and configuration.
pub type Result<T> = std::result::Result<T, PinpointError>;

impl From<serde_json::Error> for PinpointError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            PinpointError::BadRequest(format!("JSON error: {}", err))
        } else {
            PinpointError::Internal(format!("JSON serialization error: {}", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(PinpointError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(PinpointError::unauthorized("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(PinpointError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            PinpointError::service_unavailable("x").status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            PinpointError::from(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_retryable() {
        assert!(PinpointError::service_unavailable("db down").is_retryable());
        assert!(!PinpointError::forbidden("no").is_retryable());
    }

    #[test]
    fn test_json_error_classification() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(PinpointError::from(err), PinpointError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_production_response_hides_internal_details() {
        let response = PinpointError::internal("connection string leaked").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["error"], "Internal server error");
        assert!(!json.to_string().contains("connection string"));
        assert!(json["error_id"].is_string());
        assert!(json.get("retryable").is_none());
    }

    #[tokio::test]
    async fn test_unavailable_response_is_marked_retryable() {
        let response = PinpointError::service_unavailable("store").into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["retryable"], true);
    }
}
