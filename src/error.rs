// Error handling module for the pricing API
// Provides the HTTP-facing error type and its JSON response format

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, warn};
use utoipa::ToSchema;

use crate::pricing::PricingError;
use crate::query;
use crate::repository::RepositoryError;

/// Main error type for the API
/// All handlers should return Result<T, ApiError>
#[derive(Debug)]
pub enum ApiError {
    /// Request DTO failed validation
    /// Maps to HTTP 400 Bad Request
    ValidationError(validator::ValidationErrors),

    /// Malformed id, bad price, out-of-range setting, bad query parameter
    /// Maps to HTTP 400 Bad Request
    InvalidArgument(String),

    /// Resource not found by ID
    /// Maps to HTTP 404 Not Found
    NotFound { resource: String, id: String },

    /// Request conflicts with the resource's current state
    /// Maps to HTTP 409 Conflict
    Conflict { message: String },

    /// Persistence layer unreachable; the client may retry
    /// Maps to HTTP 503 Service Unavailable
    /// Sensitive details are filtered from client responses
    UpstreamUnavailable(String),

    /// Internal server errors
    /// Maps to HTTP 500 Internal Server Error
    /// Sensitive details are filtered from client responses
    InternalError(String),
}

/// Consistent error response structure
///
/// Fields follow snake_case naming convention for consistency.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "VALIDATION_ERROR", "NOT_FOUND")
    pub error_code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (e.g., field-level validation errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,

    /// Whether repeating the same request may succeed
    pub retryable: bool,

    /// ISO 8601 timestamp of when the error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    fn new(error_code: &str, message: String, details: Option<serde_json::Value>, retryable: bool) -> Self {
        Self {
            error_code: error_code.to_string(),
            message,
            details,
            retryable,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = self.to_error_response();
        (status, Json(error_response)).into_response()
    }
}

impl ApiError {
    /// Convert ApiError to HTTP status code and ErrorResponse
    ///
    /// Expected client errors log at debug, conflicts at warn, and
    /// server-side failures at error with the detail kept out of the body.
    fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new(
                        "VALIDATION_ERROR",
                        "Request validation failed".to_string(),
                        Some(serde_json::to_value(errors).unwrap_or(serde_json::json!({}))),
                        false,
                    ),
                )
            }
            ApiError::InvalidArgument(message) => {
                debug!("Invalid argument: {}", message);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("INVALID_ARGUMENT", message.clone(), None, false),
                )
            }
            ApiError::NotFound { resource, id } => {
                debug!("Resource not found: {} with id {}", resource, id);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::new(
                        "NOT_FOUND",
                        format!("{} with id {} not found", resource, id),
                        None,
                        false,
                    ),
                )
            }
            ApiError::Conflict { message } => {
                warn!("Conflict error: {}", message);
                (
                    StatusCode::CONFLICT,
                    ErrorResponse::new("CONFLICT", message.clone(), None, false),
                )
            }
            ApiError::UpstreamUnavailable(detail) => {
                error!("Upstream unavailable: {}", detail);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse::new(
                        "UPSTREAM_UNAVAILABLE",
                        "The data store is temporarily unavailable, please retry".to_string(),
                        None,
                        true,
                    ),
                )
            }
            ApiError::InternalError(internal_msg) => {
                error!("Internal error: {}", internal_msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(
                        "INTERNAL_ERROR",
                        "An internal server error occurred".to_string(),
                        None,
                        false,
                    ),
                )
            }
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PricingError> for ApiError {
    fn from(error: PricingError) -> Self {
        match error {
            PricingError::InvalidArgument(message) => ApiError::InvalidArgument(message),
            PricingError::NotFound { resource, id } => ApiError::NotFound { resource, id },
            PricingError::UpstreamUnavailable(detail) => ApiError::UpstreamUnavailable(detail),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        ApiError::UpstreamUnavailable(error.to_string())
    }
}

/// Convert validator errors to ApiError
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

impl From<query::ValidationError> for ApiError {
    fn from(error: query::ValidationError) -> Self {
        ApiError::InvalidArgument(error.message)
    }
}
