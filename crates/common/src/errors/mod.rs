//! Error types for Arogya services
//!
//! Provides the single error taxonomy shared by the pipeline and the gateway:
//! - Distinct error types for each failure class
//! - HTTP status code mapping
//! - Public messages that never carry internal detail
//! - Error codes for log correlation

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification in logs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    MissingMessage,

    // Routing errors (4xxx)
    EndpointNotFound,
    MethodNotAllowed,

    // Rendering errors (5xxx)
    TemplateNotFound,

    // Upstream errors (8xxx)
    EmbeddingError,
    VectorIndexError,
    LlmError,
    GenerationFailed,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::MissingMessage => 1001,

            ErrorCode::EndpointNotFound => 4001,
            ErrorCode::MethodNotAllowed => 4002,

            ErrorCode::TemplateNotFound => 5001,

            ErrorCode::EmbeddingError => 8002,
            ErrorCode::VectorIndexError => 8003,
            ErrorCode::LlmError => 8004,
            ErrorCode::GenerationFailed => 8005,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("No message provided")]
    MissingMessage,

    // Routing errors
    #[error("Endpoint not found: {path}")]
    EndpointNotFound { path: String },

    #[error("Method {method} not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },

    // Rendering errors
    #[error("Template not found: {message}")]
    TemplateNotFound { message: String },

    // External service errors
    #[error("Embedding service error: {message}")]
    Embedding { message: String },

    #[error("Vector index error: {message}")]
    VectorIndex { message: String },

    #[error("LLM service error: {message}")]
    Llm { message: String },

    #[error("Generation failed: {message}")]
    GenerationFailed { message: String },

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::MissingMessage => ErrorCode::MissingMessage,
            AppError::EndpointNotFound { .. } => ErrorCode::EndpointNotFound,
            AppError::MethodNotAllowed { .. } => ErrorCode::MethodNotAllowed,
            AppError::TemplateNotFound { .. } => ErrorCode::TemplateNotFound,
            AppError::Embedding { .. } => ErrorCode::EmbeddingError,
            AppError::VectorIndex { .. } => ErrorCode::VectorIndexError,
            AppError::Llm { .. } => ErrorCode::LlmError,
            AppError::GenerationFailed { .. } => ErrorCode::GenerationFailed,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::MissingMessage => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::EndpointNotFound { .. } => StatusCode::NOT_FOUND,

            // 405 Method Not Allowed
            AppError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,

            // 500 Internal Server Error
            AppError::TemplateNotFound { .. }
            | AppError::Embedding { .. }
            | AppError::VectorIndex { .. }
            | AppError::Llm { .. }
            | AppError::GenerationFailed { .. }
            | AppError::Internal { .. }
            | AppError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the caller.
    ///
    /// Upstream and internal failures collapse into one generic message; the
    /// detail stays in the server log.
    pub fn public_message(&self) -> &'static str {
        match self {
            AppError::MissingMessage => "No message provided",
            AppError::EndpointNotFound { .. } => "Endpoint not found",
            AppError::MethodNotAllowed { .. } => "Method not allowed",
            AppError::TemplateNotFound { .. } => "Template not found",
            AppError::GenerationFailed { .. } => "Failed to generate response",
            _ => "Internal server error",
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Structured error body returned for every failed request
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let detail = self.to_string();

        if self.is_server_error() {
            tracing::error!(
                error = %detail,
                code = ?code,
                error_code = code.as_code(),
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %detail,
                code = ?code,
                error_code = code.as_code(),
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: self.public_message().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_message_is_client_error() {
        let err = AppError::MissingMessage;
        assert_eq!(err.code(), ErrorCode::MissingMessage);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "No message provided");
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_upstream_errors_hide_detail() {
        let errors = [
            AppError::Embedding { message: "401 from embeddings".into() },
            AppError::VectorIndex { message: "index arogya-sahayak unreachable".into() },
            AppError::Llm { message: "quota exceeded".into() },
            AppError::Internal { message: "boom".into() },
        ];

        for err in errors {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(err.public_message(), "Internal server error");
        }
    }

    #[test]
    fn test_generation_failed_message() {
        let err = AppError::GenerationFailed {
            message: "no answer field".into(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Failed to generate response");
        assert_eq!(err.code().as_code(), 8005);
    }

    #[test]
    fn test_routing_errors() {
        let err = AppError::EndpointNotFound { path: "/nope".into() };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.public_message(), "Endpoint not found");

        let err = AppError::MethodNotAllowed {
            method: "GET".into(),
            path: "/get".into(),
        };
        assert_eq!(err.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_config_error_is_configuration() {
        let err: AppError = config::ConfigError::Message("bad port".into()).into();
        assert!(matches!(err, AppError::Configuration { .. }));
        assert_eq!(err.code().as_code(), 9002);
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_error_response_shape() {
        let body = ErrorResponse {
            error: AppError::MissingMessage.public_message().to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"error": "No message provided"}));
    }
}
