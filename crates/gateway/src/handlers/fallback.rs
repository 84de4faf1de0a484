//! Fallback handlers for unmatched routes and methods

use arogya_common::errors::AppError;
use axum::http::{Method, Uri};

/// Any path without a route
pub async fn not_found(uri: Uri) -> AppError {
    AppError::EndpointNotFound {
        path: uri.path().to_string(),
    }
}

/// A known path called with the wrong method
pub async fn method_not_allowed(method: Method, uri: Uri) -> AppError {
    AppError::MethodNotAllowed {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}
