//! Landing page

use axum::{extract::State, response::Html};

use crate::AppState;
use arogya_common::errors::{AppError, Result};

/// Name of the landing page inside the template directory
pub const INDEX_TEMPLATE: &str = "index.html";

/// Serve the chat landing page
pub async fn index(State(state): State<AppState>) -> Result<Html<String>> {
    let path = state.config.server.template_dir.join(INDEX_TEMPLATE);

    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Ok(Html(page)),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Error rendering template");
            Err(AppError::TemplateNotFound {
                message: format!("{}: {}", path.display(), e),
            })
        }
    }
}
