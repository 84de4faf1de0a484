//! Chat handler

use axum::{
    extract::{rejection::FormRejection, State},
    Form,
};
use std::time::Instant;

use crate::AppState;
use arogya_common::{errors::Result, Query};

/// Form field carrying the question
pub const MESSAGE_FIELD: &str = "msg";

/// First value of `msg` in a decoded form; later repeats are ignored.
pub fn message_field(pairs: Vec<(String, String)>) -> Option<String> {
    pairs
        .into_iter()
        .find(|(key, _)| key == MESSAGE_FIELD)
        .map(|(_, value)| value)
}

/// Answer one question.
///
/// The successful reply is the raw answer text, not a JSON document; clients
/// of the landing page read it as-is.
pub async fn chat(
    State(state): State<AppState>,
    form: std::result::Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Result<String> {
    let start = Instant::now();

    // A body that is not a form carries no message either
    let raw = match form {
        Ok(Form(pairs)) => message_field(pairs),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable chat form");
            None
        }
    };

    let query = Query::parse(raw.as_deref())?;
    tracing::info!(query = %query, "User query");

    let answer = state.pipeline.answer(&query).await?;
    tracing::info!(
        answer = %answer,
        latency_ms = start.elapsed().as_millis() as u64,
        "Generated response"
    );

    Ok(answer)
}
