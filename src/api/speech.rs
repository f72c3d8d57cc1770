//! Narration endpoint

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;

use super::{ApiError, ApiState};
use crate::audio::{decode_speech, to_wav};

/// Build speech router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/", post(synthesize)).with_state(state)
}

/// Text to narrate
#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
}

/// Narrate text, returning a 16-bit mono WAV file
async fn synthesize(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SpeechRequest>,
) -> Result<Response, ApiError> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("Empty text".to_string()));
    }

    let payload = state.synthesizer.synthesize(text).await?;
    let wav = to_wav(&decode_speech(&payload)?)?;

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "audio/wav")], wav).into_response())
}
