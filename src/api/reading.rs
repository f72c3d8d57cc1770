//! Reading generation endpoint

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use serde::Serialize;

use super::{ApiError, ApiState};
use crate::Error;
use crate::moon::{self, MoonPhase};
use crate::prompt::ReadingForm;
use crate::reading::{Spell, parse_reading};

/// Build reading router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/", post(create_reading)).with_state(state)
}

/// A generated reading
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingResponse {
    pub spell: Spell,
    pub moon_phase: MoonPhase,
    pub life_path_number: u32,
}

async fn create_reading(
    State(state): State<Arc<ApiState>>,
    Json(form): Json<ReadingForm>,
) -> Result<Json<ReadingResponse>, ApiError> {
    let request = form.validate()?;

    let phase = moon::moon_phase_now();
    let prompt = state.assembler.assemble(&request, phase);
    let text = state.generator.generate_reading(&prompt).await?;

    let spell = parse_reading(&text, prompt.format).ok_or_else(|| {
        Error::ReadingMalformed(format!("no sections found in {} chars", text.len()))
    })?;

    tracing::info!(phase = %phase, zodiac = %request.zodiac_sign(), "reading generated");

    Ok(Json(ReadingResponse {
        spell,
        moon_phase: phase,
        life_path_number: request.life_path_number(),
    }))
}
