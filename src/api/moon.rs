//! Moon phase and zodiac endpoints

use axum::{Json, Router, extract::Query, routing::get};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::moon::{self, MoonPhase};
use crate::prompt::ZodiacSign;

/// Build moon router
pub fn router() -> Router {
    Router::new().route("/", get(moon_phase))
}

/// Query for `GET /api/moon`
#[derive(Debug, Deserialize)]
pub struct MoonQuery {
    /// `YYYY-MM-DD`; today (UTC) when absent
    pub date: Option<String>,
}

/// Moon phase response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoonResponse {
    pub date: String,
    pub phase: MoonPhase,
    pub cycle_position: f64,
}

async fn moon_phase(Query(query): Query<MoonQuery>) -> Result<Json<MoonResponse>, ApiError> {
    let date = match query.date.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| ApiError::BadRequest(format!("invalid date: {raw}")))?,
        _ => Utc::now().date_naive(),
    };

    Ok(Json(MoonResponse {
        date: date.format("%Y-%m-%d").to_string(),
        phase: moon::moon_phase(date),
        cycle_position: moon::cycle_position(date),
    }))
}

/// The twelve sign names offered by the form
pub async fn zodiac_signs() -> Json<Vec<&'static str>> {
    Json(ZodiacSign::ALL.iter().map(|s| s.name()).collect())
}
