use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::races::RaceDay;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RacesQuery {
    pub date: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/races", get(races_for_date))
}

/// Race results for a day (`YYYY-MM-DD`, default today in UTC).
async fn races_for_date(
    State(state): State<AppState>,
    Query(q): Query<RacesQuery>,
) -> AppResult<Json<RaceDay>> {
    let date = match q.date.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| AppError::BadRequest(format!("Invalid date: {}", raw)))?,
        _ => Utc::now().date_naive(),
    };
    Ok(Json(state.races.races_for(date).await))
}
