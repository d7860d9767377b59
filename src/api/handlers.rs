//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{ErrorResponse, StateResponse, TelemetryQuery, TelemetryRecord};
use crate::sim::clock::Minute;

/// Returns the household snapshot.
///
/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    Json(StateResponse::from(&state.engine))
}

/// Returns tick records, optionally filtered by minute of the day.
///
/// `GET /telemetry` → 200 + `Vec<TelemetryRecord>` JSON
/// `GET /telemetry?from=N&to=M` → ticks with `N <= minute <= M`
/// `GET /telemetry?from=10&to=5` → 400 + `ErrorResponse`
///
/// Records keep history order, so a run with a clock reset may list the
/// same minute more than once.
pub async fn get_telemetry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TelemetryQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(Minute::MAX);

    if from > to {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `to` ({to})"),
            }),
        ));
    }

    let records: Vec<TelemetryRecord> = state
        .engine
        .history()
        .iter()
        .filter(|r| (from..=to).contains(&r.minute))
        .map(TelemetryRecord::from)
        .collect();

    Ok(Json(records))
}
