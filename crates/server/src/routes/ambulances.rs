use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use models::ambulance::{Ambulance, LocationUpdate, NewAmbulance};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::errors::ApiError;

pub async fn list(State(state): State<AppState>) -> Json<Vec<Ambulance>> {
    Json(state.portal.ambulances().await)
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewAmbulance>,
) -> Result<(StatusCode, Json<Ambulance>), ApiError> {
    let created = state.portal.register_ambulance(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Ambulance>, ApiError> {
    Ok(Json(state.portal.ambulance(&id).await?))
}

pub async fn toggle_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<LocationUpdate>,
) -> Result<Json<Ambulance>, ApiError> {
    Ok(Json(state.portal.on_status_toggle_requested(&id, update).await?))
}

#[derive(Debug, Deserialize)]
pub struct AddressInput {
    pub address: String,
}

/// Resolve the typed address immediately and move the ambulance there.
pub async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<AddressInput>,
) -> Result<Json<Ambulance>, ApiError> {
    Ok(Json(state.portal.update_location_from_input(&id, &input.address).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// `text` returns the printable report instead of JSON entries.
    pub format: Option<String>,
}

pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, ApiError> {
    if query.format.as_deref() == Some("text") {
        let report = state.portal.history_report(&id).await?;
        return Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], report).into_response());
    }
    Ok(Json(state.portal.on_history_requested(&id).await?).into_response())
}
