use axum::{
    extract::{Query, State},
    Json,
};
use models::ambulance::Coordinates;
use serde::{Deserialize, Serialize};
use service::geocode::{GeoPlace, LookupMode, LookupOutcome};
use service::LookupField;

use crate::app_state::AppState;
use crate::errors::ApiError;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default = "default_field")]
    pub field: LookupField,
    /// Skip the debounce delay, as the "get coordinates" button does.
    #[serde(default)]
    pub manual: bool,
}

fn default_field() -> LookupField { LookupField::AddForm }

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchResponse {
    Resolved { place: GeoPlace },
    Cleared,
    Superseded,
}

impl From<LookupOutcome> for SearchResponse {
    fn from(outcome: LookupOutcome) -> Self {
        match outcome {
            LookupOutcome::Resolved(place) => Self::Resolved { place },
            LookupOutcome::Cleared => Self::Cleared,
            LookupOutcome::Superseded => Self::Superseded,
        }
    }
}

pub async fn search(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> Result<Json<SearchResponse>, ApiError> {
    let mode = if query.manual { LookupMode::Manual } else { LookupMode::Debounced };
    let outcome = state.portal.lookup_coordinates(query.field, &query.q, mode).await?;
    Ok(Json(outcome.into()))
}

#[derive(Debug, Deserialize)]
pub struct ReverseQuery {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize)]
pub struct ReverseResponse {
    pub display_name: String,
}

/// Label for a point. Falls back to the formatted coordinates when the
/// lookup service has nothing.
pub async fn reverse(State(state): State<AppState>, Query(query): Query<ReverseQuery>) -> Result<Json<ReverseResponse>, ApiError> {
    let coords = Coordinates::new(query.lat, query.lng)?;
    let display_name = state.portal.describe_coordinates(coords).await;
    Ok(Json(ReverseResponse { display_name }))
}
