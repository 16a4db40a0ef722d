use axum::{extract::State, http::StatusCode, Json};
use models::user::{Registration, UserProfile};
use serde::Deserialize;
use serde_json::{json, Value};
use service::auth::{AuthKind, Session};
use tracing::info;

use crate::app_state::AppState;
use crate::errors::ApiError;

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

async fn login(state: &AppState, kind: AuthKind, input: LoginInput) -> Result<Json<Session>, (StatusCode, Json<Value>)> {
    match state.portal.login(kind, &input.username, &input.password).await {
        Some(session) => Ok(Json(session)),
        None => {
            let message = match kind {
                AuthKind::Admin => "Invalid admin credentials!",
                AuthKind::User => "Invalid user credentials!",
            };
            Err((StatusCode::UNAUTHORIZED, Json(json!({"error": message}))))
        }
    }
}

pub async fn admin_login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Json<Session>, (StatusCode, Json<Value>)> {
    login(&state, AuthKind::Admin, input).await
}

pub async fn user_login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Json<Session>, (StatusCode, Json<Value>)> {
    login(&state, AuthKind::User, input).await
}

pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<Registration>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let profile = state.portal.register_user(input).await?;
    info!(username = %profile.username, "registration accepted");
    Ok((StatusCode::CREATED, Json(profile)))
}
