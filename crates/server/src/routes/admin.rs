use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use models::user::UserProfile;
use serde::Deserialize;
use tracing::warn;

use crate::app_state::AppState;
use crate::errors::ApiError;

pub const ADMIN_USER_HEADER: &str = "x-admin-username";
pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// Username and password from the admin headers; `None` if either is
/// missing or blank.
fn admin_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.trim().is_empty())
            .map(str::to_owned)
    };
    Some((value(ADMIN_USER_HEADER)?, value(ADMIN_PASSWORD_HEADER)?))
}

/// Reject the request unless it carries valid admin credentials.
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, StatusCode> {
    // owned copies only; nothing borrowed from `req` may live across the await
    let (username, password) = admin_credentials(req.headers()).ok_or(StatusCode::UNAUTHORIZED)?;
    let path = req.uri().path().to_owned();
    if !state.portal.credentials().authenticate_admin(&username, &password).await {
        warn!(%username, %path, "admin request rejected");
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

#[derive(Debug, Deserialize)]
pub struct AdminInput {
    pub username: String,
    pub password: String,
}

pub async fn list_admins(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.portal.credentials().admin_usernames().await)
}

pub async fn add_admin(State(state): State<AppState>, Json(input): Json<AdminInput>) -> Result<StatusCode, ApiError> {
    state.portal.credentials().add_admin(&input.username, &input.password).await?;
    Ok(StatusCode::CREATED)
}

pub async fn remove_admin(State(state): State<AppState>, Path(username): Path<String>) -> Result<StatusCode, ApiError> {
    state.portal.credentials().remove_admin(&username).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_users(State(state): State<AppState>) -> Json<Vec<UserProfile>> {
    Json(state.portal.credentials().users().await)
}

pub async fn remove_user(State(state): State<AppState>, Path(username): Path<String>) -> Result<StatusCode, ApiError> {
    state.portal.credentials().remove_user(&username).await?;
    Ok(StatusCode::NO_CONTENT)
}
