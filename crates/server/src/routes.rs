use axum::{
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

use crate::app_state::AppState;

pub mod admin;
pub mod ambulances;
pub mod auth;
pub mod geocode;

pub async fn health() -> Json<Health> {
    Json(Health::ok())
}

/// Build the full application router: public pages, the dispatch API, auth
/// and the admin routes guarded by admin credentials.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let static_dir = ServeDir::new("frontend").fallback(ServeFile::new("frontend/index.html"));

    let api = Router::new()
        .route("/api/ambulances", get(ambulances::list).post(ambulances::create))
        .route("/api/ambulances/:id", get(ambulances::get_one))
        .route("/api/ambulances/:id/status", post(ambulances::toggle_status))
        .route("/api/ambulances/:id/location", post(ambulances::update_location))
        .route("/api/ambulances/:id/history", get(ambulances::history))
        .route("/api/geocode/search", get(geocode::search))
        .route("/api/geocode/reverse", get(geocode::reverse));

    let auth_routes = Router::new()
        .route("/auth/admin/login", post(auth::admin_login))
        .route("/auth/user/login", post(auth::user_login))
        .route("/auth/register", post(auth::register));

    let admin_routes = Router::new()
        .route("/admin/admins", get(admin::list_admins).post(admin::add_admin))
        .route("/admin/admins/:username", delete(admin::remove_admin))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/:username", delete(admin::remove_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin::require_admin));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .merge(auth_routes)
        .merge(admin_routes)
        .fallback_service(static_dir)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
