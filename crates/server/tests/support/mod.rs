#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use configs::{AppConfig, StorageBackend};
use serde_json::Value;
use service::geocode::{GeoPlace, GeocodeAdapter};
use service::{AdapterError, ServiceError};
use tower::Service;

/// Resolves every address to the same point, except "Atlantis".
pub struct StubGeocoder;

#[async_trait]
impl GeocodeAdapter for StubGeocoder {
    async fn resolve_address(&self, text: &str) -> Result<GeoPlace, ServiceError> {
        if text == "Atlantis" {
            return Err(AdapterError::NoResult(text.to_string()).into());
        }
        Ok(GeoPlace { latitude: 12.95, longitude: 77.65, display_name: text.to_string() })
    }

    async fn resolve_coordinates(&self, latitude: f64, longitude: f64) -> Result<GeoPlace, ServiceError> {
        if latitude == 0.0 && longitude == 0.0 {
            return Err(AdapterError::Unavailable("stub offline".into()).into());
        }
        Ok(GeoPlace { latitude, longitude, display_name: "Bus Stand".into() })
    }
}

pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.storage.backend = StorageBackend::Memory;
    cfg.geocode.debounce_ms = 0;
    cfg.auth.argon2_memory_kib = 64;
    cfg.auth.argon2_iterations = 1;
    cfg
}

pub async fn build_app() -> anyhow::Result<Router> {
    let portal = server::startup::build_portal_with(&test_config(), Arc::new(StubGeocoder)).await?;
    Ok(server::startup::build_app(portal))
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body)?))?)
}

pub fn get(uri: &str) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder().uri(uri).body(Body::empty())?)
}

pub async fn send(app: &Router, req: Request<Body>) -> anyhow::Result<Response<Body>> {
    Ok(app.clone().call(req).await?)
}

pub async fn body_json(resp: Response<Body>) -> anyhow::Result<Value> {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
