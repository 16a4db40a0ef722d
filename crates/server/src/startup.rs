use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use common::utils::logging::{init_logging_default, init_logging_json};
use configs::{AppConfig, AuthConfig, StorageBackend};
use dotenvy::dotenv;
use models::ambulance::{Ambulance, AmbulanceStatus};
use models::user::Registration;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::errors::StartupError;
use crate::routes;
use service::{
    ambulance::AmbulanceDirectory,
    auth::{AdminSeed, CredentialDirectory, CredentialHasher, CredentialSeeds},
    geocode::{GeocodeAdapter, NominatimGeocoder},
    storage::{BlobStore, FileBlobStore, MemoryBlobStore},
    AmbulanceListObserver, DispatchPortal,
};

/// `LOG_FORMAT=json` switches to machine-readable output.
pub fn init_logging() {
    match env::var("LOG_FORMAT").as_deref() {
        Ok("json") => init_logging_json(),
        _ => init_logging_default(),
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Logs every ambulance list change.
struct LoggingObserver;

impl AmbulanceListObserver for LoggingObserver {
    fn on_ambulance_list_changed(&self, ambulances: &[Ambulance]) {
        let busy = ambulances.iter().filter(|a| a.status == AmbulanceStatus::Busy).count();
        info!(total = ambulances.len(), busy, "ambulance_list_changed");
    }
}

/// Config file if present, otherwise defaults with host/port from env vars.
fn load_config() -> AppConfig {
    match AppConfig::load_or_default() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(error = %e, "config rejected, falling back to defaults and env");
            let mut cfg = AppConfig::default();
            if let Ok(host) = env::var("SERVER_HOST") {
                cfg.server.host = host;
            }
            if let Some(port) = env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
                cfg.server.port = port;
            }
            cfg
        }
    }
}

fn seeds_from(auth: &AuthConfig) -> CredentialSeeds {
    CredentialSeeds {
        admins: auth
            .seed_admins
            .iter()
            .map(|a| AdminSeed { username: a.username.clone(), password: a.password.clone() })
            .collect(),
        users: auth
            .seed_users
            .iter()
            .map(|u| Registration {
                username: u.username.clone(),
                password: u.password.clone(),
                confirm_password: u.password.clone(),
                fullname: u.fullname.clone(),
                email: u.email.clone(),
                phone: u.phone.clone(),
                address: u.address.clone(),
            })
            .collect(),
    }
}

async fn open_blobs(cfg: &AppConfig) -> Result<Arc<dyn BlobStore>, StartupError> {
    let blobs: Arc<dyn BlobStore> = match cfg.storage.backend {
        StorageBackend::File => FileBlobStore::new(&cfg.storage.data_dir).await?,
        StorageBackend::Memory => {
            warn!("memory storage backend: nothing survives a restart");
            MemoryBlobStore::new()
        }
    };
    Ok(blobs)
}

/// Assemble the portal from config with the given geocode adapter.
pub async fn build_portal_with(
    cfg: &AppConfig,
    geocoder: Arc<dyn GeocodeAdapter>,
) -> Result<Arc<DispatchPortal>, StartupError> {
    let blobs = open_blobs(cfg).await?;
    let hasher = CredentialHasher::new(cfg.auth.argon2_memory_kib, cfg.auth.argon2_iterations)?;
    let ambulances = Arc::new(AmbulanceDirectory::open(Arc::clone(&blobs)).await);
    let credentials = Arc::new(CredentialDirectory::open(blobs, hasher, seeds_from(&cfg.auth)).await?);
    let portal = Arc::new(DispatchPortal::new(
        ambulances,
        credentials,
        geocoder,
        Duration::from_millis(cfg.geocode.debounce_ms),
    ));
    portal.subscribe(Arc::new(LoggingObserver)).await;
    Ok(portal)
}

/// Assemble the portal from config, geocoding through Nominatim.
pub async fn build_portal(cfg: &AppConfig) -> Result<Arc<DispatchPortal>, StartupError> {
    let geocoder = NominatimGeocoder::new(
        &cfg.geocode.base_url,
        &cfg.geocode.user_agent,
        Duration::from_secs(cfg.geocode.timeout_secs),
    )?;
    build_portal_with(cfg, Arc::new(geocoder)).await
}

pub fn build_app(portal: Arc<DispatchPortal>) -> Router {
    routes::build_router(AppState { portal }, build_cors())
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {}", e)))
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let cfg = load_config();
    common::env::ensure_env("frontend", &cfg.storage.data_dir)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;

    let portal = build_portal(&cfg).await?;
    let app = build_app(portal);

    let addr = bind_addr(&cfg)?;
    info!(%addr, backend = ?cfg.storage.backend, "starting dispatch portal");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
