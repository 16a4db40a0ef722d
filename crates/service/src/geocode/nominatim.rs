use std::time::Duration;

use async_trait::async_trait;
use common::geocode::NominatimClient;
use tracing::{debug, warn};

use super::{GeoPlace, GeocodeAdapter};
use crate::errors::{AdapterError, ServiceError};

/// [`GeocodeAdapter`] backed by a Nominatim-compatible HTTP service.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: NominatimClient,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self { client: NominatimClient::new(base_url, user_agent, timeout)? })
    }
}

#[async_trait]
impl GeocodeAdapter for NominatimGeocoder {
    async fn resolve_address(&self, text: &str) -> Result<GeoPlace, ServiceError> {
        let hits = self.client.search(text).await.map_err(|e| {
            warn!(error = %e, "address lookup failed");
            ServiceError::from(e)
        })?;
        let first = hits.into_iter().next().ok_or_else(|| AdapterError::NoResult(text.to_string()))?;
        let (latitude, longitude) = first.coordinates()?;
        debug!(latitude, longitude, "address resolved");
        Ok(GeoPlace { latitude, longitude, display_name: first.display_name })
    }

    async fn resolve_coordinates(&self, latitude: f64, longitude: f64) -> Result<GeoPlace, ServiceError> {
        let hit = self.client.reverse(latitude, longitude).await.map_err(|e| {
            warn!(error = %e, "reverse lookup failed");
            ServiceError::from(e)
        })?;
        match hit.display_name {
            Some(display_name) if !display_name.trim().is_empty() => Ok(GeoPlace { latitude, longitude, display_name }),
            _ => Err(AdapterError::NoResult(format!("{}, {}", latitude, longitude)).into()),
        }
    }
}
