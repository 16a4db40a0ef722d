//! Geocode adapter boundary: address text <-> coordinates.
//!
//! Resolution itself is delegated to an external service; the core only
//! consumes the final latitude/longitude/display-name triple.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

pub mod debounce;
pub mod nominatim;

pub use debounce::{DebouncedLookup, LookupMode, LookupOutcome};
pub use nominatim::NominatimGeocoder;

/// A resolved place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPlace {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

/// External address/coordinate resolution.
///
/// Both calls fail with [`ServiceError::Adapter`]: `NoResult` when the
/// service answered but found nothing, `Unavailable` when it could not be
/// reached or answered garbage.
#[async_trait]
pub trait GeocodeAdapter: Send + Sync {
    async fn resolve_address(&self, text: &str) -> Result<GeoPlace, ServiceError>;
    async fn resolve_coordinates(&self, latitude: f64, longitude: f64) -> Result<GeoPlace, ServiceError>;
}
