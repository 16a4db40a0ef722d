#![cfg(test)]
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use models::{ambulance::NewAmbulance, user::Registration};

use crate::auth::CredentialHasher;
use crate::errors::{AdapterError, ServiceError};
use crate::geocode::{GeoPlace, GeocodeAdapter};

/// Argon2 parameters small enough to keep tests fast.
pub fn cheap_hasher() -> CredentialHasher {
    CredentialHasher::new(64, 1).expect("valid test params")
}

pub fn registration(username: &str, password: &str) -> Registration {
    Registration {
        username: username.into(),
        password: password.into(),
        confirm_password: password.into(),
        ..Default::default()
    }
}

/// Ambulance `id` driven by Asha, parked at City Hospital.
pub fn new_ambulance(id: &str) -> NewAmbulance {
    NewAmbulance {
        id: id.into(),
        driver_name: "Asha".into(),
        phone_number: "555".into(),
        ambulance_type: "BLS".into(),
        current_location: "City Hospital".into(),
        latitude: Some(12.9),
        longitude: Some(77.6),
    }
}

/// In-process geocoder that records every address it is asked about.
#[derive(Default)]
pub struct FakeGeocoder {
    address_calls: Mutex<Vec<String>>,
}

impl FakeGeocoder {
    /// Address for which no result exists.
    pub const UNKNOWN: &'static str = "Atlantis";
    /// Address that simulates the service being down.
    pub const OFFLINE: &'static str = "offline";

    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    pub fn address_calls(&self) -> Vec<String> {
        self.address_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GeocodeAdapter for FakeGeocoder {
    async fn resolve_address(&self, text: &str) -> Result<GeoPlace, ServiceError> {
        self.address_calls.lock().unwrap().push(text.to_string());
        match text {
            Self::UNKNOWN => Err(AdapterError::NoResult(text.into()).into()),
            Self::OFFLINE => Err(AdapterError::Unavailable("connection refused".into()).into()),
            _ => Ok(GeoPlace { latitude: 12.95, longitude: 77.65, display_name: text.to_string() }),
        }
    }

    async fn resolve_coordinates(&self, latitude: f64, longitude: f64) -> Result<GeoPlace, ServiceError> {
        if latitude == 0.0 && longitude == 0.0 {
            return Err(AdapterError::Unavailable("connection refused".into()).into());
        }
        Ok(GeoPlace { latitude, longitude, display_name: "Bus Stand".into() })
    }
}
