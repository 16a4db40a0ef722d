use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::record::Record;

/// Dispatch status of an ambulance. Only ever flipped, never set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AmbulanceStatus {
    #[default]
    Available,
    Busy,
}

impl AmbulanceStatus {
    pub fn toggled(self) -> Self {
        match self {
            AmbulanceStatus::Available => AmbulanceStatus::Busy,
            AmbulanceStatus::Busy => AmbulanceStatus::Available,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AmbulanceStatus::Available => "Available",
            AmbulanceStatus::Busy => "Busy",
        }
    }
}

impl fmt::Display for AmbulanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ModelError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ModelError::Validation(format!("latitude out of range: {}", latitude)));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ModelError::Validation(format!("longitude out of range: {}", longitude)));
        }
        Ok(Self { latitude, longitude })
    }

    /// `"lat, lng"` with six decimals, the label used when no address is known.
    pub fn label(&self) -> String {
        format!("{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// One entry of the append-only location history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationEntry {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

impl LocationEntry {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates { latitude: self.latitude, longitude: self.longitude }
    }
}

/// Location reported with a status change or a manual location update.
///
/// Coordinates are optional here because they come from form fields that may
/// still be empty; [`LocationUpdate::validate`] rejects those.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationUpdate {
    pub fn new(location: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self { location: location.into(), latitude: Some(latitude), longitude: Some(longitude) }
    }

    pub fn validate(&self) -> Result<(String, Coordinates), ModelError> {
        let location = self.location.trim();
        if location.is_empty() {
            return Err(ModelError::required("location"));
        }
        let latitude = self.latitude.ok_or_else(|| ModelError::required("latitude"))?;
        let longitude = self.longitude.ok_or_else(|| ModelError::required("longitude"))?;
        Ok((location.to_string(), Coordinates::new(latitude, longitude)?))
    }
}

/// Input for registering a new ambulance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAmbulance {
    pub id: String,
    pub driver_name: String,
    pub phone_number: String,
    #[serde(rename = "type")]
    pub ambulance_type: String,
    pub current_location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl NewAmbulance {
    pub fn location(&self) -> LocationUpdate {
        LocationUpdate {
            location: self.current_location.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ambulance {
    pub id: String,
    pub driver_name: String,
    pub phone_number: String,
    #[serde(rename = "type")]
    pub ambulance_type: String,
    pub status: AmbulanceStatus,
    pub current_location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_history: Vec<LocationEntry>,
}

impl Record for Ambulance {
    const KIND: &'static str = "ambulance";

    fn key(&self) -> &str { &self.id }
}

impl Ambulance {
    /// Build a freshly registered ambulance: `Available`, with a one-entry
    /// history seeded from the registration location.
    pub fn register(input: NewAmbulance, at: DateTime<Utc>) -> Result<Self, ModelError> {
        let id = input.id.trim().to_string();
        if id.is_empty() {
            return Err(ModelError::required("ambulance id"));
        }
        for (field, value) in [
            ("driver name", &input.driver_name),
            ("phone number", &input.phone_number),
            ("ambulance type", &input.ambulance_type),
        ] {
            if value.trim().is_empty() {
                return Err(ModelError::required(field));
            }
        }
        let (location, coords) = input.location().validate()?;
        let mut ambulance = Self {
            id,
            driver_name: input.driver_name,
            phone_number: input.phone_number,
            ambulance_type: input.ambulance_type,
            status: AmbulanceStatus::Available,
            current_location: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            location_history: Vec::with_capacity(1),
        };
        ambulance.relocate(location, coords, at);
        Ok(ambulance)
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates { latitude: self.latitude, longitude: self.longitude }
    }

    /// Overwrite the current location and append exactly one history entry.
    pub fn relocate(&mut self, location: String, coords: Coordinates, at: DateTime<Utc>) {
        self.location_history.push(LocationEntry {
            location: location.clone(),
            latitude: coords.latitude,
            longitude: coords.longitude,
            timestamp: at,
        });
        self.current_location = location;
        self.latitude = coords.latitude;
        self.longitude = coords.longitude;
    }

    /// Flip the status and relocate; returns the new status.
    pub fn toggle_status(&mut self, location: String, coords: Coordinates, at: DateTime<Utc>) -> AmbulanceStatus {
        self.status = self.status.toggled();
        self.relocate(location, coords, at);
        self.status
    }
}
