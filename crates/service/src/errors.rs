use thiserror::Error;

/// Failure reported by the geocode adapter boundary.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AdapterError {
    #[error("no result for {0:?}")]
    NoResult(String),
    #[error("geocode service unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{entity} {key:?} already exists")]
    DuplicateKey { entity: &'static str, key: String },
    #[error("{entity} {key:?} not found")]
    NotFound { entity: &'static str, key: String },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("geocode adapter error: {0}")]
    Adapter(#[from] AdapterError),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("hashing error: {0}")]
    Hash(String),
}

impl From<models::errors::ModelError> for ServiceError {
    fn from(e: models::errors::ModelError) -> Self {
        match e {
            models::errors::ModelError::Validation(msg) => Self::Validation(msg),
        }
    }
}

impl From<common::CoreError> for ServiceError {
    fn from(e: common::CoreError) -> Self {
        Self::Adapter(AdapterError::Unavailable(e.to_string()))
    }
}

impl ServiceError {
    pub fn duplicate(entity: &'static str, key: impl Into<String>) -> Self {
        Self::DuplicateKey { entity, key: key.into() }
    }

    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound { entity, key: key.into() }
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 1001,
            ServiceError::DuplicateKey { .. } => 1002,
            ServiceError::NotFound { .. } => 1003,
            ServiceError::Hash(_) => 1101,
            ServiceError::Storage(_) => 1200,
            ServiceError::Adapter(_) => 1300,
        }
    }

    /// The single message shown to the person whose action failed.
    pub fn notification(&self) -> String {
        match self {
            ServiceError::DuplicateKey { entity: "ambulance", .. } => "Ambulance ID already exists!".into(),
            ServiceError::DuplicateKey { entity: "user", .. } => "Username already exists!".into(),
            ServiceError::DuplicateKey { entity, key } => format!("{} {} already exists!", capitalize(entity), key),
            ServiceError::NotFound { entity, key } => format!("{} {} was not found.", capitalize(entity), key),
            ServiceError::Validation(msg) if msg == "passwords do not match" => "Passwords do not match!".into(),
            ServiceError::Validation(msg) if msg == "location is required" => "Please select a location first".into(),
            ServiceError::Validation(msg) => format!("{}.", capitalize(msg)),
            ServiceError::Adapter(AdapterError::NoResult(_)) => {
                "Could not find coordinates for this location. Please try a different location.".into()
            }
            ServiceError::Adapter(AdapterError::Unavailable(_)) => "Error getting coordinates. Please try again.".into(),
            ServiceError::Storage(_) | ServiceError::Hash(_) => "Something went wrong while saving. Please try again.".into(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
