//! Raw HTTP client for a Nominatim-compatible geocoding service.
//!
//! Only wire concerns live here: building requests and decoding the JSON the
//! service returns. Interpreting an empty result as "not found" is left to the
//! caller.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::CoreError;

/// One hit of `/search?format=json`. Nominatim encodes coordinates as strings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SearchHit {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: String,
}

impl SearchHit {
    pub fn coordinates(&self) -> Result<(f64, f64), CoreError> {
        let lat = self.lat.trim().parse::<f64>().map_err(|e| CoreError::Parse(format!("lat {:?}: {}", self.lat, e)))?;
        let lon = self.lon.trim().parse::<f64>().map_err(|e| CoreError::Parse(format!("lon {:?}: {}", self.lon, e)))?;
        Ok((lat, lon))
    }
}

/// Body of `/reverse?format=json`. Unresolvable points come back as
/// `{"error": "..."}` with status 200.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct ReverseHit {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, CoreError> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(CoreError::Status(resp.status().as_u16()))
    }
}

#[derive(Debug, Clone)]
pub struct NominatimClient {
    http: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, CoreError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>, CoreError> {
        let url = format!("{}/search", self.base_url);
        debug!(%url, query, "geocode search");
        let resp = self.http
            .get(&url)
            .query(&[("format", "json"), ("q", query)])
            .send()
            .await
            .map_err(|e| CoreError::Network(e.to_string()))?;
        check_status(resp)?
            .json::<Vec<SearchHit>>()
            .await
            .map_err(|e| CoreError::Parse(e.to_string()))
    }

    pub async fn reverse(&self, lat: f64, lon: f64) -> Result<ReverseHit, CoreError> {
        let url = format!("{}/reverse", self.base_url);
        debug!(%url, lat, lon, "geocode reverse");
        let resp = self.http
            .get(&url)
            .query(&[("format", "json".to_string()), ("lat", lat.to_string()), ("lon", lon.to_string())])
            .send()
            .await
            .map_err(|e| CoreError::Network(e.to_string()))?;
        check_status(resp)?
            .json::<ReverseHit>()
            .await
            .map_err(|e| CoreError::Parse(e.to_string()))
    }
}
