//! Geolocation lookups against an ip-api.com compatible HTTP provider

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::GeolocationConfig;
use crate::models::VisitorData;

/// Provider status value marking a usable answer
pub const STATUS_SUCCESS: &str = "success";

/// Provider answer for one address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoResult {
    /// The address the provider looked up
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub isp: String,
    /// Failure reason, only sent with a non-success status
    #[serde(default)]
    pub message: Option<String>,
}

impl GeoResult {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

impl From<GeoResult> for VisitorData {
    fn from(result: GeoResult) -> Self {
        VisitorData {
            query: result.query,
            status: Some(result.status),
            country: result.country,
            city: result.city,
            isp: result.isp,
            message: result.message,
            note: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("failed to build geolocation HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("geolocation request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Something that can geolocate an address
#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// Look up one address. The provider's `status` is passed through unchecked.
    async fn lookup(&self, ip: &str) -> Result<GeoResult, GeoError>;
}

/// HTTP client for `GET {base_url}/{ip}` style providers
#[derive(Clone)]
pub struct IpApiClient {
    base_url: String,
    client: Client,
}

impl IpApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GeoError> {
        let client = Client::builder()
            .user_agent(concat!("iptrail/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(GeoError::Client)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &GeolocationConfig) -> Result<Self, GeoError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs.max(1)))
    }

    fn lookup_url(&self, ip: &str) -> String {
        format!("{}/{}", self.base_url, ip)
    }
}

#[async_trait]
impl GeoLocator for IpApiClient {
    async fn lookup(&self, ip: &str) -> Result<GeoResult, GeoError> {
        let url = self.lookup_url(ip);
        debug!(%url, "querying geolocation provider");

        let result = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<GeoResult>()
            .await?;

        Ok(result)
    }
}
