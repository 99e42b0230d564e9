use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::classifier::is_private;
use super::geolocation::{GeoError, GeoLocator, GeoResult};
use crate::models::{LookupRecord, NewLookupRecord, VisitorData};
use crate::storage::{HistoryStore, HISTORY_LIMIT};

/// Well-known public addresses used by the self-test endpoint
pub const TEST_IPS: [&str; 5] = [
    "8.8.8.8",
    "1.1.1.1",
    "208.80.154.224",
    "142.250.72.14",
    "151.101.1.69",
];

/// Shown on the home page when the provider could not be reached
pub const HOME_ERROR_MESSAGE: &str =
    "Error fetching visitor IP info. The geolocation service could not be reached.";

#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    Geo(#[from] GeoError),
}

/// Everything the home page needs
#[derive(Debug, Clone, Serialize)]
pub struct HomeView {
    pub visitor: Option<VisitorData>,
    pub history: Vec<LookupRecord>,
    pub error: Option<String>,
}

/// Ties classification, the geolocation provider and history together
#[derive(Clone)]
pub struct LookupService {
    store: Arc<dyn HistoryStore>,
    geo: Arc<dyn GeoLocator>,
}

impl LookupService {
    pub fn new(store: Arc<dyn HistoryStore>, geo: Arc<dyn GeoLocator>) -> Self {
        Self { store, geo }
    }

    pub fn store(&self) -> &Arc<dyn HistoryStore> {
        &self.store
    }

    /// Look up one address.
    ///
    /// Private addresses get a placeholder and never reach the provider.
    /// Public addresses are sent to the provider; successful answers are
    /// recorded unless the address is already in history. Answers with any
    /// other status are returned as-is without being recorded.
    pub async fn lookup(&self, ip: &str) -> Result<VisitorData, LookupError> {
        if is_private(ip) {
            debug!(%ip, "private address, skipping provider");
            return Ok(VisitorData::private(ip));
        }

        let result = self.geo.lookup(ip).await?;

        if result.is_success() {
            self.remember(ip, &result).await;
        } else {
            info!(%ip, status = %result.status, "provider did not resolve address, not recording");
        }

        Ok(result.into())
    }

    /// Look up one of [`TEST_IPS`] picked at random
    pub async fn test_lookup(&self) -> Result<VisitorData, LookupError> {
        self.lookup(random_test_ip()).await
    }

    /// Home page flow: look up the visitor, then load recent history.
    ///
    /// A provider failure yields an error message and an empty history
    /// instead of an error.
    pub async fn visit(&self, client_ip: &str) -> HomeView {
        match self.lookup(client_ip).await {
            Ok(visitor) => HomeView {
                visitor: Some(visitor),
                history: self.recent_history().await,
                error: None,
            },
            Err(e) => {
                error!(ip = %client_ip, error = %e, "error fetching visitor IP info");
                HomeView {
                    visitor: None,
                    history: Vec::new(),
                    error: Some(HOME_ERROR_MESSAGE.to_string()),
                }
            }
        }
    }

    /// The newest [`HISTORY_LIMIT`] records, or nothing if the store fails
    pub async fn recent_history(&self) -> Vec<LookupRecord> {
        match self.store.list_recent(HISTORY_LIMIT).await {
            Ok(history) => history,
            Err(e) => {
                error!(error = %e, "failed to load lookup history");
                Vec::new()
            }
        }
    }

    /// Best-effort delete of every record for `ip`
    pub async fn forget(&self, ip: &str) -> u64 {
        match self.store.delete_by_ip(ip).await {
            Ok(removed) => {
                info!(%ip, removed, "deleted history entry");
                removed
            }
            Err(e) => {
                error!(%ip, error = %e, "error deleting history entry");
                0
            }
        }
    }

    /// Best-effort delete of all history
    pub async fn clear(&self) -> u64 {
        match self.store.delete_all().await {
            Ok(removed) => {
                info!(removed, "cleared lookup history");
                removed
            }
            Err(e) => {
                error!(error = %e, "error clearing lookup history");
                0
            }
        }
    }

    /// Record a successful answer unless its address is already known.
    ///
    /// The existence check and the insert are separate statements, so two
    /// concurrent first visits from one address may both insert.
    async fn remember(&self, requested_ip: &str, result: &GeoResult) {
        let ip = if result.query.is_empty() {
            requested_ip
        } else {
            result.query.as_str()
        };

        match self.store.find_by_ip(ip).await {
            Ok(Some(_)) => {
                debug!(%ip, "address already in history");
            }
            Ok(None) => {
                let record = NewLookupRecord {
                    ip: ip.to_string(),
                    country: result.country.clone(),
                    city: result.city.clone(),
                    isp: result.isp.clone(),
                };
                match self.store.insert(&record).await {
                    Ok(saved) => debug!(ip = %saved.ip, id = saved.id, "recorded lookup"),
                    Err(e) => warn!(%ip, error = %e, "failed to record lookup"),
                }
            }
            Err(e) => {
                warn!(%ip, error = %e, "failed to check history, not recording");
            }
        }
    }
}

/// Uniform pick from [`TEST_IPS`]
pub fn random_test_ip() -> &'static str {
    TEST_IPS[rand::random_range(0..TEST_IPS.len())]
}
