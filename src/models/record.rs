use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const PRIVATE_COUNTRY: &str = "Private IP Address";
pub const NOT_AVAILABLE: &str = "Not Available";
pub const PRIVATE_NOTE: &str = "This is a private IP address used inside local networks.";

/// A persisted lookup, as stored in the `lookups` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LookupRecord {
    pub id: i64,
    pub ip: String,
    pub country: String,
    pub city: String,
    pub isp: String,
    /// Unix timestamp in milliseconds
    pub searched_at: i64,
}

impl LookupRecord {
    pub fn searched_at_display(&self) -> String {
        chrono::DateTime::from_timestamp_millis(self.searched_at)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_default()
    }
}

/// Fields supplied by the caller when inserting; the store assigns `id` and `searched_at`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLookupRecord {
    pub ip: String,
    pub country: String,
    pub city: String,
    pub isp: String,
}

/// What gets rendered for the current lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorData {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub country: String,
    pub city: String,
    pub isp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl VisitorData {
    /// Placeholder shown for addresses that never leave the local network
    pub fn private(ip: &str) -> Self {
        Self {
            query: ip.to_string(),
            status: None,
            country: PRIVATE_COUNTRY.to_string(),
            city: NOT_AVAILABLE.to_string(),
            isp: NOT_AVAILABLE.to_string(),
            message: None,
            note: Some(PRIVATE_NOTE.to_string()),
        }
    }

    pub fn is_private(&self) -> bool {
        self.note.is_some() && self.country == PRIVATE_COUNTRY
    }
}

/// Form body shared by `/track` and `/delete-history`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IpForm {
    #[serde(default)]
    pub ip: Option<String>,
}

impl IpForm {
    /// The submitted address, trimmed; `None` when missing or blank
    pub fn ip(&self) -> Option<&str> {
        self.ip.as_deref().map(str::trim).filter(|ip| !ip.is_empty())
    }
}
