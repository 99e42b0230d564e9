//! Visitor IP lookups
//!
//! Resolves the caller's address, classifies it, asks the geolocation
//! provider about public addresses and records successful answers in the
//! history store.

pub mod classifier;
pub mod geolocation;
pub mod ip_extractor;
pub mod service;

pub use classifier::is_private;
pub use geolocation::{GeoError, GeoLocator, GeoResult, IpApiClient};
pub use ip_extractor::{extract_client_ip, resolve_client_ip, DEFAULT_PUBLIC_IP};
pub use service::{HomeView, LookupError, LookupService, TEST_IPS};
