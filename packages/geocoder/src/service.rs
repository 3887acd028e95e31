//! Geocoding service configuration embedded at compile time.
//!
//! The provider is defined in a TOML file under `services/` and parsed
//! once at startup. The CLI can override `rate_limit_ms` per run; the
//! other fields are fixed per deployment.

use serde::Deserialize;

/// A geocoding service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Unique identifier (e.g., `"nominatim"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Reverse endpoint URL
    /// (e.g., `"https://nominatim.openstreetmap.org/reverse"`).
    pub base_url: String,
    /// User agent sent with every request. Nominatim's usage policy
    /// requires an identifying agent.
    pub user_agent: String,
    /// Minimum delay between requests in milliseconds.
    pub rate_limit_ms: u64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// The embedded Nominatim service TOML.
const NOMINATIM_TOML: &str = include_str!("../services/nominatim.toml");

/// Returns the Nominatim service configuration.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed (this is a compile-time
/// guarantee since the config is embedded).
#[must_use]
pub fn nominatim_service() -> GeocodingService {
    toml::de::from_str(NOMINATIM_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse geocoding service 'nominatim': {e}"))
}
