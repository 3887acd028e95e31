//! Nominatim / OpenStreetMap reverse geocoder client.
//!
//! One coordinate per request via the `/reverse` endpoint. The caller is
//! responsible for rate limiting (typically 1 request per second for the
//! public instance; see `rate_limit_ms` in the service TOML
//! configuration).

use async_trait::async_trait;

use crate::service::GeocodingService;
use crate::{GeocodeError, ReverseGeocoder};

/// Reverse geocoder backed by a Nominatim instance.
pub struct NominatimReverse {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimReverse {
    /// Builds a client from a service configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the HTTP client cannot be constructed.
    pub fn new(config: &GeocodingService) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimReverse {
    async fn reverse(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<String>, GeocodeError> {
        reverse_single(&self.client, &self.base_url, latitude, longitude).await
    }
}

/// Reverse-geocodes a single coordinate to its postal code.
///
/// Returns `Ok(None)` when Nominatim answers but the address record has
/// no postal code (or the point is unresolvable).
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request or response parsing fails.
pub async fn reverse_single(
    client: &reqwest::Client,
    base_url: &str,
    latitude: f64,
    longitude: f64,
) -> Result<Option<String>, GeocodeError> {
    let resp = client
        .get(base_url)
        .query(&[
            ("lat", latitude.to_string()),
            ("lon", longitude.to_string()),
            ("format", "jsonv2".to_string()),
            ("addressdetails", "1".to_string()),
        ])
        .send()
        .await?;

    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }

    let body: serde_json::Value = resp.json().await?;
    parse_response(&body)
}

/// Parses a Nominatim `/reverse` JSON response.
///
/// The response is a single object; an unresolvable point comes back as
/// `{"error": "Unable to geocode"}`, which is a `None` result rather than
/// a failure.
fn parse_response(body: &serde_json::Value) -> Result<Option<String>, GeocodeError> {
    if !body.is_object() {
        return Err(GeocodeError::Parse {
            message: "Nominatim response is not an object".to_string(),
        });
    }

    if body.get("error").is_some() {
        return Ok(None);
    }

    Ok(body["address"]["postcode"]
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_postcode() {
        let body = serde_json::json!({
            "display_name": "100, North State Street, Chicago, IL, USA",
            "address": {
                "road": "North State Street",
                "city": "Chicago",
                "state": "Illinois",
                "postcode": "60602"
            }
        });
        assert_eq!(parse_response(&body).unwrap().as_deref(), Some("60602"));
    }

    #[test]
    fn missing_postcode_is_none() {
        let body = serde_json::json!({
            "display_name": "Lake Michigan",
            "address": {
                "state": "Illinois"
            }
        });
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn unable_to_geocode_is_none() {
        let body = serde_json::json!({ "error": "Unable to geocode" });
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn non_object_is_parse_error() {
        let body = serde_json::json!([1, 2, 3]);
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[test]
    fn blank_postcode_is_none() {
        let body = serde_json::json!({ "address": { "postcode": "  " } });
        assert!(parse_response(&body).unwrap().is_none());
    }
}
