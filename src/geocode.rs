//! Country lookups for scene corners.
use crate::error::TransportError;
use crate::geo::LatLon;
use crate::provider::Geocode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

const STATUS_OK: &str = "OK";
const COUNTRY_TYPE: &str = "country";

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct GeocodeResult {
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub formatted_address: String,
}

impl GeocodeResponse {
    /// Address of the first result typed as a country. Responses with a status other than
    /// `OK` (`ZERO_RESULTS` over oceans, quota errors, ...) carry no country.
    pub fn country(self: &Self) -> Option<&str> {
        if self.status != STATUS_OK {
            return None;
        }
        self.results
            .iter()
            .find(|r| r.types.iter().any(|t| t == COUNTRY_TYPE))
            .map(|r| r.formatted_address.as_str())
    }
}

pub async fn resolve_country(
    geocoder: &impl Geocode,
    point: LatLon,
) -> Result<Option<String>, TransportError> {
    let response = geocoder.reverse_geocode(point).await?;
    let country = response.country().map(str::to_owned);
    debug!(lat = point.lat, lon = point.lon, status = %response.status, ?country, "reverse geocoded");
    Ok(country)
}

/// Countries touched by the given points, one lookup per point in order.
pub async fn resolve_countries(
    geocoder: &impl Geocode,
    points: &[LatLon],
) -> Result<BTreeSet<String>, TransportError> {
    let mut countries = BTreeSet::new();
    for point in points {
        if let Some(country) = resolve_country(geocoder, *point).await? {
            if !country.is_empty() {
                countries.insert(country);
            }
        }
    }
    Ok(countries)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;

    /// Answers every lookup from a fixed list, in call order.
    pub struct ScriptedGeocoder {
        pub responses: Vec<GeocodeResponse>,
        pub calls: Cell<usize>,
    }

    impl ScriptedGeocoder {
        pub fn new(responses: Vec<GeocodeResponse>) -> Self {
            Self {
                responses,
                calls: Cell::new(0),
            }
        }
    }

    impl Geocode for ScriptedGeocoder {
        async fn reverse_geocode(self: &Self, _point: LatLon) -> Result<GeocodeResponse, TransportError> {
            let idx = self.calls.get();
            self.calls.set(idx + 1);
            Ok(self.responses[idx % self.responses.len()].clone())
        }
    }

    pub fn country_response(name: &str) -> GeocodeResponse {
        GeocodeResponse {
            status: "OK".to_string(),
            results: vec![
                GeocodeResult {
                    types: vec!["locality".to_string(), "political".to_string()],
                    formatted_address: format!("Somewhere, {name}"),
                },
                GeocodeResult {
                    types: vec!["country".to_string(), "political".to_string()],
                    formatted_address: name.to_string(),
                },
            ],
        }
    }

    pub fn zero_results() -> GeocodeResponse {
        GeocodeResponse {
            status: "ZERO_RESULTS".to_string(),
            results: vec![],
        }
    }

    const SAMPLE: &str = r#"{
        "results": [
            {
                "address_components": [],
                "formatted_address": "Hauptstraße 1, 10827 Berlin, Germany",
                "types": ["street_address"]
            },
            {
                "formatted_address": "Germany",
                "types": ["country", "political"]
            }
        ],
        "status": "OK"
    }"#;

    #[test]
    fn test_country_from_json() {
        let response: GeocodeResponse = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(response.country(), Some("Germany"));
    }

    #[test]
    fn test_no_country_without_ok_status() {
        let mut response = country_response("France");
        response.status = "OVER_QUERY_LIMIT".to_string();
        assert_eq!(response.country(), None);
        assert_eq!(zero_results().country(), None);
    }

    #[test]
    fn test_no_country_typed_result() {
        let response: GeocodeResponse =
            serde_json::from_str(r#"{"status": "OK", "results": [{"types": ["locality"], "formatted_address": "x"}]}"#)
                .unwrap();
        assert_eq!(response.country(), None);
    }

    #[tokio::test]
    async fn test_resolve_countries_deduplicates() {
        let geocoder = ScriptedGeocoder::new(vec![
            country_response("Germany"),
            zero_results(),
            country_response("Poland"),
            country_response("Germany"),
        ]);
        let points = [LatLon::new(0.0, 0.0); 4];
        let countries = resolve_countries(&geocoder, &points).await.unwrap();
        assert_eq!(geocoder.calls.get(), 4);
        assert_eq!(
            countries.into_iter().collect::<Vec<_>>(),
            vec!["Germany".to_string(), "Poland".to_string()]
        );
    }

    #[tokio::test]
    async fn test_empty_country_is_discarded() {
        let geocoder = ScriptedGeocoder::new(vec![country_response("")]);
        let countries = resolve_countries(&geocoder, &[LatLon::new(1.0, 1.0)]).await.unwrap();
        assert!(countries.is_empty());
    }
}
