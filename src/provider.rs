//! Network capabilities used by the scene selection and metadata code.
//!
//! The algorithms only see the traits, so tests can swap in deterministic fakes.
use crate::error::TransportError;
use crate::geo::LatLon;
use crate::geocode::GeocodeResponse;
use crate::scene::SceneId;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

const GEOCODE_PATH: &str = "/maps/api/geocode/json";

/// Tells whether a scene has been published to the public bucket.
pub trait SceneProbe {
    async fn is_available(self: &Self, scene: &SceneId) -> Result<bool, TransportError>;
}

/// Fetches documents by url.
pub trait Fetch {
    async fn fetch_bytes(self: &Self, url: &str) -> Result<Vec<u8>, TransportError>;

    async fn fetch_text(self: &Self, url: &str) -> Result<String, TransportError> {
        let bytes = self.fetch_bytes(url).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Reverse geocoding lookups.
pub trait Geocode {
    async fn reverse_geocode(self: &Self, point: LatLon) -> Result<GeocodeResponse, TransportError>;
}

pub struct HttpProvider {
    client: Client,
    storage_domain: String,
    geocode_host: String,
    geocode_api_key: Option<String>,
}

impl HttpProvider {
    pub fn new(
        timeout: Duration,
        storage_domain: &str,
        geocode_host: &str,
        geocode_api_key: Option<String>,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::request("client", e))?;
        Ok(Self {
            client,
            storage_domain: storage_domain.to_owned(),
            geocode_host: geocode_host.to_owned(),
            geocode_api_key,
        })
    }

    pub fn scene_url(self: &Self, scene: &SceneId) -> String {
        format!("http://{}{}", self.storage_domain, scene.index_path())
    }

    pub fn geocode_url(self: &Self, point: LatLon) -> Result<Url, TransportError> {
        let mut url = Url::parse(&format!("https://{}{}", self.geocode_host, GEOCODE_PATH))?;
        url.query_pairs_mut()
            .append_pair("latlng", &format!("{},{}", point.lat, point.lon));
        if let Some(key) = &self.geocode_api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }
}

impl SceneProbe for HttpProvider {
    async fn is_available(self: &Self, scene: &SceneId) -> Result<bool, TransportError> {
        let url = self.scene_url(scene);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TransportError::request(&url, e))?;
        debug!(%url, status = %response.status(), "probed scene");
        Ok(response.status() == StatusCode::OK)
    }
}

impl Fetch for HttpProvider {
    async fn fetch_bytes(self: &Self, url: &str) -> Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::request(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::request(url, e))?;
        debug!(url, len = bytes.len(), "fetched");
        Ok(bytes.to_vec())
    }
}

impl Geocode for HttpProvider {
    async fn reverse_geocode(self: &Self, point: LatLon) -> Result<GeocodeResponse, TransportError> {
        let url = self.geocode_url(point)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| TransportError::request(url.as_str(), e))?;
        response
            .json::<GeocodeResponse>()
            .await
            .map_err(|e| TransportError::request(url.as_str(), e))
    }
}
