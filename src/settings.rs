use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use toml;

pub const DEFAULT_PATH: &str = "landsat8.toml";

/// Endpoints, thresholds and output options of a run. Every field has a default, so a
/// settings file only needs to list what it changes.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Scratch directory for downloaded bands, the cached scene list and MTL files.
    pub work_dir: PathBuf,
    /// Where `<scene_id>.jpg`, `<scene_id>_metadata.json` and the LATEST links go.
    pub output_dir: PathBuf,
    pub storage_domain: String,
    pub s3_bucket: String,
    pub s3_region: String,
    pub feed_url: String,
    pub catalog_url: String,
    pub catalog_max_age_hours: u64,
    pub sample_window: usize,
    pub cloud_cover_threshold: f64,
    pub geocode_host: String,
    pub geocode_api_key: Option<String>,
    pub request_timeout_secs: u64,
    pub bands: Vec<u8>,
    pub jpeg_quality: u8,
    pub resize_percent: u32,
    pub convert_program: String,
    pub link_latest: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("temp"),
            output_dir: PathBuf::from("."),
            storage_domain: "landsat-pds.s3.amazonaws.com".to_string(),
            s3_bucket: "landsat-pds".to_string(),
            s3_region: "us-west-2".to_string(),
            feed_url: "https://landsat.usgs.gov/Landsat8.rss".to_string(),
            catalog_url: "https://landsat-pds.s3.amazonaws.com/c1/L8/scene_list.gz".to_string(),
            catalog_max_age_hours: 3,
            sample_window: 500,
            cloud_cover_threshold: 50.0,
            geocode_host: "maps.googleapis.com".to_string(),
            geocode_api_key: None,
            request_timeout_secs: 60,
            bands: vec![4, 3, 2],
            jpeg_quality: 90,
            resize_percent: 50,
            convert_program: "convert".to_string(),
            link_latest: true,
        }
    }
}

impl Settings {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Reads `path` when it exists, falls back to the defaults otherwise.
    pub fn read_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::read(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn write<P: AsRef<Path>>(self: &Self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn catalog_max_age(self: &Self) -> Duration {
        Duration::from_secs(self.catalog_max_age_hours * 60 * 60)
    }

    pub fn request_timeout(self: &Self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
