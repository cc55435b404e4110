//! Random selection of a cloud-free scene from the bulk scene list.
use crate::error::{Error, LookupError};
use crate::mtl::MetadataTree;
use crate::provider::Fetch;
use crate::scene::SceneId;
use csv::StringRecord;
use flate2::read::GzDecoder;
use rand::Rng;
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

pub const CACHE_FILE: &str = "scene_list.csv";
const MIN_COLUMNS: usize = 11;
const URL_COLUMN: usize = 10;
const INDEX_SUFFIX: &str = "/index.html";

pub const PROJECTION: &[&str] = &["L1_METADATA_FILE", "PROJECTION_PARAMETERS", "MAP_PROJECTION"];
pub const CLOUD_COVER: &[&str] = &["L1_METADATA_FILE", "IMAGE_ATTRIBUTES", "CLOUD_COVER"];
const REQUIRED_PROJECTION: &str = "UTM";

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRow {
    pub scene_id: SceneId,
    pub base_url: String,
}

impl CatalogRow {
    pub fn from_record(record: &StringRecord) -> Option<Self> {
        if record.len() < MIN_COLUMNS {
            return None;
        }
        let url = record.get(URL_COLUMN)?;
        let base_url = url.strip_suffix(INDEX_SUFFIX).unwrap_or(url);
        Some(Self {
            scene_id: SceneId::new(record.get(0)?),
            base_url: base_url.to_string(),
        })
    }

    pub fn metadata_url(self: &Self) -> String {
        format!("{}/{}", self.base_url, self.scene_id.metadata_file_name())
    }
}

/// Thresholds a scene has to meet to be picked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Suitability {
    pub max_cloud_cover: f64,
}

impl Suitability {
    /// UTM projected and cloud cover strictly below the threshold.
    pub fn accepts(self: &Self, metadata: &MetadataTree) -> Result<bool, LookupError> {
        let projection = metadata.value(PROJECTION)?;
        let cloud_cover = metadata.number(CLOUD_COVER)?;
        Ok(projection == REQUIRED_PROJECTION && cloud_cover < self.max_cloud_cover)
    }
}

fn is_fresh(path: &Path, max_age: Duration) -> bool {
    let modified = match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(_) => return false,
    };
    match SystemTime::now().duration_since(modified) {
        Ok(age) => age < max_age,
        // modified in the future
        Err(_) => true,
    }
}

/// Makes sure `cache_path` holds a decompressed copy of the scene list no older than `max_age`.
///
/// Returns `true` when a new copy was downloaded.
pub async fn refresh_catalog(
    source: &impl Fetch,
    url: &str,
    cache_path: &Path,
    max_age: Duration,
) -> Result<bool, Error> {
    if is_fresh(cache_path, max_age) {
        info!(path = %cache_path.display(), "scene list is up to date");
        return Ok(false);
    }

    println!("Downloading {}", url);
    let compressed = source.fetch_bytes(url).await?;

    let dir = match cache_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    // the cache file only appears once it is complete
    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    let bytes = io::copy(&mut GzDecoder::new(&compressed[..]), &mut file).map_err(|e| Error::io(url, e))?;
    file.persist(cache_path)
        .map_err(|e| Error::io(cache_path, e.error))?;
    info!(path = %cache_path.display(), bytes, "stored scene list");
    Ok(true)
}

/// The last `size` rows of the scene list, which holds the most recent acquisitions.
pub fn read_window(cache_path: &Path, size: usize) -> Result<Vec<CatalogRow>, Error> {
    if size == 0 {
        return Ok(vec![]);
    }
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(cache_path)?;

    let mut window = VecDeque::with_capacity(size);
    for record in reader.records() {
        let record = record?;
        match CatalogRow::from_record(&record) {
            Some(row) => {
                if window.len() == size {
                    window.pop_front();
                }
                window.push_back(row);
            }
            None => warn!(?record, "skipping short scene list row"),
        }
    }
    Ok(window.into())
}

/// Draws up to `attempts` rows at random (with replacement) and returns the first one whose
/// metadata passes `criteria`. Running out of attempts is a normal `None`.
pub async fn select_random_scene(
    rows: &[CatalogRow],
    source: &impl Fetch,
    criteria: Suitability,
    attempts: usize,
    rng: &mut impl Rng,
) -> Result<Option<SceneId>, Error> {
    if rows.is_empty() {
        return Ok(None);
    }

    for attempt in 1..=attempts {
        let row = &rows[rng.random_range(0..rows.len())];
        let text = source.fetch_text(&row.metadata_url()).await?;
        let metadata = MetadataTree::parse(&text)?;

        let accepted = criteria.accepts(&metadata)?;
        println!(
            "Trying {} - projection {}, cloud cover {}",
            row.scene_id,
            metadata.value(PROJECTION)?,
            metadata.value(CLOUD_COVER)?
        );
        if accepted {
            debug!(scene = %row.scene_id, attempt, "accepted scene");
            return Ok(Some(row.scene_id.clone()));
        }
    }
    Ok(None)
}

/// Location of the cached scene list inside the working directory.
pub fn cache_path(work_dir: &Path) -> PathBuf {
    work_dir.join(CACHE_FILE)
}
