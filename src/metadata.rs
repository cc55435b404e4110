//! Scene metadata summary written next to each converted image.
use crate::error::{Error, LookupError};
use crate::geo::{self, LatLon};
use crate::geocode;
use crate::mtl::MetadataTree;
use crate::provider::Geocode;
use crate::scene::SceneId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const PRODUCT_METADATA: &[&str] = &["L1_METADATA_FILE", "PRODUCT_METADATA"];
const IMAGE_ATTRIBUTES: &[&str] = &["L1_METADATA_FILE", "IMAGE_ATTRIBUTES"];

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct SceneMetadataRecord {
    pub scene_id: SceneId,
    pub date_acquired: String,
    pub cloud_cover: f64,
    pub ll_lat: f64,
    pub ll_lon: f64,
    pub lr_lat: f64,
    pub lr_lon: f64,
    pub ur_lat: f64,
    pub ur_lon: f64,
    pub ul_lat: f64,
    pub ul_lon: f64,
    pub center_lat: f64,
    pub center_lon: f64,
    pub countries: BTreeSet<String>,
}

/// The four footprint corners of a scene, in lower-left, lower-right, upper-right,
/// upper-left order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corners {
    pub ll: LatLon,
    pub lr: LatLon,
    pub ur: LatLon,
    pub ul: LatLon,
}

impl Corners {
    pub fn from_metadata(metadata: &MetadataTree) -> Result<Self, LookupError> {
        let product = metadata.group(PRODUCT_METADATA)?;
        let corner = |name: &str| -> Result<LatLon, LookupError> {
            let lat_key = format!("CORNER_{name}_LAT_PRODUCT");
            let lon_key = format!("CORNER_{name}_LON_PRODUCT");
            let lat = product.number(&[lat_key.as_str()])?;
            let lon = product.number(&[lon_key.as_str()])?;
            Ok(LatLon::new(lat, lon))
        };
        Ok(Self {
            ll: corner("LL")?,
            lr: corner("LR")?,
            ur: corner("UR")?,
            ul: corner("UL")?,
        })
    }

    pub fn to_array(self: &Self) -> [LatLon; 4] {
        [self.ll, self.lr, self.ur, self.ul]
    }

    /// Center of the footprint, weighted towards the upper-right corner.
    pub fn center(self: &Self) -> LatLon {
        geo::midpoint(self.ll, self.ur)
    }
}

impl SceneMetadataRecord {
    /// Builds the record from MTL text, looking up the country of every corner.
    pub async fn collect(
        scene_id: &SceneId,
        mtl_text: &str,
        geocoder: &impl Geocode,
    ) -> Result<Self, Error> {
        let metadata = MetadataTree::parse(mtl_text)?;

        let date_acquired = metadata
            .group(PRODUCT_METADATA)?
            .value(&["DATE_ACQUIRED"])?
            .to_string();
        let cloud_cover = metadata.group(IMAGE_ATTRIBUTES)?.number(&["CLOUD_COVER"])?;
        let corners = Corners::from_metadata(&metadata)?;
        let center = corners.center();

        println!("Date acquired: {}", date_acquired);
        println!("Cloud cover: {}", cloud_cover);
        println!("Center: {}, {}", center.lat, center.lon);

        let countries = geocode::resolve_countries(geocoder, &corners.to_array()).await?;
        println!(
            "Countries: {}",
            countries.iter().cloned().collect::<Vec<_>>().join(", ")
        );

        Ok(Self {
            scene_id: scene_id.clone(),
            date_acquired,
            cloud_cover,
            ll_lat: corners.ll.lat,
            ll_lon: corners.ll.lon,
            lr_lat: corners.lr.lat,
            lr_lon: corners.lr.lon,
            ur_lat: corners.ur.lat,
            ur_lon: corners.ur.lon,
            ul_lat: corners.ul.lat,
            ul_lon: corners.ul.lon,
            center_lat: center.lat,
            center_lon: center.lon,
            countries,
        })
    }

    pub async fn collect_from_file(
        scene_id: &SceneId,
        mtl_path: &Path,
        geocoder: &impl Geocode,
    ) -> Result<Self, Error> {
        let text = fs::read_to_string(mtl_path).map_err(|e| Error::io(mtl_path, e))?;
        Self::collect(scene_id, &text, geocoder).await
    }

    pub fn file_name(scene_id: &SceneId) -> String {
        format!("{}_metadata.json", scene_id)
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Writes `<scene_id>_metadata.json` into `dir` and returns its path.
    pub fn write<P: AsRef<Path>>(self: &Self, dir: P) -> Result<PathBuf, Error> {
        let path = dir.as_ref().join(Self::file_name(&self.scene_id));
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content).map_err(|e| Error::io(&path, e))?;
        info!(path = %path.display(), "wrote scene metadata");
        Ok(path)
    }
}
