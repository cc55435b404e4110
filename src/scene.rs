use serde::{Deserialize, Serialize};
use std::fmt;

/// Landsat 8 scene identifier, e.g. `LC81970222016121LGN00`.
///
/// Characters 3..6 hold the WRS path and 6..9 the row. Nothing else is validated; an id
/// too short for those positions yields empty path/row segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(String);

impl SceneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn path(&self) -> &str {
        self.0.get(3..6).unwrap_or("")
    }

    pub fn row(&self) -> &str {
        self.0.get(6..9).unwrap_or("")
    }

    /// Object prefix of the scene in the public bucket, without leading slash.
    pub fn key_prefix(&self) -> String {
        format!("L8/{}/{}/{}", self.path(), self.row(), self.0)
    }

    /// Path of the scene's index page on the storage domain.
    pub fn index_path(&self) -> String {
        format!("/{}/index.html", self.key_prefix())
    }

    pub fn metadata_file_name(&self) -> String {
        format!("{}_MTL.txt", self.0)
    }

    pub fn band_file_name(&self, band: u8) -> String {
        format!("{}_B{}.TIF", self.0, band)
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SceneId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
