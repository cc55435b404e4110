use crate::s3::S3ObjOps;
use crate::scene::SceneId;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DownloadTask {
    bucket: String,
    key: String,
    output: PathBuf,
}

impl DownloadTask {
    pub fn new(bucket: &str, key: &str, output: impl Into<PathBuf>) -> Self {
        DownloadTask {
            bucket: bucket.to_string(),
            key: key.to_string(),
            output: output.into(),
        }
    }

    pub fn output(self: &Self) -> &Path {
        &self.output
    }
}

/// Band images and the MTL file of one scene, fetched into `<work_dir>/<scene_id>/`.
#[derive(Deserialize, Serialize, Debug)]
pub struct DownloadPlan {
    scene_id: SceneId,
    bands: Vec<u8>,
    tasks: Vec<DownloadTask>,
}

impl DownloadPlan {
    pub fn for_scene(scene_id: &SceneId, bands: &[u8], bucket: &str, work_dir: &Path) -> Self {
        let prefix = scene_id.key_prefix();
        let scene_dir = work_dir.join(scene_id.as_str());

        let files = bands
            .iter()
            .map(|&band| scene_id.band_file_name(band))
            .chain(std::iter::once(scene_id.metadata_file_name()));

        let tasks = files
            .map(|name| {
                let key = format!("{}/{}", prefix, name);
                DownloadTask::new(bucket, &key, scene_dir.join(&name))
            })
            .collect();

        Self {
            scene_id: scene_id.clone(),
            bands: bands.to_vec(),
            tasks,
        }
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let plan: Self = serde_json::from_str(&content)?;
        Ok(plan)
    }

    pub fn write<P: AsRef<Path>>(self: &Self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn tasks(self: &Self) -> &[DownloadTask] {
        &self.tasks
    }

    /// Local band image paths, in the order the bands were requested.
    pub fn band_paths(self: &Self) -> Vec<PathBuf> {
        self.tasks
            .iter()
            .take(self.bands.len())
            .map(|t| t.output.clone())
            .collect()
    }

    pub fn metadata_path(self: &Self) -> Result<&Path> {
        self.tasks
            .last()
            .map(|t| t.output.as_path())
            .ok_or(anyhow!("Download plan for {} is empty", self.scene_id))
    }

    pub async fn execute(self: &Self, provider: &impl S3ObjOps) -> Result<()> {
        for task in self.tasks.iter() {
            println!("{}", task.key);
            try_download(provider, &task.bucket, &task.key, &task.output).await?;
        }
        Ok(())
    }
}

pub async fn try_download(
    provider: &impl S3ObjOps,
    bucket: &str,
    key: &str,
    output: &Path,
) -> Result<()> {
    // Bands of a scene that was fetched before are reused
    if output.exists() {
        info!(path = %output.display(), "output file already exists");
        return Ok(());
    }

    if let Some(parent_dir) = output.parent() {
        fs::create_dir_all(parent_dir)?;
    }

    let mut object = provider.get_object(bucket, key).await?;

    // Only complete files carry the final name
    let partial = PathBuf::from(format!("{}.partial", output.display()));
    let mut file = File::create(&partial)?;
    let mut byte_count = 0_u64;
    while let Some(bytes) = object.body.try_next().await? {
        file.write_all(&bytes)?;
        byte_count += bytes.len() as u64;
    }
    fs::rename(&partial, output)?;

    info!(key, bytes = byte_count, "download complete");
    Ok(())
}
