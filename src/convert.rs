//! Natural color JPG rendering, delegated to ImageMagick.
use crate::scene::SceneId;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    pub program: String,
    pub quality: u8,
    pub resize_percent: u32,
}

pub fn output_path(output_dir: &Path, scene_id: &SceneId) -> PathBuf {
    output_dir.join(format!("{}.jpg", scene_id))
}

/// Stacks the band images (red, green, blue order) into one RGB image.
pub fn convert_cmd(options: &ConvertOptions, bands: &[PathBuf], output: &Path) -> Command {
    let mut cmd = Command::new(&options.program);
    cmd.args(bands)
        .arg("-combine")
        .arg("-normalize")
        .arg("-quality").arg(options.quality.to_string())
        .arg("-resize").arg(format!("{}%", options.resize_percent))
        .arg(output.as_os_str());
    cmd
}

async fn execute_cmd(cmd: &mut Command) -> Result<()> {
    debug!("executing {cmd:?}");
    let program = cmd.as_std().get_program().to_owned();

    let mut child = cmd
        .spawn()
        .with_context(|| format!("Unable to run {:?}", program))?;
    let status = child
        .wait()
        .await
        .with_context(|| format!("Unable to wait for {:?}", program))?;
    info!("{:?} completed with status {}", program, status);

    if !status.success() {
        return Err(anyhow!("{:?} exited with {}", program, status));
    }
    Ok(())
}

pub async fn convert_scene(
    options: &ConvertOptions,
    scene_id: &SceneId,
    bands: &[PathBuf],
    output_dir: &Path,
) -> Result<PathBuf> {
    if bands.is_empty() {
        return Err(anyhow!("No bands to convert for {}", scene_id));
    }
    let output = output_path(output_dir, scene_id);
    execute_cmd(&mut convert_cmd(options, bands, &output)).await?;
    Ok(output)
}
