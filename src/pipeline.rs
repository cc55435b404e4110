//! One scene acquisition run: select, download, convert, describe, clean up.
use crate::catalog::{self, Suitability};
use crate::cleanup;
use crate::convert::{self, ConvertOptions};
use crate::download_plan::DownloadPlan;
use crate::feed;
use crate::metadata::SceneMetadataRecord;
use crate::provider::HttpProvider;
use crate::s3::PublicBucket;
use crate::scene::SceneId;
use crate::settings::Settings;
use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    /// Newest scene of the acquisition feed that is already published.
    Latest,
    /// Random recent scene from the scene list below the cloud cover threshold.
    Random { max_cloud_cover: f64 },
}

#[derive(Debug)]
pub struct SceneOutput {
    pub scene_id: SceneId,
    pub image: PathBuf,
    pub metadata: PathBuf,
}

pub fn banner(title: &str) {
    println!("{}", format!("# {}", title).green());
}

pub async fn select_scene(
    settings: &Settings,
    provider: &HttpProvider,
    strategy: Strategy,
) -> Result<Option<SceneId>> {
    let scene_id = match strategy {
        Strategy::Latest => {
            banner("Finding the latest scene ...");
            println!("Reading from {}", settings.feed_url);
            let entries = feed::fetch_feed(provider, &settings.feed_url).await?;
            feed::find_latest_scene(&entries, provider).await?
        }
        Strategy::Random { max_cloud_cover } => {
            banner("Finding a random scene ...");
            let cache = catalog::cache_path(&settings.work_dir);
            catalog::refresh_catalog(
                provider,
                &settings.catalog_url,
                &cache,
                settings.catalog_max_age(),
            )
            .await?;
            let rows = catalog::read_window(&cache, settings.sample_window)?;
            info!(rows = rows.len(), max_cloud_cover, "sampling scene list");
            let mut rng = rand::rng();
            catalog::select_random_scene(
                &rows,
                provider,
                Suitability { max_cloud_cover },
                settings.sample_window,
                &mut rng,
            )
            .await?
        }
    };

    match &scene_id {
        Some(id) => println!("{}", id),
        None => println!("No scene found"),
    }
    println!();
    Ok(scene_id)
}

/// Runs the whole pipeline. `Ok(None)` means no scene qualified, which is not an error.
pub async fn run(settings: &Settings, strategy: Strategy, keep_temp: bool) -> Result<Option<SceneOutput>> {
    let provider = HttpProvider::new(
        settings.request_timeout(),
        &settings.storage_domain,
        &settings.geocode_host,
        settings.geocode_api_key.clone(),
    )?;

    let Some(scene_id) = select_scene(settings, &provider, strategy).await? else {
        return Ok(None);
    };

    banner("Downloading scene ...");
    let plan = DownloadPlan::for_scene(&scene_id, &settings.bands, &settings.s3_bucket, &settings.work_dir);
    let scene_dir = settings.work_dir.join(scene_id.as_str());
    fs::create_dir_all(&scene_dir)?;
    plan.write(scene_dir.join("download_plan.json"))?;
    let bucket = PublicBucket::anonymous(&settings.s3_region).await;
    plan.execute(&bucket).await?;
    println!();

    banner("Processing scene ...");
    fs::create_dir_all(&settings.output_dir)
        .with_context(|| format!("Unable to create {}", settings.output_dir.display()))?;
    let options = ConvertOptions {
        program: settings.convert_program.clone(),
        quality: settings.jpeg_quality,
        resize_percent: settings.resize_percent,
    };
    let image = convert::convert_scene(&options, &scene_id, &plan.band_paths(), &settings.output_dir).await?;
    println!("{}", image.display());
    println!();

    banner("Collecting metadata ...");
    let record = SceneMetadataRecord::collect_from_file(&scene_id, plan.metadata_path()?, &provider).await?;
    let metadata = record.write(&settings.output_dir)?;
    println!("{}", metadata.display());
    println!();

    if settings.link_latest {
        cleanup::link_latest(&settings.output_dir, &image, &metadata)?;
    }

    if !keep_temp {
        banner("Cleaning up ...");
        cleanup::clean_up_scene(&settings.work_dir, &scene_id)?;
        println!();
    }

    banner("Scene image created ...");
    println!("{}", image.display());
    println!();

    Ok(Some(SceneOutput {
        scene_id,
        image,
        metadata,
    }))
}
