use anyhow::Result;
use clap::{Parser, Subcommand};
use landsat8::pipeline::{self, Strategy};
use landsat8::settings::{self, Settings};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

/// Downloads a Landsat 8 scene and renders it as a natural color JPG with a JSON
/// summary of its metadata.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Settings file; `landsat8.toml` in the current directory is used when present.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,

    /// Scratch directory for downloads and the cached scene list.
    #[arg(long, global = true)]
    work_dir: Option<PathBuf>,

    /// Directory receiving the JPG and metadata JSON.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// JPG quality in percent.
    #[arg(long, global = true)]
    quality: Option<u8>,

    /// Resize factor in percent.
    #[arg(long, global = true)]
    resize: Option<u32>,

    /// Do not update the LATEST links.
    #[arg(long, global = true)]
    no_link: bool,

    /// Leave the downloaded bands in the working directory.
    #[arg(long, global = true)]
    keep_temp: bool,

    /// Log debug output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// The newest scene from the acquisition feed that is already published (default).
    Latest,
    /// A random recent scene with little cloud cover.
    Random {
        /// Upper bound (exclusive) for the cloud cover in percent.
        #[arg(long)]
        cloud_cover: Option<f64>,
    },
}

impl Cli {
    fn settings(self: &Self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::read(path)?,
            None => Settings::read_or_default(settings::DEFAULT_PATH)?,
        };
        if let Some(dir) = &self.work_dir {
            settings.work_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
        if let Some(quality) = self.quality {
            settings.jpeg_quality = quality;
        }
        if let Some(resize) = self.resize {
            settings.resize_percent = resize;
        }
        if self.no_link {
            settings.link_latest = false;
        }
        Ok(settings)
    }

    fn strategy(self: &Self, settings: &Settings) -> Strategy {
        match &self.command {
            None | Some(Command::Latest) => Strategy::Latest,
            Some(Command::Random { cloud_cover }) => Strategy::Random {
                max_cloud_cover: cloud_cover.unwrap_or(settings.cloud_cover_threshold),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = cli.settings()?;
    tracing::debug!(?settings, "loaded settings");

    let strategy = cli.strategy(&settings);
    let _ = pipeline::run(&settings, strategy, cli.keep_temp).await?;

    Ok(())
}
