//! Command line interface.

pub mod command;

use std::path::PathBuf;
use std::time::Duration;

use clap::{command, Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Contains the commands
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search the Sentinel Hub catalog for scenes over the study area
    Search(SearchArgs),
    /// Group search results by calendar date with per-scene cloud cover
    Dates(DatesArgs),
    /// Request and download per-date snow/mask rasters
    Download(DownloadArgs),
    /// Compute per-contour snow statistics and export CSV
    Snow(SnowArgs),
    /// Compute per-date percent cloud cover from the cloud mask band
    Clouds(CloudsArgs),
    /// Rename the bands of every raster in a folder
    RenameBands(RenameBandsArgs),
}

#[derive(Args)]
pub struct SearchArgs {
    /// Area of interest GeoJSON file
    #[arg(long, default_value = "hood_aoi_32610.geojson")]
    pub aoi: PathBuf,
    /// Start of the search interval (YYYY-MM-DD)
    #[arg(long, default_value = "2014-07-01")]
    pub from: String,
    /// End of the search interval (YYYY-MM-DD)
    #[arg(long, default_value = "2024-03-01")]
    pub to: String,
    /// Keep scenes with cloud cover below this percentage
    #[arg(long, default_value_t = 100.0)]
    pub max_cloud: f64,
    /// Output file for the search results
    #[arg(long, default_value = "search_results_max.json")]
    pub output: PathBuf,
}

#[derive(Args)]
pub struct DatesArgs {
    /// Search results file from the `search` command
    #[arg(long, default_value = "search_results_max.json")]
    pub results: PathBuf,
    /// Write the date -> cloud covers mapping to this JSON file
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct DownloadArgs {
    /// Area of interest GeoJSON file
    #[arg(long, default_value = "hood_aoi_32610.geojson")]
    pub aoi: PathBuf,
    /// Search results file from the `search` command
    #[arg(long, default_value = "search_results_max.json")]
    pub results: PathBuf,
    /// Root folder for downloads, images and the download index
    #[arg(long, default_value = "data")]
    pub data_root: PathBuf,
    /// Output resolution in metres per pixel
    #[arg(long, default_value_t = 10.0)]
    pub resolution: f64,
}

#[derive(Args)]
pub struct SnowArgs {
    /// Folder containing the downloaded `*_masks.tif` rasters
    #[arg(long, default_value = "data/images")]
    pub images: PathBuf,
    /// Elevation contour ring polygons (any OGR-readable vector, same CRS
    /// as the rasters)
    #[arg(long, default_value = "contour_rings.geojson")]
    pub contours: PathBuf,
    /// Band holding the snow mask
    #[arg(long, default_value = "snow_mask")]
    pub snow_band: String,
    /// Band holding the usable snow area mask
    #[arg(long, default_value = "usable_snow_mask")]
    pub usable_band: String,
}

#[derive(Args)]
pub struct CloudsArgs {
    /// Folder containing the downloaded `*_masks.tif` rasters
    #[arg(long, default_value = "data/images")]
    pub images: PathBuf,
    /// Output CSV file
    #[arg(long, default_value = "data/clouds.csv")]
    pub output: PathBuf,
    /// Band holding the cloud mask
    #[arg(long, default_value = "CLM")]
    pub cloud_band: String,
}

#[derive(Args)]
pub struct RenameBandsArgs {
    /// Folder containing the rasters to rename
    pub folder: PathBuf,
    /// New band names, comma or semicolon delimited
    pub bands: String,
    /// Glob patterns selecting the rasters, comma or semicolon delimited
    #[arg(long, default_value = "*.tif,*.tiff")]
    pub globs: String,
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Creates a progress bar.
pub fn create_progress_bar(size: u64, message: String) -> ProgressBar {
    ProgressBar::new(size).with_message(message).with_style(
        ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {msg}")
            .unwrap()
            .progress_chars("##-"),
    )
}
