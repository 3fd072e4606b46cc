//! Per-contour snow statistics from the downloaded mask rasters.
//!
//! For each `*_masks.tif` this computes sum/count/area per contour zone for
//! the snow mask, the usable-area mask and their product, derives the three
//! percentage fields and exports one CSV next to the raster.

use anyhow::{anyhow, Result};

use crate::cli::SnowArgs;
use crate::evalscript::{SNOW_BAND_POSITION, USABLE_BAND_POSITION};
use crate::raster;
use crate::zonal;

use super::find_rasters;

pub fn snow(args: &SnowArgs) -> Result<String> {
    let zones = zonal::read_zones(&args.contours)?;
    if zones.is_empty() {
        return Err(anyhow!("`{}` has no zones", args.contours.display()));
    }

    let rasters = find_rasters(&args.images, &["*_masks.tif".to_string()])?;
    for raster_path in &rasters {
        let dataset = raster::open(raster_path)?;
        let geo_transform = dataset.geo_transform()?;
        let (width, height) = dataset.raster_size();

        let snow_band = raster::find_band(&dataset, &args.snow_band, SNOW_BAND_POSITION)?;
        let usable_band = raster::find_band(&dataset, &args.usable_band, USABLE_BAND_POSITION)?;
        let snow = raster::read_band(&dataset, snow_band)?;
        let usable = raster::read_band(&dataset, usable_band)?;

        let grid = zonal::zone_grid(&zones, &geo_transform, width, height);
        let rows = zonal::zonal_rows(
            &zones,
            &grid,
            &snow,
            &usable,
            raster::pixel_area(&geo_transform),
        )?;

        let csv_path = raster_path.with_extension("csv");
        zonal::write_csv(&rows, &csv_path)?;
        println!("wrote {}", csv_path.display());
    }

    Ok(format!(
        "{} rasters, {} zones per raster",
        rasters.len(),
        zones.len()
    ))
}
