//! Per-date percent cloud cover over the study area.
//!
//! Uses the cloud mask (CLM) band of the mask rasters; the mask is binary,
//! so its mean is the fraction of cloudy pixels.

use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::cli::CloudsArgs;
use crate::evalscript::CLOUD_MASK_POSITION;
use crate::raster;

use super::find_rasters;

#[derive(Debug, Serialize)]
struct CloudRow {
    date: String,
    min: f64,
    max: f64,
    mean: f64,
    std: f64,
}

pub fn clouds(args: &CloudsArgs) -> Result<String> {
    let rasters = find_rasters(&args.images, &["*_masks.tif".to_string()])?;
    if rasters.is_empty() {
        return Err(anyhow!("no mask rasters in `{}`", args.images.display()));
    }

    let mut rows = Vec::new();
    for raster_path in &rasters {
        let dataset = raster::open(raster_path)?;
        let band = raster::find_band(&dataset, &args.cloud_band, CLOUD_MASK_POSITION)?;
        let values = raster::read_band(&dataset, band)?;
        let summary = raster::summarize(&values)
            .ok_or_else(|| anyhow!("`{}` has an empty cloud band", raster_path.display()))?;

        rows.push(CloudRow {
            date: date_from_stem(raster_path)?,
            min: summary.min,
            max: summary.max,
            mean: summary.mean,
            std: summary.std,
        });
    }
    rows.sort_by(|a, b| a.date.cmp(&b.date));

    let mut writer = csv::Writer::from_path(&args.output)?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(args.output.to_string_lossy().to_string())
}

/// `2017-11-24_masks.tif` -> `2017-11-24`.
fn date_from_stem(path: &Path) -> Result<String> {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| anyhow!("bad raster name `{}`", path.display()))?;

    Ok(stem.strip_suffix("_masks").unwrap_or(stem).to_string())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_strip_the_masks_suffix() {
        let date = date_from_stem(Path::new("data/images/2017-11-24_masks.tif")).unwrap();

        assert_eq!(date, "2017-11-24");
    }

    #[test]
    fn should_keep_stems_without_the_suffix() {
        let date = date_from_stem(Path::new("2017-11-24.tif")).unwrap();

        assert_eq!(date, "2017-11-24");
    }
}
