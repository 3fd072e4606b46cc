//! GDAL raster helpers shared by the reporting commands.

use std::path::Path;

use anyhow::{anyhow, Result};
use gdal::{Dataset, DatasetOptions, GdalOpenFlags, Metadata};

pub fn open(path: &Path) -> Result<Dataset> {
    Ok(Dataset::open(path)?)
}

/// Open with update access, needed to write band descriptions.
pub fn open_for_update(path: &Path) -> Result<Dataset> {
    let options = DatasetOptions {
        open_flags: GdalOpenFlags::GDAL_OF_UPDATE | GdalOpenFlags::GDAL_OF_RASTER,
        ..Default::default()
    };

    Ok(Dataset::open_ex(path, options)?)
}

/// The description of every band, in band order.
pub fn band_names(dataset: &Dataset) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for index in 1..=dataset.raster_count() {
        names.push(dataset.rasterband(index)?.description()?);
    }

    Ok(names)
}

/// Find a band by its description, falling back to a fixed 1-based position
/// for rasters whose bands were never renamed.
pub fn find_band(dataset: &Dataset, name: &str, fallback: isize) -> Result<isize> {
    for index in 1..=dataset.raster_count() {
        if dataset.rasterband(index)?.description()? == name {
            return Ok(index);
        }
    }

    if fallback >= 1 && fallback <= dataset.raster_count() {
        return Ok(fallback);
    }

    Err(anyhow!("no band named `{}`", name))
}

/// Read a whole band as f64 values in row-major order.
pub fn read_band(dataset: &Dataset, index: isize) -> Result<Vec<f64>> {
    let (width, height) = dataset.raster_size();
    let band = dataset.rasterband(index)?;
    let buffer = band.read_as::<f64>((0, 0), (width, height), (width, height), None)?;

    Ok(buffer.data)
}

/// Min/max/mean/std of a band.
#[derive(Debug, PartialEq)]
pub struct BandSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
}

/// Summary statistics over every pixel. Returns None for an empty band.
pub fn summarize(values: &[f64]) -> Option<BandSummary> {
    if values.is_empty() {
        return None;
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for &value in values {
        min = min.min(value);
        max = max.max(value);
        sum += value;
    }
    let mean = sum / values.len() as f64;
    let variance =
        values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / values.len() as f64;

    Some(BandSummary {
        min,
        max,
        mean,
        std: variance.sqrt(),
    })
}

/// Area of one pixel from the dataset's geotransform.
pub fn pixel_area(geo_transform: &[f64; 6]) -> f64 {
    (geo_transform[1] * geo_transform[5] - geo_transform[2] * geo_transform[4]).abs()
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_summarize_a_binary_mask() {
        let values = [0.0, 1.0, 1.0, 0.0];
        let summary = summarize(&values).unwrap();

        assert_eq!(summary.min, 0.0);
        assert_eq!(summary.max, 1.0);
        assert_eq!(summary.mean, 0.5);
        assert_eq!(summary.std, 0.5);
    }

    #[test]
    fn should_return_none_for_empty_band() {
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn should_compute_pixel_area() {
        // north-up 10 m raster: negative pixel height
        let geo_transform = [600000.0, 10.0, 0.0, 5030000.0, 0.0, -10.0];

        assert_eq!(pixel_area(&geo_transform), 100.0);
    }
}
