//! Bulk-rename the bands of every raster in a folder.
//!
//! Each raster with the same number of bands as the new band list has its
//! band descriptions replaced. Rasters with a band count mismatch are
//! skipped with a warning, as is any band that fails to rename.

use anyhow::Result;
use gdal::Metadata;

use crate::cli::RenameBandsArgs;
use crate::raster;

use super::{find_rasters, undelimit};

pub fn rename_bands(args: &RenameBandsArgs) -> Result<String> {
    let new_bands = undelimit(&args.bands);
    let globs = undelimit(&args.globs);

    let rasters = find_rasters(&args.folder, &globs)?;
    println!("found {} rasters in {}", rasters.len(), args.folder.display());
    println!("new bands: {:?}", new_bands);

    let mut renamed = 0usize;
    for path in &rasters {
        let dataset = raster::open_for_update(path)?;
        if dataset.raster_count() as usize != new_bands.len() {
            eprintln!(
                "could not rename bands in {}: band count mismatch",
                path.display()
            );
            continue;
        }

        println!("renaming bands in {}", path.display());
        println!(" old bands: {:?}", raster::band_names(&dataset)?);
        for (position, new) in new_bands.iter().enumerate() {
            let mut band = dataset.rasterband(position as isize + 1)?;
            // renaming a band to its current name is a no-op
            if band.description()? == *new {
                continue;
            }
            if let Err(e) = band.set_description(new) {
                eprintln!(
                    "  failed to rename band {} -> {}: {}: skipping",
                    position + 1,
                    new,
                    e
                );
            }
        }
        println!(" new bands: {:?}", raster::band_names(&dataset)?);
        renamed += 1;
    }

    Ok(format!("{} rasters renamed", renamed))
}
