//! Zonal statistics over elevation-contour polygons.
//!
//! Each contour feature becomes a zone identified by its position in the
//! file, and its polygon is scanned onto the raster grid by testing pixel
//! centres with an even-odd ray cast, so holes are excluded.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Result};
use gdal::vector::{Feature, FieldValue, Geometry, LayerAccess};
use gdal::Dataset;
use serde::Serialize;

/// One contour ring polygon. `id` mirrors the source feature's position
/// (feature index + 1); `rings` holds the outer ring and any holes.
#[derive(Debug, Clone)]
pub struct Zone {
    pub id: u32,
    pub contour_min: Option<f64>,
    pub contour_max: Option<f64>,
    pub rings: Vec<Vec<(f64, f64)>>,
}

/// Read contour zones from any OGR-readable vector source (GeoJSON,
/// shapefile, geodatabase feature class, ...). The coordinates must be in
/// the raster's CRS.
pub fn read_zones(path: &Path) -> Result<Vec<Zone>> {
    let dataset = Dataset::open(path)?;
    let mut layer = dataset.layer(0)?;

    let mut zones = Vec::new();
    for (index, feature) in layer.features().enumerate() {
        let geometry = feature
            .geometry()
            .ok_or_else(|| anyhow!("feature {} of `{}` has no geometry", index, path.display()))?;
        zones.push(Zone {
            id: index as u32 + 1,
            contour_min: numeric_field(&feature, "ContourMin"),
            contour_max: numeric_field(&feature, "ContourMax"),
            rings: rings_from_geometry(geometry, index)?,
        });
    }

    Ok(zones)
}

fn numeric_field(feature: &Feature, name: &str) -> Option<f64> {
    match feature.field(name).ok().flatten() {
        Some(FieldValue::RealValue(value)) => Some(value),
        Some(FieldValue::IntegerValue(value)) => Some(value as f64),
        Some(FieldValue::Integer64Value(value)) => Some(value as f64),
        _ => None,
    }
}

fn rings_from_geometry(geometry: &Geometry, index: usize) -> Result<Vec<Vec<(f64, f64)>>> {
    match flatten_geometry_type(geometry.geometry_type()) {
        gdal_sys::OGRwkbGeometryType::wkbPolygon => Ok(polygon_rings(geometry)),
        gdal_sys::OGRwkbGeometryType::wkbMultiPolygon => {
            let mut rings = Vec::new();
            for i in 0..geometry.geometry_count() {
                let polygon = geometry.get_geometry(i);
                rings.extend(polygon_rings(&polygon));
            }
            Ok(rings)
        }
        other => Err(anyhow!(
            "unsupported geometry type {} in feature {}",
            other,
            index
        )),
    }
}

/// A polygon's sub-geometries are its rings: the outer ring then any holes.
fn polygon_rings(polygon: &Geometry) -> Vec<Vec<(f64, f64)>> {
    let mut rings = Vec::new();
    for i in 0..polygon.geometry_count() {
        let ring = polygon.get_geometry(i);
        rings.push(
            ring.get_point_vec()
                .into_iter()
                .map(|(x, y, _)| (x, y))
                .collect(),
        );
    }

    rings
}

/// Strip the 2.5D bit and the ISO Z/M/ZM offsets, leaving the base type.
fn flatten_geometry_type(geometry_type: u32) -> u32 {
    let stripped = geometry_type & !0x8000_0000;
    if stripped >= 1000 {
        stripped % 1000
    } else {
        stripped
    }
}

/// Even-odd ray cast over every ring, so points inside a hole count as
/// outside the zone.
fn contains(rings: &[Vec<(f64, f64)>], x: f64, y: f64) -> bool {
    let mut inside = false;

    for ring in rings {
        let n = ring.len();
        if n < 3 {
            continue;
        }
        let mut j = n - 1;
        for i in 0..n {
            let (xi, yi) = ring[i];
            let (xj, yj) = ring[j];
            if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
                inside = !inside;
            }
            j = i;
        }
    }

    inside
}

fn ring_bounds(rings: &[Vec<(f64, f64)>]) -> Option<(f64, f64, f64, f64)> {
    let mut points = rings.iter().flatten();
    let &(first_x, first_y) = points.next()?;
    let mut bounds = (first_x, first_y, first_x, first_y);
    for &(x, y) in points {
        bounds.0 = bounds.0.min(x);
        bounds.1 = bounds.1.min(y);
        bounds.2 = bounds.2.max(x);
        bounds.3 = bounds.3.max(y);
    }

    Some(bounds)
}

fn pixel_center(geo_transform: &[f64; 6], col: usize, row: usize) -> (f64, f64) {
    let c = col as f64 + 0.5;
    let r = row as f64 + 0.5;

    (
        geo_transform[0] + c * geo_transform[1] + r * geo_transform[2],
        geo_transform[3] + c * geo_transform[4] + r * geo_transform[5],
    )
}

/// Burn zone ids onto the raster grid. 0 marks pixels outside every zone.
/// Contour rings do not overlap; if they did, the earlier feature wins.
pub fn zone_grid(
    zones: &[Zone],
    geo_transform: &[f64; 6],
    width: usize,
    height: usize,
) -> Vec<u32> {
    let bounds: Vec<_> = zones.iter().map(|zone| ring_bounds(&zone.rings)).collect();
    let mut grid = vec![0u32; width * height];

    for row in 0..height {
        for col in 0..width {
            let (x, y) = pixel_center(geo_transform, col, row);
            for (zone, bound) in zones.iter().zip(&bounds) {
                let Some((min_x, min_y, max_x, max_y)) = *bound else {
                    continue;
                };
                if x < min_x || x > max_x || y < min_y || y > max_y {
                    continue;
                }
                if contains(&zone.rings, x, y) {
                    grid[row * width + col] = zone.id;
                    break;
                }
            }
        }
    }

    grid
}

/// Per-zone count/area/sum for one mask layer.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct LayerStats {
    count: u64,
    sum: f64,
}

/// One zonal statistics row as exported to CSV.
#[derive(Debug, Serialize, PartialEq)]
pub struct ZonalRow {
    pub contour_min: Option<f64>,
    pub contour_max: Option<f64>,
    pub snow_count: u64,
    pub snow_area: f64,
    pub snow_sum: f64,
    pub usable_count: u64,
    pub usable_area: f64,
    pub usable_sum: f64,
    pub usable_snow_count: u64,
    pub usable_snow_area: f64,
    pub usable_snow_sum: f64,
    pub pct_snow: Option<f64>,
    pub pct_usable: Option<f64>,
    pub pct_usable_snow: Option<f64>,
}

/// Accumulate the three stat layers (snow, usable, and their product) per
/// zone and derive the percentage fields.
pub fn zonal_rows(
    zones: &[Zone],
    grid: &[u32],
    snow: &[f64],
    usable: &[f64],
    pixel_area: f64,
) -> Result<Vec<ZonalRow>> {
    if grid.len() != snow.len() || grid.len() != usable.len() {
        return Err(anyhow!("mask bands do not match the zone grid"));
    }

    let mut stats = vec![[LayerStats::default(); 3]; zones.len() + 1];
    for ((&zone, &snow_value), &usable_value) in grid.iter().zip(snow).zip(usable) {
        if zone == 0 || zone as usize >= stats.len() {
            continue;
        }
        let layers = &mut stats[zone as usize];
        for (layer, value) in layers
            .iter_mut()
            .zip([snow_value, usable_value, snow_value * usable_value])
        {
            layer.count += 1;
            layer.sum += value;
        }
    }

    let rows = zones
        .iter()
        .map(|zone| {
            let [snow, usable, usable_snow] = stats[zone.id as usize];
            ZonalRow {
                contour_min: zone.contour_min,
                contour_max: zone.contour_max,
                snow_count: snow.count,
                snow_area: snow.count as f64 * pixel_area,
                snow_sum: snow.sum,
                usable_count: usable.count,
                usable_area: usable.count as f64 * pixel_area,
                usable_sum: usable.sum,
                usable_snow_count: usable_snow.count,
                usable_snow_area: usable_snow.count as f64 * pixel_area,
                usable_snow_sum: usable_snow.sum,
                pct_snow: ratio(snow.sum, snow.count as f64),
                pct_usable: ratio(usable.sum, usable.count as f64),
                pct_usable_snow: ratio(usable_snow.sum, usable.sum),
            }
        })
        .collect();

    Ok(rows)
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator != 0.0).then(|| numerator / denominator)
}

/// Export the rows, replacing any existing file.
pub fn write_csv(rows: &[ZonalRow], path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn square(min: f64, max: f64) -> Vec<Vec<(f64, f64)>> {
        vec![vec![(min, min), (max, min), (max, max), (min, max), (min, min)]]
    }

    // 4x4 grid of 1x1 pixels with origin at the top left
    const GT: [f64; 6] = [0.0, 1.0, 0.0, 4.0, 0.0, -1.0];

    #[test]
    fn should_contain_points_inside_the_ring() {
        let rings = square(0.0, 2.0);

        assert!(contains(&rings, 1.0, 1.0));
        assert!(!contains(&rings, 3.0, 1.0));
        assert!(!contains(&rings, -1.0, 1.0));
    }

    #[test]
    fn should_exclude_holes() {
        let mut rings = square(0.0, 4.0);
        rings.extend(square(1.0, 3.0));

        assert!(contains(&rings, 0.5, 0.5));
        assert!(!contains(&rings, 2.0, 2.0));
    }

    #[test]
    fn should_burn_zone_ids_at_pixel_centers() {
        let zones = vec![
            Zone {
                id: 1,
                contour_min: Some(1000.0),
                contour_max: Some(1500.0),
                rings: square(0.0, 2.0),
            },
            Zone {
                id: 2,
                contour_min: Some(1500.0),
                contour_max: Some(2000.0),
                rings: square(2.0, 4.0),
            },
        ];

        let grid = zone_grid(&zones, &GT, 4, 4);

        // rows run north to south
        assert_eq!(grid[0], 0); // centre (0.5, 3.5): above zone 1, west of zone 2
        assert_eq!(grid[2], 2); // centre (2.5, 3.5)
        assert_eq!(grid[3 * 4], 1); // centre (0.5, 0.5)
        assert_eq!(grid[3 * 4 + 3], 0); // centre (3.5, 0.5): east of zone 1
    }

    #[test]
    fn should_accumulate_the_three_layers() {
        let zones = vec![Zone {
            id: 1,
            contour_min: Some(1000.0),
            contour_max: Some(1500.0),
            rings: square(0.0, 2.0),
        }];
        let grid = zone_grid(&zones, &GT, 4, 4);

        // snow everywhere, usable only in the zone's bottom row
        let mut snow = vec![0.0; 16];
        let mut usable = vec![0.0; 16];
        for col in 0..4 {
            snow[2 * 4 + col] = 1.0;
            snow[3 * 4 + col] = 1.0;
        }
        usable[3 * 4] = 1.0;
        usable[3 * 4 + 1] = 1.0;

        let rows = zonal_rows(&zones, &grid, &snow, &usable, 1.0).unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.snow_count, 4);
        assert_eq!(row.snow_sum, 4.0);
        assert_eq!(row.snow_area, 4.0);
        assert_eq!(row.usable_sum, 2.0);
        assert_eq!(row.usable_snow_sum, 2.0);
        assert_eq!(row.pct_snow, Some(1.0));
        assert_eq!(row.pct_usable, Some(0.5));
        assert_eq!(row.pct_usable_snow, Some(1.0));
    }

    #[test]
    fn should_blank_percentages_on_zero_denominators() {
        let zones = vec![Zone {
            id: 1,
            contour_min: None,
            contour_max: None,
            rings: square(10.0, 12.0), // outside the 4x4 grid
        }];
        let grid = zone_grid(&zones, &GT, 4, 4);
        let snow = vec![0.0; 16];
        let usable = vec![0.0; 16];

        let rows = zonal_rows(&zones, &grid, &snow, &usable, 1.0).unwrap();

        assert_eq!(rows[0].snow_count, 0);
        assert_eq!(rows[0].pct_snow, None);
        assert_eq!(rows[0].pct_usable_snow, None);
    }

    #[test]
    fn should_reject_mismatched_band_sizes() {
        let zones = vec![];
        let grid = vec![0u32; 16];

        assert!(zonal_rows(&zones, &grid, &[0.0; 8], &[0.0; 16], 1.0).is_err());
    }

    #[test]
    fn should_read_zones_from_geojson() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contour_rings.geojson");
        let collection = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "ContourMin": 1000.0, "ContourMax": 1500.0 },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]]]
                }
            }]
        });
        fs::write(&path, collection.to_string()).unwrap();

        let zones = read_zones(&path).unwrap();

        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].id, 1);
        assert_eq!(zones[0].contour_min, Some(1000.0));
        assert_eq!(zones[0].rings[0].len(), 5);
    }

    #[test]
    fn should_replace_an_existing_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("2017-11-24_masks.csv");
        fs::write(&path, "stale").unwrap();

        write_csv(&[], &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(!text.contains("stale"));
    }
}
