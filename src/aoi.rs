//! Area of interest loading and reprojection.
//!
//! The study area outline is a single polygon read from a GeoJSON file that
//! carries its CRS as a named member (the Esri-style `crs` block). The
//! geometry is used unchanged in its native CRS for process requests, and
//! reprojected to WGS84 for catalog searches.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use gdal::spatial_ref::{CoordTransform, SpatialRef};
use serde_json::Value;

/// Study area polygon with its coordinate reference system.
#[derive(Debug, Clone)]
pub struct Aoi {
    pub geometry: Value,
    pub crs: String,
}

/// Read the AOI/study area outline from a GeoJSON file.
pub fn read_aoi(path: &Path, feature_index: usize) -> Result<Aoi> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading AOI file `{}`", path.display()))?;
    parse_aoi(&text, feature_index)
}

fn parse_aoi(text: &str, feature_index: usize) -> Result<Aoi> {
    let data: Value = serde_json::from_str(text)?;
    let geometry = data["features"]
        .get(feature_index)
        .and_then(|feature| feature.get("geometry"))
        .cloned()
        .ok_or_else(|| anyhow!("AOI file has no feature at index {}", feature_index))?;
    let crs = data["crs"]["properties"]["name"]
        .as_str()
        .ok_or_else(|| anyhow!("AOI file has no named CRS"))?
        .to_string();

    Ok(Aoi { geometry, crs })
}

impl Aoi {
    /// EPSG code parsed from the CRS name. Accepts `EPSG:32610` and the OGC
    /// URN form `urn:ogc:def:crs:EPSG::32610`.
    pub fn epsg(&self) -> Result<u32> {
        self.crs
            .rsplit(':')
            .next()
            .and_then(|code| code.parse().ok())
            .ok_or_else(|| anyhow!("cannot parse an EPSG code from `{}`", self.crs))
    }

    /// The OGC CRS URL the process API expects in bounds properties.
    pub fn crs_url(&self) -> Result<String> {
        Ok(format!(
            "http://www.opengis.net/def/crs/EPSG/0/{}",
            self.epsg()?
        ))
    }

    /// Reproject the polygon to WGS84 for the catalog API. Returns the
    /// geometry unchanged when it is already in WGS84.
    pub fn to_wgs84(&self) -> Result<Value> {
        let epsg = self.epsg()?;
        if epsg == 4326 {
            return Ok(self.geometry.clone());
        }

        let source = SpatialRef::from_epsg(epsg)?;
        let mut target = SpatialRef::from_epsg(4326)?;
        // x = longitude, y = latitude in the transformed output
        target.set_axis_mapping_strategy(
            gdal_sys::OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER,
        );
        let transform = CoordTransform::new(&source, &target)?;

        let mut geometry = self.geometry.clone();
        let coordinates = geometry
            .get_mut("coordinates")
            .ok_or_else(|| anyhow!("AOI geometry has no coordinates"))?;
        *coordinates = transform_positions(coordinates, &transform)?;

        Ok(geometry)
    }
}

/// Walk the nested coordinate arrays, transforming each `[x, y]` position.
fn transform_positions(value: &Value, transform: &CoordTransform) -> Result<Value> {
    let items = value
        .as_array()
        .ok_or_else(|| anyhow!("malformed coordinates in AOI geometry"))?;

    if items.first().is_some_and(Value::is_number) {
        let x = items
            .first()
            .and_then(Value::as_f64)
            .ok_or_else(|| anyhow!("malformed position in AOI geometry"))?;
        let y = items
            .get(1)
            .and_then(Value::as_f64)
            .ok_or_else(|| anyhow!("malformed position in AOI geometry"))?;

        let mut xs = [x];
        let mut ys = [y];
        let mut zs = [0.0];
        transform.transform_coords(&mut xs, &mut ys, &mut zs)?;

        return Ok(Value::from(vec![
            Value::from(xs[0]),
            Value::from(ys[0]),
        ]));
    }

    let transformed = items
        .iter()
        .map(|item| transform_positions(item, transform))
        .collect::<Result<Vec<_>>>()?;

    Ok(Value::from(transformed))
}

// -- Tests -------------------------------------------------------------------
