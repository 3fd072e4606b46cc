//! Search the Sentinel Hub catalog for all scenes over the study area,
//! including any cloud cover (cloudy data is filtered in a later stage).

use anyhow::Result;
use serde_json::json;

use crate::aoi::read_aoi;
use crate::cli::{create_spinner, SearchArgs};
use crate::sentinel::{Credentials, SentinelHub};

pub async fn search(args: &SearchArgs) -> Result<String> {
    let aoi = read_aoi(&args.aoi, 0)?;
    let geometry = aoi.to_wgs84()?;
    let credentials = Credentials::from_env()?;

    let bar = create_spinner("Searching the catalog...".to_string());
    let hub = SentinelHub::connect(&credentials).await?;
    let features = hub
        .search(&geometry, &args.from, &args.to, args.max_cloud)
        .await?;
    bar.finish_with_message("Catalog search complete");

    println!("Total number of results: {}", features.len());

    // wrapped as a FeatureCollection so the file loads in GIS tools
    let collection = json!({ "type": "FeatureCollection", "features": features });
    std::fs::write(&args.output, serde_json::to_string_pretty(&collection)?)?;

    Ok(args.output.to_string_lossy().to_string())
}
