//! Sentinel Hub API client: OAuth2 token, catalog search, process requests.

use std::collections::hash_map::DefaultHasher;
use std::fs::{self, File};
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::aoi::Aoi;
use crate::evalscript;

const TOKEN_URL: &str =
    "https://services.sentinel-hub.com/auth/realms/main/protocol/openid-connect/token";
const CATALOG_URL: &str = "https://services.sentinel-hub.com/api/v1/catalog/1.0.0/search";
const PROCESS_URL: &str = "https://services.sentinel-hub.com/api/v1/process";
const COLLECTION: &str = "sentinel-2-l2a";
const PAGE_LIMIT: u64 = 100;

/// Sentinel Hub OAuth2 client credentials.
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    /// Read credentials from the `SH_CLIENT_ID` / `SH_CLIENT_SECRET`
    /// environment variables.
    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var("SH_CLIENT_ID").context("SH_CLIENT_ID is not set")?;
        let client_secret =
            std::env::var("SH_CLIENT_SECRET").context("SH_CLIENT_SECRET is not set")?;

        Ok(Self {
            client_id,
            client_secret,
        })
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Authenticated client for the catalog and process APIs.
pub struct SentinelHub {
    http: reqwest::Client,
    token: String,
}

impl SentinelHub {
    /// Exchange client credentials for a bearer token.
    pub async fn connect(credentials: &Credentials) -> Result<Self> {
        let http = reqwest::Client::new();
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
        ];

        let response = http.post(TOKEN_URL).form(&params).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("authentication failed: {}", response.status()));
        }
        let token: TokenResponse = response.json().await?;

        Ok(Self {
            http,
            token: token.access_token,
        })
    }

    /// Search the catalog for every scene intersecting `geometry` (WGS84)
    /// within the time interval, following `context.next` until the result
    /// set is exhausted.
    pub async fn search(
        &self,
        geometry: &Value,
        from: &str,
        to: &str,
        max_cloud: f64,
    ) -> Result<Vec<Value>> {
        let mut features = Vec::new();
        let mut next: Option<Value> = None;

        loop {
            let mut body = search_body(geometry, from, to, max_cloud);
            if let Some(token) = &next {
                body["next"] = token.clone();
            }

            let response = self
                .http
                .post(CATALOG_URL)
                .bearer_auth(&self.token)
                .json(&body)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(anyhow!("catalog search failed: {}", response.status()));
            }
            let page: Value = response.json().await?;

            features.extend(page_features(&page));

            match next_token(&page) {
                Some(token) => next = Some(token),
                None => break,
            }
        }

        Ok(features)
    }

    /// Submit a process request and stream the response body into `folder`.
    /// The file name extension follows the response content type; requests
    /// with two outputs come back as a tar archive.
    pub async fn process_to_file(
        &self,
        body: &Value,
        folder: &Path,
        progress_bar: &ProgressBar,
    ) -> Result<PathBuf> {
        let response = self
            .http
            .post(PROCESS_URL)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/tar")
            .json(body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(anyhow!("process request failed: {}", response.status()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");
        let (part_path, file_path) = response_paths(folder, content_type);

        // Convert the spinner to a sized bar when the length is known
        let total_size = response.content_length().unwrap_or(0);
        if total_size > 0 {
            progress_bar.set_length(total_size);
            progress_bar.set_style(
                ProgressStyle::with_template(
                    "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {eta}",
                )
                .unwrap()
                .progress_chars("=> "),
            );
        }

        // Stream into a .part file so an interrupted download never leaves a
        // truncated response behind under the final name.
        if let Err(e) = stream_body(response, &part_path, progress_bar).await {
            let _ = fs::remove_file(&part_path);
            return Err(e);
        }
        fs::rename(&part_path, &file_path)?;

        Ok(file_path)
    }
}

async fn stream_body(
    response: reqwest::Response,
    path: &Path,
    progress_bar: &ProgressBar,
) -> Result<()> {
    let mut file = File::create(path)?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("error reading chunk")?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        progress_bar.set_position(downloaded);
    }

    Ok(())
}

/// In-progress and final paths for a response of the given content type.
fn response_paths(folder: &Path, content_type: &str) -> (PathBuf, PathBuf) {
    let extension = extension_for(content_type);

    (
        folder.join(format!("response.{extension}.part")),
        folder.join(format!("response.{extension}")),
    )
}

/// The features carried by one page of catalog results.
fn page_features(page: &Value) -> Vec<Value> {
    page["features"].as_array().cloned().unwrap_or_default()
}

/// The pagination token of the following page. The last page either omits
/// `context.next` or sets it to null.
fn next_token(page: &Value) -> Option<Value> {
    match page["context"].get("next") {
        Some(token) if !token.is_null() => Some(token.clone()),
        _ => None,
    }
}

fn extension_for(content_type: &str) -> &'static str {
    if content_type.contains("tar") {
        "tar"
    } else if content_type.contains("tiff") {
        "tiff"
    } else {
        "dat"
    }
}

/// One page of a STAC catalog search.
fn search_body(geometry: &Value, from: &str, to: &str, max_cloud: f64) -> Value {
    json!({
        "collections": [COLLECTION],
        "datetime": format!("{from}T00:00:00Z/{to}T23:59:59Z"),
        "intersects": geometry,
        "filter": format!("eo:cloud_cover < {max_cloud}"),
        "filter-lang": "cql2-text",
        "limit": PAGE_LIMIT,
    })
}

/// Build the process API request for one day of imagery over the AOI, in the
/// AOI's native CRS, mosaicking the least cloudy scene on top.
pub fn process_request_body(aoi: &Aoi, date: &str, resolution: f64) -> Result<Value> {
    Ok(json!({
        "input": {
            "bounds": {
                "geometry": aoi.geometry,
                "properties": { "crs": aoi.crs_url()? }
            },
            "data": [{
                "type": COLLECTION,
                "dataFilter": {
                    "timeRange": {
                        "from": format!("{date}T00:00:00Z"),
                        "to": format!("{date}T23:59:59Z")
                    },
                    "mosaickingOrder": "leastCC"
                }
            }]
        },
        "output": {
            "resx": resolution,
            "resy": resolution,
            "responses": [
                { "identifier": "spectral", "format": { "type": "image/tiff" } },
                { "identifier": "masks", "format": { "type": "image/tiff" } }
            ]
        },
        "evalscript": evalscript::FINAL_DATA_REQUEST,
    }))
}

/// Stable folder name for a request, standing in for the SDK's hashed data
/// folders. `DefaultHasher::new()` uses fixed keys, so the name survives
/// re-runs.
pub fn request_fingerprint(body: &Value) -> String {
    let mut hasher = DefaultHasher::new();
    body.to_string().hash(&mut hasher);

    format!("{:016x}", hasher.finish())
}

// -- Tests -------------------------------------------------------------------
