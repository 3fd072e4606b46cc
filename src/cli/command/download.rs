//! Request and download per-date snow/mask rasters.
//!
//! One process request per date in the search results. There might be a more
//! efficient way to do this with the batch API, but per-date requests were
//! enough for this study area.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::aoi::read_aoi;
use crate::archive::{copy_to_images, extract_archive};
use crate::cli::{create_spinner, DownloadArgs};
use crate::dates::{extract_dates, mean};
use crate::index::DownloadIndex;
use crate::sentinel::{process_request_body, request_fingerprint, Credentials, SentinelHub};

pub async fn download(args: &DownloadArgs) -> Result<String> {
    let aoi = read_aoi(&args.aoi, 0)?;
    let search_results = extract_dates(&args.results)?;

    let downloads_dir = args.data_root.join("downloads");
    let images_dir = args.data_root.join("images");
    fs::create_dir_all(&downloads_dir)?;
    fs::create_dir_all(&images_dir)?;
    let mut index = DownloadIndex::load(&args.data_root.join("download_index.json"))?;

    let credentials = Credentials::from_env()?;
    let hub = SentinelHub::connect(&credentials).await?;

    let mut downloaded = 0usize;
    for (date, clouds) in &search_results {
        println!(
            "{} has {} images with average {:.2}% cloud cover.",
            date,
            clouds.len(),
            mean(clouds)
        );

        let body = process_request_body(&aoi, date, args.resolution)?;
        let fingerprint = request_fingerprint(&body);
        let folder = downloads_dir.join(&fingerprint);
        index.insert(&fingerprint, date);

        let response = match existing_response(&folder)? {
            Some(path) => {
                println!(" already downloaded");
                path
            }
            None => {
                fs::create_dir_all(&folder)?;
                let bar = create_spinner(format!("Downloading {}...", date));
                let path = hub.process_to_file(&body, &folder, &bar).await?;
                bar.finish_with_message(format!("{} downloaded", date));
                downloaded += 1;
                path
            }
        };

        let sources = if is_tar(&response) {
            println!(" got a tar");
            extract_archive(&response)?
        } else {
            println!(" got an image (or something else)");
            vec![response.clone()]
        };

        let copies = copy_to_images(&sources, &images_dir, date)?;
        for (src, dst) in sources.iter().zip(&copies) {
            println!(" {} -> {}", src.display(), dst.display());
        }
    }

    index.save()?;

    Ok(format!(
        "{} dates processed, {} new downloads, index has {} entries",
        search_results.len(),
        downloaded,
        index.len()
    ))
}

fn is_tar(path: &Path) -> bool {
    path.extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("tar"))
}

/// A response file saved by an earlier run, if any.
fn existing_response(folder: &Path) -> Result<Option<PathBuf>> {
    if !folder.is_dir() {
        return Ok(None);
    }

    for entry in fs::read_dir(folder)? {
        let path = entry?.path();
        if path.is_file() && path.file_stem().is_some_and(|stem| stem == "response") {
            return Ok(Some(path));
        }
    }

    Ok(None)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn should_detect_tar_responses() {
        assert!(is_tar(Path::new("downloads/abc/response.tar")));
        assert!(!is_tar(Path::new("downloads/abc/response.tiff")));
    }

    #[test]
    fn should_find_a_previous_response() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("a1b2");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("response.tar"), b"").unwrap();
        fs::write(folder.join("masks.tif"), b"").unwrap();

        let found = existing_response(&folder).unwrap();

        assert_eq!(found, Some(folder.join("response.tar")));
    }

    #[test]
    fn should_not_treat_a_partial_download_as_complete() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("a1b2");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("response.tar.part"), b"trunc").unwrap();

        let found = existing_response(&folder).unwrap();

        assert_eq!(found, None);
    }

    #[test]
    fn should_ignore_missing_folders() {
        let dir = TempDir::new().unwrap();

        let found = existing_response(&dir.path().join("nope")).unwrap();

        assert_eq!(found, None);
    }
}
