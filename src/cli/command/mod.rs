pub mod clouds;
pub mod dates;
pub mod download;
pub mod rename;
pub mod search;
pub mod snow;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

pub use clouds::clouds;
pub use dates::dates;
pub use download::download;
pub use rename::rename_bands;
pub use search::search;
pub use snow::snow;

/// Find files in `folder` matching any of the glob patterns, sorted by name.
pub fn find_rasters(folder: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut rasters = Vec::new();

    for entry in fs::read_dir(folder)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if path.is_file() && patterns.iter().any(|pattern| matches_pattern(pattern, name)) {
            rasters.push(path);
        }
    }
    rasters.sort();

    Ok(rasters)
}

/// Glob match where `*` stands for any run of characters, so patterns like
/// `*_masks.tif` or `2017-*_masks.*` both work.
fn matches_pattern(pattern: &str, name: &str) -> bool {
    let segments: Vec<&str> = pattern.split('*').collect();
    let [prefix, middle @ .., suffix] = segments.as_slice() else {
        // no star in the pattern
        return pattern == name;
    };

    let Some(mut rest) = name.strip_prefix(prefix) else {
        return false;
    };
    for segment in middle {
        let Some(position) = rest.find(segment) else {
            return false;
        };
        rest = &rest[position + segment.len()..];
    }

    rest.len() >= suffix.len() && rest.ends_with(suffix)
}

/// Makes a list from a comma or semicolon delimited string.
pub fn undelimit(delimited: &str) -> Vec<String> {
    delimited
        .replace(',', ";")
        .split(';')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

// -- Tests -------------------------------------------------------------------
