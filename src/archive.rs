//! Unpacking downloaded responses and copying rasters into place.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use flate2::read::GzDecoder;
use tar::Archive;

/// Extracts the archive next to itself and returns the extracted file paths.
/// Gzipped tars are detected by their magic bytes; the archive itself is
/// kept.
pub fn extract_archive(archive_path: &Path) -> Result<Vec<PathBuf>> {
    let dest = archive_path
        .parent()
        .ok_or_else(|| anyhow!("archive `{}` has no parent folder", archive_path.display()))?;

    let mut magic = [0u8; 2];
    File::open(archive_path)?.read_exact(&mut magic)?;

    let file = File::open(archive_path)?;
    if magic == [0x1f, 0x8b] {
        unpack(Archive::new(GzDecoder::new(file)), dest)
    } else {
        unpack(Archive::new(file), dest)
    }
}

fn unpack<R: Read>(mut archive: Archive<R>, dest: &Path) -> Result<Vec<PathBuf>> {
    let mut extracted = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = dest.join(entry.path()?);
        entry.unpack_in(dest)?;
        if path.is_file() {
            extracted.push(path);
        }
    }

    Ok(extracted)
}

/// Copies each file into `images_dir` under the flat naming convention
/// `{date}_{original name}`. Returns the destinations, aligned with
/// `sources`.
pub fn copy_to_images(sources: &[PathBuf], images_dir: &Path, date: &str) -> Result<Vec<PathBuf>> {
    let mut copied = Vec::new();

    for src in sources {
        let name = src
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow!("`{}` has no usable file name", src.display()))?;
        let dst = images_dir.join(format!("{date}_{name}"));
        fs::copy(src, &dst)?;
        copied.push(dst);
    }

    Ok(copied)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    fn tar_bytes() -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        let data = b"not really a tiff";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "masks.tif", data.as_slice())
            .unwrap();

        builder.into_inner().unwrap()
    }

    #[test]
    fn should_extract_plain_tar() {
        let dir = TempDir::new().unwrap();
        let archive_path = dir.path().join("response.tar");
        fs::write(&archive_path, tar_bytes()).unwrap();

        let extracted = extract_archive(&archive_path).unwrap();

        assert_eq!(extracted, vec![dir.path().join("masks.tif")]);
        assert!(archive_path.exists());
    }

    #[test]
    fn should_extract_gzipped_tar() {
        let dir = TempDir::new().unwrap();
        let archive_path = dir.path().join("response.tar");

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&tar_bytes()).unwrap();
        fs::write(&archive_path, encoder.finish().unwrap()).unwrap();

        let extracted = extract_archive(&archive_path).unwrap();

        assert_eq!(extracted, vec![dir.path().join("masks.tif")]);
    }

    #[test]
    fn should_copy_with_date_prefix() {
        let dir = TempDir::new().unwrap();
        let images = dir.path().join("images");
        fs::create_dir(&images).unwrap();
        let src = dir.path().join("masks.tif");
        fs::write(&src, b"pixels").unwrap();

        let copied = copy_to_images(&[src], &images, "2017-11-24").unwrap();

        assert_eq!(copied, vec![images.join("2017-11-24_masks.tif")]);
        assert_eq!(fs::read(&copied[0]).unwrap(), b"pixels");
    }
}
