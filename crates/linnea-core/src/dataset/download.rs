//! Dataset archive download, checksum verification, and extraction.

use crate::error::DatasetError;
use futures_util::StreamExt;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Download a file to `dest`, streaming the body to disk.
pub async fn download_file(url: &str, dest: &Path) -> Result<(), DatasetError> {
    info!(url, dest = %dest.display(), "Downloading");

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let response = reqwest::get(url)
        .await
        .map_err(|e| DatasetError::Download {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(DatasetError::Download {
            url: url.to_string(),
            message: format!("HTTP {}", response.status()),
        });
    }

    let mut file = std::fs::File::create(dest)?;
    let mut stream = response.bytes_stream();
    let mut bytes_written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DatasetError::Download {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        file.write_all(&chunk)?;
        bytes_written += chunk.len() as u64;
    }
    file.flush()?;

    debug!(bytes = bytes_written, "Download complete");
    Ok(())
}

/// Verify a file's BLAKE3 checksum against an expected hex digest.
pub fn verify_checksum(path: &Path, expected: &str) -> Result<(), DatasetError> {
    let mut hasher = blake3::Hasher::new();
    let mut file = std::fs::File::open(path)?;
    std::io::copy(&mut file, &mut hasher)?;
    let actual = hasher.finalize().to_hex().to_string();

    if actual != expected.to_lowercase() {
        return Err(DatasetError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

/// Extract an archive into `dest_dir` based on its file extension.
///
/// Supports `.tar.gz`/`.tgz` and `.zip`.
pub fn extract_archive(archive: &Path, dest_dir: &Path) -> Result<(), DatasetError> {
    std::fs::create_dir_all(dest_dir)?;
    let name = archive.file_name().and_then(|n| n.to_str()).unwrap_or("");

    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        let file = std::fs::File::open(archive)?;
        let decoder = flate2::read::GzDecoder::new(file);
        let mut tar = tar::Archive::new(decoder);
        tar.unpack(dest_dir).map_err(|e| DatasetError::Extract {
            path: archive.to_path_buf(),
            message: e.to_string(),
        })?;
    } else if name.ends_with(".zip") {
        let file = std::fs::File::open(archive)?;
        let mut zip = zip::ZipArchive::new(file).map_err(|e| DatasetError::Extract {
            path: archive.to_path_buf(),
            message: e.to_string(),
        })?;
        zip.extract(dest_dir).map_err(|e| DatasetError::Extract {
            path: archive.to_path_buf(),
            message: e.to_string(),
        })?;
    } else {
        return Err(DatasetError::Extract {
            path: archive.to_path_buf(),
            message: "unsupported archive format".to_string(),
        });
    }

    info!(archive = %archive.display(), dest = %dest_dir.display(), "Extracted");
    Ok(())
}

/// Download an archive, optionally verify its checksum, and extract it.
///
/// The archive file is kept next to the extraction directory so a re-run
/// can skip the download.
pub async fn fetch_and_extract(
    url: &str,
    dest_dir: &Path,
    checksum: Option<&str>,
) -> Result<(), DatasetError> {
    let filename = url.rsplit('/').next().unwrap_or("archive");
    let archive = dest_dir.join(filename);

    if !archive.exists() {
        download_file(url, &archive).await?;
    } else {
        debug!(archive = %archive.display(), "Archive already present, skipping download");
    }

    if let Some(expected) = checksum {
        verify_checksum(&archive, expected)?;
    }

    extract_archive(&archive, dest_dir)
}
