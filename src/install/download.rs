//! Archive and checksum download
//!
//! Archives are streamed into a temporary file inside the cache root while
//! their SHA-256 digest is computed, so verification needs no second read.

use std::io::Write;
use std::path::Path;

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::http::{RetryPolicy, retry_with_backoff};
use crate::install::error::ProvisionError;

/// A fully downloaded archive; the file is deleted when this is dropped
#[derive(Debug)]
pub struct DownloadedArchive {
    pub file: NamedTempFile,
    /// Lowercase hex SHA-256 of the content
    pub sha256: String,
    pub size: u64,
}

impl DownloadedArchive {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

pub struct Downloader {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl Downloader {
    pub fn new(client: reqwest::Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Download `url` into a temporary file created in `dir`
    pub async fn download_archive(
        &self,
        url: &str,
        dir: &Path,
    ) -> Result<DownloadedArchive, ProvisionError> {
        retry_with_backoff(&self.retry, "download archive", || {
            self.download_once(url, dir)
        })
        .await
    }

    /// Fetch a small text document such as a checksum listing
    pub async fn fetch_text(&self, url: &str) -> Result<String, ProvisionError> {
        retry_with_backoff(&self.retry, "fetch checksums", || async move {
            let response = self.get(url).await?;
            response
                .text()
                .await
                .map_err(|e| ProvisionError::from_reqwest(url, e))
        })
        .await
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, ProvisionError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProvisionError::from_reqwest(url, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProvisionError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            warn!("Artifact store returned status {}: {}", status, url);
            return Err(ProvisionError::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(response)
    }

    async fn download_once(
        &self,
        url: &str,
        dir: &Path,
    ) -> Result<DownloadedArchive, ProvisionError> {
        let mut response = self.get(url).await?;

        let mut file = tempfile::Builder::new()
            .prefix(".download-")
            .tempfile_in(dir)
            .map_err(|e| ProvisionError::io("create temporary download file", e))?;

        let mut hasher = Sha256::new();
        let mut size: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ProvisionError::from_reqwest(url, e))?
        {
            hasher.update(&chunk);
            file.write_all(&chunk)
                .map_err(|e| ProvisionError::io("write downloaded archive", e))?;
            size += chunk.len() as u64;
        }

        file.as_file()
            .sync_all()
            .map_err(|e| ProvisionError::io("sync downloaded archive", e))?;

        debug!("Downloaded {} bytes from {}", size, url);

        Ok(DownloadedArchive {
            file,
            sha256: hex::encode(hasher.finalize()),
            size,
        })
    }
}

/// Look up the digest of `file_name` in a `SHA256SUMS` listing
///
/// Lines have the form `<hex digest>  <file name>` (a `*` before the name
/// marks binary mode and is ignored).
pub fn find_checksum<'a>(sums: &'a str, file_name: &str) -> Option<&'a str> {
    sums.lines().find_map(|line| {
        let (digest, name) = line.trim().split_once(char::is_whitespace)?;
        let name = name.trim_start().trim_start_matches('*');
        (name == file_name).then_some(digest)
    })
}

/// Compare a computed digest against the published one
pub fn verify_checksum(
    archive: &DownloadedArchive,
    file_name: &str,
    expected: &str,
) -> Result<(), ProvisionError> {
    if archive.sha256.eq_ignore_ascii_case(expected) {
        debug!("Checksum verified for {}", file_name);
        Ok(())
    } else {
        Err(ProvisionError::ChecksumMismatch {
            file: file_name.to_string(),
            expected: expected.to_ascii_lowercase(),
            actual: archive.sha256.clone(),
        })
    }
}
