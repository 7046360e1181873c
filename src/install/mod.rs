//! Binary provisioning and the on-disk version cache
//!
//! ```text
//! <cache_root>/
//! ├── 1.5.7/
//! │   ├── terraform      executable
//! │   └── .complete      written last, marks a usable entry
//! ├── 1.5.7.lock         per-version provisioning lock (never removed)
//! └── .1.6.0-XXXXXX/     staging directory of an install in progress
//! ```
//!
//! An entry is only ever made visible by renaming a fully populated staging
//! directory into place, so a reader sees either nothing or a complete entry.

pub mod download;
pub mod error;
pub mod extract;
pub mod lock;
pub mod platform;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::LauncherConfig;
use crate::http::{RetryPolicy, build_client};
use crate::version::semver::SemanticVersion;

pub use download::{DownloadedArchive, Downloader};
pub use error::ProvisionError;
pub use lock::VersionLock;
pub use platform::{Arch, Os, Platform};

/// File written into an entry once it is fully populated
pub const COMPLETE_MARKER: &str = ".complete";

#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
    pub cache_root: PathBuf,
    pub releases_url: String,
    pub product: String,
    pub platform: Platform,
    pub download_timeout: Duration,
    pub retry: RetryPolicy,
    pub verify_checksum: bool,
}

impl ProvisionerConfig {
    /// Derive provisioning settings for the current platform
    ///
    /// The cache root is made absolute here, so every executable path handed
    /// out stays valid when the child runs in another working directory.
    pub fn from_launcher_config(config: &LauncherConfig) -> Result<Self, ProvisionError> {
        let cache_root = std::path::absolute(config.resolved_cache_dir())
            .map_err(|e| ProvisionError::io("resolve cache root", e))?;
        Ok(Self {
            cache_root,
            releases_url: config.releases_url.trim_end_matches('/').to_string(),
            product: config.product.clone(),
            platform: Platform::current()?,
            download_timeout: config.download_timeout(),
            retry: config.retry.clone(),
            verify_checksum: config.verify_checksum,
        })
    }
}

/// One version's slot in the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub version: SemanticVersion,
    pub dir: PathBuf,
    pub executable: PathBuf,
}

impl CacheEntry {
    /// An entry is usable only if both the marker and the executable exist
    pub fn is_complete(&self) -> bool {
        self.dir.join(COMPLETE_MARKER).is_file() && self.executable.is_file()
    }
}

pub struct Provisioner {
    config: ProvisionerConfig,
    downloader: Downloader,
}

impl Provisioner {
    pub fn new(config: ProvisionerConfig) -> Result<Self, ProvisionError> {
        let client = build_client(config.download_timeout).map_err(|e| ProvisionError::Download {
            url: config.releases_url.clone(),
            source: e,
        })?;
        let downloader = Downloader::new(client, config.retry.clone());
        Ok(Self { config, downloader })
    }

    pub fn cache_root(&self) -> &Path {
        &self.config.cache_root
    }

    pub fn entry(&self, version: &SemanticVersion) -> CacheEntry {
        let dir = self.config.cache_root.join(version.to_string());
        let executable = dir.join(self.config.platform.binary_name(&self.config.product));
        CacheEntry {
            version: version.clone(),
            dir,
            executable,
        }
    }

    /// e.g. `terraform_1.5.7_linux_amd64.zip`
    pub fn archive_name(&self, version: &SemanticVersion) -> String {
        format!(
            "{}_{}_{}.zip",
            self.config.product, version, self.config.platform
        )
    }

    pub fn archive_url(&self, version: &SemanticVersion) -> String {
        format!(
            "{}/{}/{}/{}",
            self.config.releases_url,
            self.config.product,
            version,
            self.archive_name(version)
        )
    }

    pub fn checksums_url(&self, version: &SemanticVersion) -> String {
        format!(
            "{}/{}/{}/{}_{}_SHA256SUMS",
            self.config.releases_url, self.config.product, version, self.config.product, version
        )
    }

    /// Make sure `version` is installed and return the path of its executable
    ///
    /// A complete entry is returned without touching the network. Otherwise
    /// the version lock is taken and the entry is checked again, since another
    /// process may have finished the install while we waited.
    pub async fn ensure(&self, version: &SemanticVersion) -> Result<PathBuf, ProvisionError> {
        let entry = self.entry(version);
        if entry.is_complete() {
            debug!("Cache hit for {} at {:?}", version, entry.dir);
            return Ok(entry.executable);
        }

        let cache_root = &self.config.cache_root;
        fs::create_dir_all(cache_root).map_err(|e| {
            ProvisionError::io(format!("create cache root {}", cache_root.display()), e)
        })?;

        let _lock = lock::acquire_version_lock(cache_root, &version.to_string()).await?;

        if entry.is_complete() {
            debug!("{} was installed while waiting for the lock", version);
            return Ok(entry.executable);
        }

        sweep_staging_dirs(cache_root, version);
        self.install(&entry).await?;
        Ok(entry.executable)
    }

    async fn install(&self, entry: &CacheEntry) -> Result<(), ProvisionError> {
        let version = &entry.version;
        let archive_name = self.archive_name(version);
        let archive_url = self.archive_url(version);

        info!("Installing {} {} for {}", self.config.product, version, self.config.platform);

        let archive = self
            .downloader
            .download_archive(&archive_url, &self.config.cache_root)
            .await?;

        if self.config.verify_checksum {
            let sums_url = self.checksums_url(version);
            let sums = self.downloader.fetch_text(&sums_url).await?;
            let expected = download::find_checksum(&sums, &archive_name).ok_or_else(|| {
                ProvisionError::ChecksumMissing {
                    file: archive_name.clone(),
                    url: sums_url.clone(),
                }
            })?;
            download::verify_checksum(&archive, &archive_name, expected)?;
        } else {
            warn!("Checksum verification disabled, installing {} unverified", archive_name);
        }

        let staging = tempfile::Builder::new()
            .prefix(&staging_prefix(version))
            .tempdir_in(&self.config.cache_root)
            .map_err(|e| ProvisionError::io("create staging directory", e))?;

        let binary_name = self.config.platform.binary_name(&self.config.product);
        extract::extract_binary(archive.path(), staging.path(), &binary_name)?;

        fs::write(staging.path().join(COMPLETE_MARKER), version.to_string())
            .map_err(|e| ProvisionError::io("write completion marker", e))?;

        // An incomplete directory left by an interrupted install would block the rename
        if entry.dir.exists() {
            warn!("Removing incomplete cache entry {:?}", entry.dir);
            fs::remove_dir_all(&entry.dir).map_err(|e| {
                ProvisionError::io(format!("remove stale entry {}", entry.dir.display()), e)
            })?;
        }

        let staging_path = staging.keep();
        if let Err(e) = fs::rename(&staging_path, &entry.dir) {
            let _ = fs::remove_dir_all(&staging_path);
            return Err(ProvisionError::io(
                format!("move staging directory into {}", entry.dir.display()),
                e,
            ));
        }

        info!(
            "Installed {} {} ({} bytes) into {:?}",
            self.config.product, version, archive.size, entry.dir
        );
        Ok(())
    }
}

fn staging_prefix(version: &SemanticVersion) -> String {
    format!(".{}-", version)
}

/// Remove staging directories of `version` left behind by a killed install
///
/// Must be called with the version lock held. The random part of a staging
/// name is alphanumeric, so `.1.5.7-rc1-XXXXXX` never matches for `1.5.7`.
fn sweep_staging_dirs(cache_root: &Path, version: &SemanticVersion) {
    let prefix = staging_prefix(version);
    let Ok(entries) = fs::read_dir(cache_root) else {
        return;
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(suffix) = name.to_str().and_then(|n| n.strip_prefix(&prefix)) else {
            continue;
        };
        if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
            continue;
        }
        if !entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }

        warn!("Removing leftover staging directory {:?}", entry.path());
        if let Err(e) = fs::remove_dir_all(entry.path()) {
            warn!("Failed to remove {:?}: {}", entry.path(), e);
        }
    }
}
