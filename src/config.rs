use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::http::RetryPolicy;

// =============================================================================
// Remote endpoints
// =============================================================================

/// Default base URL of the release CDN
pub const DEFAULT_RELEASES_URL: &str = "https://releases.hashicorp.com";

/// Name of the managed product, used in index, archive, and binary names
pub const DEFAULT_PRODUCT: &str = "terraform";

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("tfrun/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Time-related constants
// =============================================================================

/// Timeout for fetching the release index in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Timeout for downloading a release archive in milliseconds (5 minutes)
pub const DOWNLOAD_TIMEOUT_MS: u64 = 300_000;

/// Timeout for establishing a connection in milliseconds (10 seconds)
pub const CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Launcher configuration
///
/// Read from an optional JSON file; command-line flags and `TFRUN_*`
/// environment variables take precedence over the file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LauncherConfig {
    pub releases_url: String,
    pub product: String,
    /// Cache root; `None` means the platform default from [`cache_dir`]
    pub cache_dir: Option<PathBuf>,
    pub fetch_timeout_ms: u64,
    pub download_timeout_ms: u64,
    pub verify_checksum: bool,
    pub allow_prerelease: bool,
    pub retry: RetryPolicy,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            releases_url: DEFAULT_RELEASES_URL.to_string(),
            product: DEFAULT_PRODUCT.to_string(),
            cache_dir: None,
            fetch_timeout_ms: FETCH_TIMEOUT_MS,
            download_timeout_ms: DOWNLOAD_TIMEOUT_MS,
            verify_checksum: true,
            allow_prerelease: false,
            retry: RetryPolicy::default(),
        }
    }
}

impl LauncherConfig {
    /// Load configuration from a JSON file, falling back to defaults for missing fields
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigFileError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigFileError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_millis(self.download_timeout_ms)
    }

    /// Configured cache root, or the platform default
    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(cache_dir)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("Failed to read config file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Returns the root of the version cache.
/// Uses $XDG_CACHE_HOME/tfrun if XDG_CACHE_HOME is set,
/// otherwise falls back to ~/.cache/tfrun,
/// or ./.tfrun-cache if neither is available.
pub fn cache_dir() -> PathBuf {
    cache_dir_with_env(std::env::var("XDG_CACHE_HOME").ok(), dirs::home_dir())
}

fn cache_dir_with_env(xdg_cache_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    xdg_cache_home
        .filter(|dir| !dir.is_empty())
        .map(|dir| PathBuf::from(dir).join("tfrun"))
        .or_else(|| home_dir.map(|home| home.join(".cache").join("tfrun")))
        .unwrap_or_else(|| PathBuf::from(".tfrun-cache"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn launcher_config_from_partial_object_uses_defaults_for_missing_fields() {
        let result = serde_json::from_value::<LauncherConfig>(json!({
            "releasesUrl": "https://mirror.example.com"
        }))
        .unwrap();

        assert_eq!(result.releases_url, "https://mirror.example.com");
        assert_eq!(result.product, DEFAULT_PRODUCT);
        assert!(result.verify_checksum);
        assert_eq!(result.retry, RetryPolicy::default());
    }

    #[test]
    fn launcher_config_from_full_object_parses_all_fields() {
        let result = serde_json::from_value::<LauncherConfig>(json!({
            "releasesUrl": "https://mirror.example.com",
            "product": "packer",
            "cacheDir": "/var/cache/tools",
            "fetchTimeoutMs": 1000,
            "downloadTimeoutMs": 2000,
            "verifyChecksum": false,
            "allowPrerelease": true,
            "retry": { "maxAttempts": 5, "initialBackoffMs": 10, "maxBackoffMs": 100 }
        }))
        .unwrap();

        assert_eq!(
            result,
            LauncherConfig {
                releases_url: "https://mirror.example.com".to_string(),
                product: "packer".to_string(),
                cache_dir: Some(PathBuf::from("/var/cache/tools")),
                fetch_timeout_ms: 1000,
                download_timeout_ms: 2000,
                verify_checksum: false,
                allow_prerelease: true,
                retry: RetryPolicy {
                    max_attempts: 5,
                    initial_backoff_ms: 10,
                    max_backoff_ms: 100,
                },
            }
        );
    }

    #[test]
    fn load_reads_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "product": "vault" }}"#).unwrap();

        let config = LauncherConfig::load(file.path()).unwrap();

        assert_eq!(config.product, "vault");
        assert_eq!(config.fetch_timeout(), Duration::from_millis(FETCH_TIMEOUT_MS));
    }

    #[test]
    fn load_reports_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let result = LauncherConfig::load(file.path());

        assert!(matches!(result, Err(ConfigFileError::Parse { .. })));
    }

    #[test]
    fn load_reports_missing_file() {
        let result = LauncherConfig::load(Path::new("/nonexistent/tfrun.json"));
        assert!(matches!(result, Err(ConfigFileError::Read { .. })));
    }

    #[test]
    fn cache_dir_with_env_uses_xdg_cache_home_when_set() {
        let path = cache_dir_with_env(
            Some("/tmp/test-cache".to_string()),
            Some(PathBuf::from("/home/user")),
        );

        assert_eq!(path, PathBuf::from("/tmp/test-cache/tfrun"));
    }

    #[test]
    fn cache_dir_with_env_ignores_empty_xdg_cache_home() {
        let path = cache_dir_with_env(Some(String::new()), Some(PathBuf::from("/home/user")));
        assert_eq!(path, PathBuf::from("/home/user/.cache/tfrun"));
    }

    #[test]
    fn cache_dir_with_env_falls_back_to_home_cache() {
        let path = cache_dir_with_env(None, Some(PathBuf::from("/home/user")));

        assert_eq!(path, PathBuf::from("/home/user/.cache/tfrun"));
    }

    #[test]
    fn cache_dir_with_env_falls_back_to_current_dir_when_no_dirs_available() {
        let path = cache_dir_with_env(None, None);
        assert_eq!(path, PathBuf::from(".tfrun-cache"));
    }
}
