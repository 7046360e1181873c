//! Resolve a constraint to a runnable executable
//!
//! ```text
//! constraint text ──parse──▶ VersionConstraint
//!                                   │
//! Registry ──fetch_catalog──▶ select ──▶ SemanticVersion ──ensure──▶ executable
//! ```
//!
//! The constraint is parsed before any network call, so a malformed
//! constraint fails fast and offline.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::config::LauncherConfig;
use crate::error::LaunchError;
use crate::install::{Provisioner, ProvisionerConfig};
use crate::version::constraint::VersionConstraint;
use crate::version::registries::ReleasesRegistry;
use crate::version::registry::Registry;
use crate::version::selector::{SelectOptions, select};
use crate::version::semver::SemanticVersion;

pub struct Launcher {
    registry: Arc<dyn Registry>,
    provisioner: Provisioner,
    options: SelectOptions,
}

impl Launcher {
    pub fn new(
        registry: Arc<dyn Registry>,
        provisioner: Provisioner,
        options: SelectOptions,
    ) -> Self {
        Self {
            registry,
            provisioner,
            options,
        }
    }

    /// Wire the release index registry and provisioner for the current platform
    pub fn from_config(config: &LauncherConfig) -> Result<Self, LaunchError> {
        let registry = ReleasesRegistry::new(
            &config.releases_url,
            &config.product,
            config.fetch_timeout(),
        )?
        .with_retry(config.retry.clone());
        let provisioner = Provisioner::new(ProvisionerConfig::from_launcher_config(config)?)?;

        Ok(Self::new(
            Arc::new(registry),
            provisioner,
            SelectOptions {
                allow_prerelease: config.allow_prerelease,
            },
        ))
    }

    /// Pick the best published version for `constraint`
    pub async fn resolve(&self, constraint: &str) -> Result<SemanticVersion, LaunchError> {
        let constraint = VersionConstraint::parse(constraint)?;
        info!("Looking for a version matching \"{}\"", constraint);

        let catalog = self.registry.fetch_catalog().await?;
        let version = select(&constraint, &catalog, self.options)?;

        info!("Using version {}", version);
        Ok(version)
    }

    /// Resolve `constraint` and make sure the chosen version is installed
    pub async fn prepare(&self, constraint: &str) -> Result<PathBuf, LaunchError> {
        let version = self.resolve(constraint).await?;
        let executable = self.provisioner.ensure(&version).await?;
        Ok(executable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RetryPolicy;
    use crate::install::extract::fixtures::build_zip;
    use crate::install::{Arch, Os, Platform};
    use crate::version::error::{ParseError, RegistryError, SelectError};
    use crate::version::registry::MockRegistry;
    use crate::version::types::VersionCatalog;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    fn catalog(versions: &[&str]) -> VersionCatalog {
        versions
            .iter()
            .map(|v| SemanticVersion::parse(v).unwrap())
            .collect()
    }

    fn provisioner(releases_url: &str, cache: &Path) -> Provisioner {
        Provisioner::new(ProvisionerConfig {
            cache_root: cache.to_path_buf(),
            releases_url: releases_url.to_string(),
            product: "terraform".to_string(),
            platform: Platform::new(Os::Linux, Arch::Amd64),
            download_timeout: Duration::from_secs(10),
            retry: RetryPolicy::none(),
            verify_checksum: false,
        })
        .unwrap()
    }

    fn launcher(registry: MockRegistry, releases_url: &str, cache: &Path) -> Launcher {
        Launcher::new(
            Arc::new(registry),
            provisioner(releases_url, cache),
            SelectOptions::default(),
        )
    }

    #[tokio::test]
    async fn resolve_selects_highest_satisfying_version() {
        let cache = TempDir::new().unwrap();
        let mut registry = MockRegistry::new();
        registry
            .expect_fetch_catalog()
            .times(1)
            .returning(|| Ok(catalog(&["1.1.0", "1.2.0", "1.5.3", "2.0.0", "2.1.0"])));

        let version = launcher(registry, "http://127.0.0.1:9", cache.path())
            .resolve(">= 1.2.0, < 2.0.0")
            .await
            .unwrap();

        assert_eq!(version.to_string(), "1.5.3");
    }

    #[tokio::test]
    async fn resolve_rejects_malformed_constraint_before_fetching() {
        let cache = TempDir::new().unwrap();
        let mut registry = MockRegistry::new();
        registry.expect_fetch_catalog().times(0);

        let result = launcher(registry, "http://127.0.0.1:9", cache.path())
            .resolve("~> abc")
            .await;

        assert!(matches!(
            result,
            Err(LaunchError::Parse(ParseError::MalformedVersion { .. }))
        ));
    }

    #[tokio::test]
    async fn resolve_reports_no_match() {
        let cache = TempDir::new().unwrap();
        let mut registry = MockRegistry::new();
        registry
            .expect_fetch_catalog()
            .returning(|| Ok(catalog(&["0.9.0", "1.0.1"])));

        let result = launcher(registry, "http://127.0.0.1:9", cache.path())
            .resolve("= 1.0.0")
            .await;

        assert!(matches!(
            result,
            Err(LaunchError::NoMatch(SelectError::NoMatch { candidates: 2, .. }))
        ));
    }

    #[tokio::test]
    async fn resolve_lifts_fetch_timeout() {
        let cache = TempDir::new().unwrap();
        let mut registry = MockRegistry::new();
        registry.expect_fetch_catalog().returning(|| {
            Err(RegistryError::Timeout {
                url: "https://releases.example.com/terraform/".to_string(),
            })
        });

        let err = launcher(registry, "http://127.0.0.1:9", cache.path())
            .resolve(">= 1.0.0")
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(err.exit_code(), 7);
    }

    #[tokio::test]
    async fn prepare_installs_selected_version() {
        let mut server = mockito::Server::new_async().await;
        let archive = server
            .mock("GET", "/terraform/1.0.0/terraform_1.0.0_linux_amd64.zip")
            .with_status(200)
            .with_body(build_zip(&[("terraform", "#!/bin/sh\n", 0o755)]))
            .expect(1)
            .create_async()
            .await;
        let cache = TempDir::new().unwrap();
        let mut registry = MockRegistry::new();
        registry
            .expect_fetch_catalog()
            .returning(|| Ok(catalog(&["1.0.0", "1.0.0-rc1", "0.15.5"])));

        let path = launcher(registry, &server.url(), cache.path())
            .prepare(">= 1.0.0")
            .await
            .unwrap();

        archive.assert_async().await;
        assert_eq!(path, cache.path().join("1.0.0").join("terraform"));
        assert!(path.is_file());
    }

    #[tokio::test]
    async fn prepare_surfaces_provisioning_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/terraform/1.5.3/terraform_1.5.3_linux_amd64.zip")
            .with_status(404)
            .create_async()
            .await;
        let cache = TempDir::new().unwrap();
        let mut registry = MockRegistry::new();
        registry
            .expect_fetch_catalog()
            .returning(|| Ok(catalog(&["1.5.3"])));

        let err = launcher(registry, &server.url(), cache.path())
            .prepare("1.5.3")
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 6);
    }
}
