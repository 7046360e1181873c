//! HashiCorp-style release index registry
//!
//! The index is an HTML directory listing with one entry per release, e.g.
//! `<a href="/terraform/1.5.7/">terraform_1.5.7</a>`. The body is treated as
//! opaque text and scanned for `<product>_<major>.<minor>.<patch>[-<tag>]`.

use std::time::Duration;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::http::{RetryPolicy, build_client, retry_with_backoff};
use crate::version::error::RegistryError;
use crate::version::registry::Registry;
use crate::version::semver::SemanticVersion;
use crate::version::types::VersionCatalog;

/// Registry implementation for a release index page
pub struct ReleasesRegistry {
    client: reqwest::Client,
    base_url: String,
    product: String,
    retry: RetryPolicy,
    pattern: Regex,
}

impl ReleasesRegistry {
    /// Creates a new registry with its own HTTP client using `timeout` per request
    pub fn new(base_url: &str, product: &str, timeout: Duration) -> Result<Self, RegistryError> {
        let client = build_client(timeout).map_err(|e| RegistryError::Network {
            url: base_url.to_string(),
            source: e,
        })?;
        Ok(Self::with_client(client, base_url, product))
    }

    /// Creates a new registry reusing an existing client
    pub fn with_client(client: reqwest::Client, base_url: &str, product: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            product: product.to_string(),
            retry: RetryPolicy::default(),
            pattern: version_pattern(product),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// URL of the index page listing every release
    pub fn index_url(&self) -> String {
        format!("{}/{}/", self.base_url, self.product)
    }

    /// Extract every recognizable version from an index body
    pub fn scan(&self, body: &str) -> VersionCatalog {
        let mut catalog = VersionCatalog::default();

        for line in body.lines() {
            for captures in self.pattern.captures_iter(line) {
                let Some(token) = captures.get(1) else {
                    continue;
                };

                // The match must not run into a longer identifier ("1.2.3_linux", "1.2.3.4")
                let followed_by_ident = line[token.end()..]
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '+' | '-'));
                if followed_by_ident {
                    continue;
                }

                match SemanticVersion::parse(token.as_str()) {
                    Ok(version) => {
                        catalog.insert(version);
                    }
                    Err(e) => debug!("Skipping unparseable version token: {}", e),
                }
            }
        }

        catalog
    }

    async fn fetch_once(&self, url: &str) -> Result<VersionCatalog, RegistryError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RegistryError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Release index returned status {}: {}", status, url);
            return Err(RegistryError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| RegistryError::from_reqwest(url, e))?;

        let catalog = self.scan(&body);
        if catalog.is_empty() {
            warn!("Release index at {} contained no recognizable versions", url);
            return Err(RegistryError::EmptyCatalog {
                url: url.to_string(),
            });
        }

        Ok(catalog)
    }
}

#[async_trait::async_trait]
impl Registry for ReleasesRegistry {
    async fn fetch_catalog(&self) -> Result<VersionCatalog, RegistryError> {
        let url = self.index_url();
        debug!("Fetching release index {}", url);

        let catalog = retry_with_backoff(&self.retry, "fetch release index", || {
            self.fetch_once(&url)
        })
        .await?;

        info!("Found {} published {} versions", catalog.len(), self.product);
        Ok(catalog)
    }
}

/// `<product>_<version>` not preceded by an identifier character
fn version_pattern(product: &str) -> Regex {
    let pattern = format!(
        r"(?:^|[^\w-]){}_(\d+\.\d+\.\d+(?:-[0-9A-Za-z]+(?:\.[0-9A-Za-z]+)*)?)",
        regex::escape(product)
    );
    Regex::new(&pattern).expect("escaped product name forms a valid pattern")
}
