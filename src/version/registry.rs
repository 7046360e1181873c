//! Registry trait for fetching the catalog of published versions

#[cfg(test)]
use mockall::automock;

use crate::version::error::RegistryError;
use crate::version::types::VersionCatalog;

/// Trait for fetching every published version of the managed tool
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Fetches all versions currently published
    ///
    /// Every call goes to the remote source; results are never cached.
    ///
    /// # Returns
    /// * `Ok(VersionCatalog)` - Non-empty set of published versions
    /// * `Err(RegistryError)` - If the fetch fails or yields no versions
    async fn fetch_catalog(&self) -> Result<VersionCatalog, RegistryError>;
}
