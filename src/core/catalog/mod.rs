pub mod remote;

use async_trait::async_trait;

use crate::core::error::SyncResult;
use crate::core::pack::Mod;

pub use remote::RemoteCatalog;

/// A pack version already resolved by the caller. The engine never performs
/// version negotiation itself.
#[derive(Debug, Clone)]
pub struct ResolvedVersion {
    /// Numeric file id of the pack archive.
    pub id: u32,
    /// Human-readable version label, persisted as `last_file`.
    pub name: String,
}

/// Resolves download URLs for pack archives and individual artifacts.
///
/// The production implementation talks to the remote catalog; tests
/// substitute a stub. Fetching the bytes is the downloader's job.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// URL of the pack archive for a resolved version.
    async fn pack_download_url(
        &self,
        project_name: &str,
        version: &ResolvedVersion,
    ) -> SyncResult<String>;

    /// URL of a single artifact, or `Ok(None)` when the identifier cannot
    /// be resolved remotely.
    async fn artifact_download_url(&self, artifact: &Mod) -> SyncResult<Option<String>>;
}
