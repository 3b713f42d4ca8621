pub mod forge;

use std::path::Path;

use tracing::{error, info};

use crate::core::config::Side;
use crate::core::downloader::Downloader;
use crate::core::error::{SyncError, SyncResult};
use crate::core::pack::PackManifest;

pub use forge::ForgeInstaller;

/// Everything a loader installation needs from the surrounding pipeline.
pub struct LoaderContext<'a> {
    pub game_version: &'a str,
    /// Directory the pack is installed into; the server installer process
    /// runs with this as its working directory.
    pub output: &'a Path,
    /// Cache directory for downloaded installer binaries.
    pub installer_dir: &'a Path,
    pub side: Side,
    pub downloader: &'a Downloader,
}

/// Install the pack's primary mod loader.
///
/// Returns the loader version that is now expected in the output directory,
/// or `None` when the pack declares no loaders. Only Forge is supported;
/// any other primary loader is a hard failure.
pub async fn install_mod_loaders(
    ctx: &LoaderContext<'_>,
    manifest: &PackManifest,
    previous_forge: Option<&str>,
    previous_game_version: &str,
) -> SyncResult<Option<String>> {
    info!("Installing required mod loaders...");
    if manifest.game_info.mod_loaders.is_empty() {
        info!("No mod loaders required, continuing installation...");
        return Ok(None);
    }

    let Some(primary) = manifest.primary_loader() else {
        error!("No primary mod loader found, aborting!");
        return Err(SyncError::Loader(
            "no primary mod loader declared by the pack".into(),
        ));
    };
    if !primary.id.starts_with("forge") {
        error!(
            "Unknown primary mod loader with id '{}', can't install. Only Forge is supported!",
            primary.id
        );
        return Err(SyncError::Loader(format!(
            "unsupported primary mod loader '{}'",
            primary.id
        )));
    }

    info!("Found primary mod loader '{}', installing...", primary.id);
    let version = ForgeInstaller::version_from_id(&primary.id)?;
    ForgeInstaller
        .install(ctx, version, previous_forge, previous_game_version)
        .await?;
    Ok(Some(version.to_string()))
}
