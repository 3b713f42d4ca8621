use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::error::{SyncError, SyncResult};

/// Canonical dependency manifest location, relative to the output directory.
pub const MOD_LIST_FILE: &str = "mods/mod_list.json";
/// Location of a manifest synthesized as a parent for a foreign mod list.
pub const PACK_MOD_LIST_FILE: &str = "mods/mod_list_pack.json";

/// Dependency manifest consumed by the platform loader.
///
/// `mod_ref` entries are `namespace:artifact:version` strings resolved
/// relative to `repository_root`. `parent_list` optionally chains to another
/// manifest (`absolute:`-prefixed filesystem path, or a path relative to the
/// output directory), letting independently managed mod sets coexist in one
/// output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModList {
    #[serde(rename = "repositoryRoot")]
    pub repository_root: String,
    #[serde(rename = "modRef", default)]
    pub mod_ref: Vec<String>,
    #[serde(rename = "parentList", default, skip_serializing_if = "Option::is_none")]
    pub parent_list: Option<String>,
}

pub async fn read_mod_list(path: &Path) -> SyncResult<ModList> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SyncError::io(path, e))?;
    serde_json::from_str(&json).map_err(|source| SyncError::ModListParse {
        path: path.to_path_buf(),
        source,
    })
}

pub async fn write_mod_list(path: &Path, list: &ModList) -> SyncResult<()> {
    info!("Writing mod list to '{}'...", path.display());
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| SyncError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(list)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| SyncError::io(path, e))
}
