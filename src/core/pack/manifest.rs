// ─── Pack Manifest ───
// Parses the `manifest.json` shipped inside a pack archive. The manifest is
// read once per run and only summarized into the installation record.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{SyncError, SyncResult};

pub const MANIFEST_NAME: &str = "manifest.json";

/// One binary artifact declared by the pack author.
///
/// `project_id` + `file_id` uniquely identify an artifact version. The side
/// flags drive filtering; both false means the mod is wanted everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mod {
    #[serde(rename = "projectID")]
    pub project_id: u32,
    #[serde(rename = "fileID")]
    pub file_id: u32,
    pub required: bool,
    #[serde(rename = "clientOnly", default)]
    pub client_only: bool,
    #[serde(rename = "serverOnly", default)]
    pub server_only: bool,
}

impl Mod {
    /// Stable artifact name inside the repository, derived from the project id.
    pub fn artifact_name(&self) -> String {
        format!("mod{}", self.project_id)
    }

    /// Repository-relative path of the artifact file.
    pub fn artifact_path(&self, extension: &str) -> String {
        let name = self.artifact_name();
        format!(
            "mc/{}/{}/{}-{}.{}",
            name, self.file_id, name, self.file_id, extension
        )
    }

    /// `namespace:artifact:version` string used in dependency manifests.
    pub fn dependency_string(&self) -> String {
        format!("mc:{}:{}", self.artifact_name(), self.file_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModLoader {
    pub id: String,
    #[serde(default)]
    pub primary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameInfo {
    pub version: String,
    #[serde(rename = "modLoaders", default)]
    pub mod_loaders: Vec<ModLoader>,
}

/// Top-level pack manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackManifest {
    #[serde(rename = "minecraft")]
    pub game_info: GameInfo,
    #[serde(rename = "files", default)]
    pub mods: Vec<Mod>,
    #[serde(rename = "overrides")]
    pub overrides_path: String,
}

impl PackManifest {
    /// Load the manifest from an unpacked pack directory.
    ///
    /// Missing and malformed manifests are both fatal; no other pack format
    /// is supported.
    pub async fn load(pack_dir: &Path) -> SyncResult<Self> {
        let path = pack_dir.join(MANIFEST_NAME);
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SyncError::ManifestMissing(path));
            }
            Err(e) => return Err(SyncError::io(path, e)),
        };
        serde_json::from_str(&json).map_err(|source| SyncError::ManifestParse { path, source })
    }

    /// The loader marked `primary`, if any.
    pub fn primary_loader(&self) -> Option<&ModLoader> {
        self.game_info.mod_loaders.iter().find(|l| l.primary)
    }
}
