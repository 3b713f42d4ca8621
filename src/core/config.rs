use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::mode::Mode;
use crate::core::pack::Mod;

/// File name of the persisted installation record inside the output directory.
pub const INSTALLATION_FILE: &str = "packsync-installation.json";

/// Which half of a modpack this run materializes.
///
/// The side doubles as the mod filter: a client run skips server-only mods
/// and vice versa. Mods flagged neither way are accepted by both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Client,
    Server,
}

impl Side {
    pub fn is_server(self) -> bool {
        matches!(self, Side::Server)
    }

    /// Whether a mod declared in the pack manifest is wanted on this side.
    pub fn accepts(self, m: &Mod) -> bool {
        match self {
            Side::Client => !m.server_only,
            Side::Server => !m.client_only,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Client => write!(f, "client"),
            Side::Server => write!(f, "server"),
        }
    }
}

/// Configuration for one installer run, assembled by the embedding
/// application before the pipeline starts. Paths are expected to be absolute.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub project_id: u32,
    pub project_name: String,
    pub game_version: String,
    pub side: Side,
    pub mode: Mode,
    /// Directory the modpack is materialized into.
    pub output: PathBuf,
    /// Scratch space for pack archives, unpacked trees and loader installers.
    pub work_dir: PathBuf,
    /// Treat checksum drift and missing override files as fatal.
    pub fail_discrepancies: bool,
}

impl SyncConfig {
    /// `<id>-<name>`, the directory-safe identity of the project.
    pub fn project_slug(&self) -> String {
        format!("{}-{}", self.project_id, self.project_name)
    }

    pub fn installation_file(&self) -> PathBuf {
        self.output.join(INSTALLATION_FILE)
    }

    /// Deterministic unpack location for one pack version.
    pub fn pack_cache_dir(&self, version_id: u32) -> PathBuf {
        self.work_dir
            .join("modpacks")
            .join(self.project_slug())
            .join(version_id.to_string())
    }

    /// Download destination of the pack archive, next to its unpack dir.
    pub fn pack_archive_path(&self, version_id: u32) -> PathBuf {
        self.work_dir
            .join("modpacks")
            .join(self.project_slug())
            .join(format!("{}.zip", version_id))
    }

    /// Shared artifact repository used when no prior record names one.
    pub fn default_repository(&self) -> PathBuf {
        self.work_dir.join("mods")
    }

    /// Cache directory for downloaded platform-loader installers.
    pub fn installer_cache_dir(&self) -> PathBuf {
        self.work_dir.join("installers")
    }
}
