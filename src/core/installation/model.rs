use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::overrides::FileOverride;
use crate::core::pack::Mod;

/// Persisted record of what was installed into one output directory.
///
/// Read at the start of a run, fully replaced (never merged) at the end of
/// every successful run. A failed run leaves the previous record in place, so
/// a retry re-derives its starting point from the last known good state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installation {
    pub project_id: u32,
    pub project_name: String,
    /// `<id>-<name>`, derived once at construction.
    pub project_slug: String,
    pub game_version: String,
    /// Side this directory was installed for. Must match the configuration
    /// of every later run that touches the same directory.
    pub server: bool,
    /// Shared artifact repository; owned by the installation across runs.
    pub mod_repository: PathBuf,
    /// Version label of the last installed pack file, `None` before the
    /// first successful install.
    pub last_file: Option<String>,
    pub forge_version: Option<String>,
    /// Artifact set of the last successful run.
    pub mods: Option<Vec<Mod>>,
    /// Override fingerprint of the last successful run.
    pub overrides: Option<Vec<FileOverride>>,
    pub updated_at: DateTime<Utc>,
}

impl Installation {
    /// Fresh record for an output directory nothing was installed into yet.
    pub fn new(
        project_id: u32,
        project_name: &str,
        game_version: &str,
        server: bool,
        mod_repository: PathBuf,
    ) -> Self {
        Self {
            project_id,
            project_name: project_name.to_string(),
            project_slug: format!("{}-{}", project_id, project_name),
            game_version: game_version.to_string(),
            server,
            mod_repository,
            last_file: None,
            forge_version: None,
            mods: None,
            overrides: None,
            updated_at: Utc::now(),
        }
    }

    /// Whether a pack version was ever successfully installed here.
    pub fn is_installed(&self) -> bool {
        self.last_file.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_record_has_no_history() {
        let record = Installation::new(
            242493,
            "skyfactory",
            "1.10.2",
            false,
            PathBuf::from("/tmp/work/mods"),
        );
        assert_eq!(record.project_slug, "242493-skyfactory");
        assert!(!record.is_installed());
        assert!(record.mods.is_none());
        assert!(record.overrides.is_none());
    }

    #[test]
    fn record_round_trips_through_json() {
        let mut record = Installation::new(
            1,
            "pack",
            "1.12.2",
            true,
            PathBuf::from("/repo"),
        );
        record.last_file = Some("3.0.6".into());
        record.overrides = Some(vec![FileOverride {
            path: "config/a.cfg".into(),
            checksum: "d41d8cd98f00b204e9800998ecf8427e".into(),
        }]);

        let json = serde_json::to_string(&record).unwrap();
        let back: Installation = serde_json::from_str(&json).unwrap();
        assert_eq!(back.project_slug, "1-pack");
        assert_eq!(back.last_file.as_deref(), Some("3.0.6"));
        assert_eq!(back.overrides.unwrap().len(), 1);
    }
}
