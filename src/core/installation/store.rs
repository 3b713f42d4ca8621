use std::path::PathBuf;

use tracing::info;

use super::model::Installation;
use crate::core::error::{SyncError, SyncResult};

/// Reads and writes the installation record for one output directory.
pub struct InstallationStore {
    path: PathBuf,
}

impl InstallationStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the record, or `None` when this directory was never installed to.
    ///
    /// A malformed record is an error, not `None`: silently starting over
    /// would discard the override fingerprint and with it the ability to
    /// clean up files from the previous generation.
    pub async fn load(&self) -> SyncResult<Option<Installation>> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SyncError::io(&self.path, e)),
        };
        let record: Installation = serde_json::from_str(&json)?;
        Ok(Some(record))
    }

    /// Persist the record, replacing any previous one.
    ///
    /// Written to a sibling temp file first and renamed into place, so a
    /// crash mid-write cannot leave a truncated record behind.
    pub async fn save(&self, record: &Installation) -> SyncResult<()> {
        info!("Saving installation data to '{}'...", self.path.display());
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SyncError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(record)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| SyncError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| SyncError::io(&self.path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_record_loads_as_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = InstallationStore::new(tmp.path().join("packsync-installation.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let store = InstallationStore::new(tmp.path().join("packsync-installation.json"));

        let mut record = Installation::new(7, "pack", "1.12.2", false, tmp.path().join("mods"));
        record.last_file = Some("1.0.0".into());
        store.save(&record).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.project_id, 7);
        assert_eq!(loaded.last_file.as_deref(), Some("1.0.0"));
        // No temp file left behind.
        assert!(!tmp.path().join("packsync-installation.json.tmp").exists());
    }

    #[tokio::test]
    async fn malformed_record_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("packsync-installation.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = InstallationStore::new(path);
        assert!(store.load().await.is_err());
    }
}
