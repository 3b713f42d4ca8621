// ─── Override Reconciler ───
// Reconciles the override tree shipped inside a pack against the previous
// run's recorded fingerprint and the files actually on disk. The ordering
// (validate, delete obsolete, copy missing, never overwrite) guarantees the
// tool never clobbers a file it did not itself most recently write.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use super::fingerprint::{fingerprint_tree, hash_file, FileOverride};
use crate::core::error::{SyncError, SyncResult};
use crate::core::mode::Mode;

pub struct OverrideReconciler<'a> {
    output: &'a Path,
    mode: Mode,
    /// Promote drift and missing files to fatal before any deletion happens.
    strict: bool,
}

impl<'a> OverrideReconciler<'a> {
    pub fn new(output: &'a Path, mode: Mode, strict: bool) -> Self {
        Self {
            output,
            mode,
            strict,
        }
    }

    /// Reconcile `source_root` (the pack's override tree) into the output
    /// directory and return the fingerprint to persist for the next run.
    pub async fn reconcile(
        &self,
        source_root: &Path,
        previous: Option<&[FileOverride]>,
    ) -> SyncResult<Vec<FileOverride>> {
        info!("Calculating override checksums...");
        let fresh = fingerprint_tree(source_root).await?;
        info!(
            "Found {} override files and calculated their checksums!",
            fresh.len()
        );

        info!("Checking old checksums for discrepancies...");
        self.mode
            .validate_old_checksums(self.output, previous, self.strict)
            .await?;

        info!("All checksums appear to be valid, deleting old files now...");
        self.delete_obsolete(previous, &fresh).await?;

        info!("Copying new overrides...");
        self.copy_missing(source_root).await?;

        Ok(fresh)
    }

    /// Delete files this tool placed in a previous run that are no longer
    /// part of the pack.
    ///
    /// A file is only removed when its on-disk checksum still matches what
    /// was recorded for it; a hand-edited file is never deleted, even if it
    /// disappeared from the new override set.
    async fn delete_obsolete(
        &self,
        previous: Option<&[FileOverride]>,
        fresh: &[FileOverride],
    ) -> SyncResult<()> {
        let Some(previous) = previous else {
            return Ok(());
        };

        let mut failed: Vec<String> = Vec::new();
        for old in previous {
            let target = self.output.join(&old.path);
            if !target.exists() {
                info!(
                    "Override file '{}' doesn't exist anymore, ignoring it.",
                    old.path
                );
                continue;
            }

            let current = match hash_file(&target).await {
                Ok(checksum) => checksum,
                Err(e) => {
                    error!(
                        "Could not calculate checksum for file '{}': {}",
                        target.display(),
                        e
                    );
                    failed.push(old.path.clone());
                    continue;
                }
            };

            if current != old.checksum {
                warn!(
                    "Override file '{}' was modified since the last run, keeping it.",
                    old.path
                );
                continue;
            }
            if fresh
                .iter()
                .any(|new| new.path == old.path && new.checksum == current)
            {
                info!(
                    "Override file '{}' is still part of the pack, keeping it.",
                    old.path
                );
                continue;
            }

            match tokio::fs::remove_file(&target).await {
                Ok(()) => info!("Deleted obsolete override file '{}'.", old.path),
                Err(e) => {
                    error!("Could not delete file '{}': {}", target.display(), e);
                    failed.push(old.path.clone());
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            error!("Some files could not be deleted, please do so manually!");
            Err(SyncError::ObsoleteNotDeleted(failed))
        }
    }

    /// Copy every file from the new override tree that does not already
    /// exist at the destination. Pre-existing files are authoritative over
    /// pack-shipped defaults and are never overwritten.
    async fn copy_missing(&self, source_root: &Path) -> SyncResult<()> {
        if !source_root.exists() {
            return Ok(());
        }

        let mut pending: Vec<PathBuf> = vec![source_root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| SyncError::io(&dir, e))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| SyncError::io(&dir, e))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| SyncError::io(&path, e))?;
                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }
                if !file_type.is_file() {
                    continue;
                }

                let relative = path.strip_prefix(source_root).unwrap_or(&path);
                let dest = self.output.join(relative);
                if dest.exists() {
                    debug!(
                        "Override file '{}' already exists, keeping the existing file.",
                        relative.display()
                    );
                    continue;
                }
                if let Some(parent) = dest.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| SyncError::io(parent, e))?;
                }
                tokio::fs::copy(&path, &dest)
                    .await
                    .map_err(|e| SyncError::io(&dest, e))?;
            }
        }

        Ok(())
    }
}
