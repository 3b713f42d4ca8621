// ─── Override Fingerprint ───
// Content hashes over the override tree. One generation's fingerprint is the
// set of (relative path, digest) pairs for every regular file; it is what the
// reconciler diffs against on the next run.

use std::path::{Path, PathBuf};

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::core::error::{SyncError, SyncResult};

/// One override file as recorded in the installation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOverride {
    /// Path relative to the override root, forward-slash normalized.
    pub path: String,
    /// MD5 digest of the file contents, lowercase hex.
    pub checksum: String,
}

/// MD5 a single file.
pub async fn hash_file(path: &Path) -> SyncResult<String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| SyncError::io(path, e))?;
    let mut hasher = Md5::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Walk `root` recursively and hash every regular file.
///
/// Directories are not recorded. A missing root yields an empty fingerprint
/// (a pack may ship no overrides at all); any hashing failure is fatal for
/// the whole walk. Entries come back sorted by path so the persisted record
/// is stable across runs.
pub async fn fingerprint_tree(root: &Path) -> SyncResult<Vec<FileOverride>> {
    let mut fingerprint = Vec::new();
    if !root.exists() {
        return Ok(fingerprint);
    }

    let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];
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
            } else if file_type.is_file() {
                let checksum = hash_file(&path).await?;
                fingerprint.push(FileOverride {
                    path: relative_slash_path(root, &path),
                    checksum,
                });
            }
        }
    }

    fingerprint.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(fingerprint)
}

fn relative_slash_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fingerprint_covers_every_file_with_relative_paths() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("config/nested")).unwrap();
        std::fs::write(tmp.path().join("server.properties"), "motd=hi").unwrap();
        std::fs::write(tmp.path().join("config/nested/a.cfg"), "a=1").unwrap();

        let fingerprint = fingerprint_tree(tmp.path()).await.unwrap();
        let paths: Vec<_> = fingerprint.iter().map(|o| o.path.as_str()).collect();
        assert_eq!(paths, vec!["config/nested/a.cfg", "server.properties"]);
        for entry in &fingerprint {
            assert_eq!(entry.checksum.len(), 32);
        }
    }

    #[tokio::test]
    async fn identical_content_hashes_identically() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.txt"), "same").unwrap();
        std::fs::write(tmp.path().join("b.txt"), "same").unwrap();

        let fingerprint = fingerprint_tree(tmp.path()).await.unwrap();
        assert_eq!(fingerprint[0].checksum, fingerprint[1].checksum);
    }

    #[tokio::test]
    async fn missing_root_is_an_empty_fingerprint() {
        let tmp = tempfile::tempdir().unwrap();
        let fingerprint = fingerprint_tree(&tmp.path().join("overrides"))
            .await
            .unwrap();
        assert!(fingerprint.is_empty());
    }
}
