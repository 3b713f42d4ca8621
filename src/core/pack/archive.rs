// ─── Pack Archive ───
// Extraction of the downloaded pack zip into its deterministic cache
// directory. A pre-existing directory is treated as already unpacked, even if
// a prior run crashed halfway through it.

use std::io;
use std::path::Path;

use tracing::{debug, info};

use crate::core::error::{SyncError, SyncResult};

/// Extract `archive_path` into `dest`.
///
/// Returns without touching anything when `dest` already exists.
pub async fn unpack_archive(archive_path: &Path, dest: &Path) -> SyncResult<()> {
    if dest.exists() {
        info!("Pack folder already exists, assuming equivalence. Skipping unpacking.");
        return Ok(());
    }

    tokio::fs::create_dir_all(dest)
        .await
        .map_err(|e| SyncError::io(dest, e))?;

    let file = std::fs::File::open(archive_path).map_err(|e| SyncError::io(archive_path, e))?;
    let mut archive = zip::ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        // Entries with absolute or traversal paths are silently dropped.
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let target = dest.join(relative);
        debug!(
            "Unpacking: {} '{}'",
            if entry.is_dir() { "Directory" } else { "File" },
            entry.name()
        );

        if entry.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| SyncError::io(&target, e))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SyncError::io(parent, e))?;
        }
        let mut out = std::fs::File::create(&target).map_err(|e| SyncError::io(&target, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| SyncError::io(&target, e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn build_zip(path: &Path) {
        let file = std::fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.add_directory("config", options).unwrap();
        writer.start_file("manifest.json", options).unwrap();
        writer.write_all(b"{}").unwrap();
        writer.start_file("config/settings.cfg", options).unwrap();
        writer.write_all(b"enabled=true").unwrap();
        writer.finish().unwrap();
    }

    #[tokio::test]
    async fn unpacks_nested_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("pack.zip");
        build_zip(&archive);

        let dest = tmp.path().join("unpacked");
        unpack_archive(&archive, &dest).await.unwrap();

        assert_eq!(std::fs::read_to_string(dest.join("manifest.json")).unwrap(), "{}");
        assert_eq!(
            std::fs::read_to_string(dest.join("config/settings.cfg")).unwrap(),
            "enabled=true"
        );
    }

    #[tokio::test]
    async fn existing_destination_is_left_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("unpacked");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("keep.txt"), "local").unwrap();

        // No archive on disk at all: the short-circuit must win.
        unpack_archive(&tmp.path().join("missing.zip"), &dest)
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(dest.join("keep.txt")).unwrap(), "local");
    }
}
