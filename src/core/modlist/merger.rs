// ─── Mod-List Merger ───
// Updates the dependency manifest in the output directory to reflect the
// artifact set accepted for this run. A manifest belonging to a different
// installation is never rewritten; instead the merger walks (or creates) the
// parent chain until it finds the manifest with our repository root.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use super::model::{read_mod_list, write_mod_list, ModList, MOD_LIST_FILE, PACK_MOD_LIST_FILE};
use crate::core::error::{SyncError, SyncResult};

/// How the accepted artifact set is folded into an existing manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergePolicy {
    /// Clear and rewrite the full `modRef` list.
    Replace,
    /// Remove exactly the entries derived from the previous run's accepted
    /// set, then add the current set, leaving foreign entries untouched.
    Incremental { previous: Vec<String> },
}

/// Create or update the dependency manifest at the canonical location.
///
/// `current` is the dependency strings of all mods accepted by the side
/// filter this run; `repository_root` is the absolute artifact repository
/// path recorded in the manifest.
pub async fn merge_mod_list(
    output: &Path,
    repository_root: &str,
    current: &[String],
    policy: &MergePolicy,
) -> SyncResult<()> {
    let base = output.join(MOD_LIST_FILE);
    if !base.exists() {
        info!("Creating new mod list in mods directory...");
        let list = ModList {
            repository_root: repository_root.to_string(),
            mod_ref: current.to_vec(),
            parent_list: None,
        };
        return write_mod_list(&base, &list).await;
    }

    info!("There already is a mod list in the mods directory, adding new data...");
    let mut file = base;
    let mut visited: HashSet<PathBuf> = HashSet::new();
    loop {
        if !visited.insert(file.clone()) {
            error!(
                "Mod list parent chain loops back to '{}', aborting!",
                file.display()
            );
            return Err(SyncError::ModListCycle(file));
        }

        let mut list = read_mod_list(&file).await?;
        if list.repository_root == repository_root {
            info!("Found mod list file with correct repository root, merging mods...");
            apply_policy(&mut list.mod_ref, current, policy);
            return write_mod_list(&file, &list).await;
        }

        match list.parent_list.clone() {
            None => {
                info!("Found mod list with different repository root but without parent, adding parent...");
                let parent = output.join(PACK_MOD_LIST_FILE);
                let synthesized = ModList {
                    repository_root: repository_root.to_string(),
                    mod_ref: current.to_vec(),
                    parent_list: None,
                };
                write_mod_list(&parent, &synthesized).await?;
                list.parent_list = Some(format!("absolute:{}", parent.display()));
                return write_mod_list(&file, &list).await;
            }
            Some(reference) => {
                info!("Found mod list file with different repository root and parent file, analyzing parent file...");
                file = resolve_parent_reference(output, &reference);
            }
        }
    }
}

/// `absolute:`-prefixed references are filesystem paths; everything else is
/// relative to the output directory.
fn resolve_parent_reference(output: &Path, reference: &str) -> PathBuf {
    match reference.strip_prefix("absolute:") {
        Some(absolute) => PathBuf::from(absolute),
        None => output.join(reference),
    }
}

fn apply_policy(entries: &mut Vec<String>, current: &[String], policy: &MergePolicy) {
    match policy {
        MergePolicy::Replace => {
            info!("Mod List Merge Strategy: Overwrite old mods");
            entries.clear();
            entries.extend(current.iter().cloned());
        }
        MergePolicy::Incremental { previous } => {
            info!("Mod List Merge Strategy: Remove old mods, add new ones");
            entries.retain(|entry| !previous.contains(entry));
            for entry in current {
                if !entries.contains(entry) {
                    entries.push(entry.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn synthesizes_a_manifest_when_none_exists() {
        let tmp = tempfile::tempdir().unwrap();
        let current = strings(&["mc:mod1:10", "mc:mod2:20"]);

        merge_mod_list(tmp.path(), "/repo", &current, &MergePolicy::Replace)
            .await
            .unwrap();

        let list = read_mod_list(&tmp.path().join(MOD_LIST_FILE)).await.unwrap();
        assert_eq!(list.repository_root, "/repo");
        assert_eq!(list.mod_ref, current);
        assert!(list.parent_list.is_none());
    }

    #[tokio::test]
    async fn replace_rewrites_a_matching_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join(MOD_LIST_FILE);
        write_mod_list(
            &base,
            &ModList {
                repository_root: "/repo".into(),
                mod_ref: strings(&["mc:mod9:1"]),
                parent_list: None,
            },
        )
        .await
        .unwrap();

        merge_mod_list(
            tmp.path(),
            "/repo",
            &strings(&["mc:mod1:10"]),
            &MergePolicy::Replace,
        )
        .await
        .unwrap();

        let list = read_mod_list(&base).await.unwrap();
        assert_eq!(list.mod_ref, strings(&["mc:mod1:10"]));
    }

    #[tokio::test]
    async fn incremental_merge_keeps_foreign_entries() {
        // Previous accepted set {X, Y}, new accepted set {Y, Z}, foreign W.
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join(MOD_LIST_FILE);
        write_mod_list(
            &base,
            &ModList {
                repository_root: "/repo".into(),
                mod_ref: strings(&["mc:x:1", "mc:w:7", "mc:y:2"]),
                parent_list: None,
            },
        )
        .await
        .unwrap();

        let policy = MergePolicy::Incremental {
            previous: strings(&["mc:x:1", "mc:y:2"]),
        };
        merge_mod_list(tmp.path(), "/repo", &strings(&["mc:y:2", "mc:z:3"]), &policy)
            .await
            .unwrap();

        let list = read_mod_list(&base).await.unwrap();
        assert!(list.mod_ref.contains(&"mc:y:2".to_string()));
        assert!(list.mod_ref.contains(&"mc:z:3".to_string()));
        assert!(list.mod_ref.contains(&"mc:w:7".to_string()));
        assert!(!list.mod_ref.contains(&"mc:x:1".to_string()));
    }

    #[tokio::test]
    async fn incremental_merge_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join(MOD_LIST_FILE);
        let current = strings(&["mc:y:2", "mc:z:3"]);
        write_mod_list(
            &base,
            &ModList {
                repository_root: "/repo".into(),
                mod_ref: current.clone(),
                parent_list: None,
            },
        )
        .await
        .unwrap();

        let policy = MergePolicy::Incremental {
            previous: current.clone(),
        };
        merge_mod_list(tmp.path(), "/repo", &current, &policy).await.unwrap();
        merge_mod_list(tmp.path(), "/repo", &current, &policy).await.unwrap();

        let list = read_mod_list(&base).await.unwrap();
        assert_eq!(list.mod_ref, current);
    }

    #[tokio::test]
    async fn foreign_manifest_gains_a_synthesized_parent() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join(MOD_LIST_FILE);
        write_mod_list(
            &base,
            &ModList {
                repository_root: "/other-tool".into(),
                mod_ref: strings(&["mc:foreign:1"]),
                parent_list: None,
            },
        )
        .await
        .unwrap();

        merge_mod_list(
            tmp.path(),
            "/repo",
            &strings(&["mc:mod1:10"]),
            &MergePolicy::Replace,
        )
        .await
        .unwrap();

        // Original manifest untouched apart from the new parent link.
        let foreign = read_mod_list(&base).await.unwrap();
        assert_eq!(foreign.mod_ref, strings(&["mc:foreign:1"]));
        let parent_ref = foreign.parent_list.unwrap();
        assert!(parent_ref.starts_with("absolute:"));

        let parent = read_mod_list(&tmp.path().join(PACK_MOD_LIST_FILE))
            .await
            .unwrap();
        assert_eq!(parent.repository_root, "/repo");
        assert_eq!(parent.mod_ref, strings(&["mc:mod1:10"]));
    }

    #[tokio::test]
    async fn follows_the_parent_chain_to_the_matching_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        write_mod_list(
            &tmp.path().join(MOD_LIST_FILE),
            &ModList {
                repository_root: "/other-tool".into(),
                mod_ref: strings(&["mc:foreign:1"]),
                parent_list: Some("mods/mod_list_pack.json".into()),
            },
        )
        .await
        .unwrap();
        write_mod_list(
            &tmp.path().join(PACK_MOD_LIST_FILE),
            &ModList {
                repository_root: "/repo".into(),
                mod_ref: strings(&["mc:old:1"]),
                parent_list: None,
            },
        )
        .await
        .unwrap();

        merge_mod_list(
            tmp.path(),
            "/repo",
            &strings(&["mc:new:2"]),
            &MergePolicy::Replace,
        )
        .await
        .unwrap();

        let parent = read_mod_list(&tmp.path().join(PACK_MOD_LIST_FILE))
            .await
            .unwrap();
        assert_eq!(parent.mod_ref, strings(&["mc:new:2"]));
    }

    #[tokio::test]
    async fn cyclic_parent_chain_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        write_mod_list(
            &tmp.path().join(MOD_LIST_FILE),
            &ModList {
                repository_root: "/a".into(),
                mod_ref: vec![],
                parent_list: Some("mods/mod_list_pack.json".into()),
            },
        )
        .await
        .unwrap();
        write_mod_list(
            &tmp.path().join(PACK_MOD_LIST_FILE),
            &ModList {
                repository_root: "/b".into(),
                mod_ref: vec![],
                parent_list: Some("mods/mod_list.json".into()),
            },
        )
        .await
        .unwrap();

        let err = merge_mod_list(tmp.path(), "/repo", &[], &MergePolicy::Replace)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::ModListCycle(_)));
    }
}
