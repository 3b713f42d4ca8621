// ─── Mode Strategies ───
// The installation mode is picked once at configuration time and fixes four
// policy hooks for the whole run: the can-install precondition, directory
// preparation, the mod-list merge policy and the old-checksum validation.
// One closed enum, no dynamic dispatch.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::core::config::{Side, SyncConfig};
use crate::core::error::{SyncError, SyncResult};
use crate::core::installation::Installation;
use crate::core::installer::step::StepKind;
use crate::core::modlist::MergePolicy;
use crate::core::overrides::{hash_file, FileOverride};
use crate::core::pack::Mod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// First-time install; refuses to touch a directory that already holds
    /// an installation.
    Install,
    /// Wipe the output directory and install from scratch.
    Overwrite,
    /// Incremental update against the previous run's recorded state.
    Update,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Install => write!(f, "install"),
            Mode::Overwrite => write!(f, "overwrite"),
            Mode::Update => write!(f, "update"),
        }
    }
}

impl Mode {
    /// Precondition, checked once before any mutation.
    ///
    /// Every mode enforces the side invariant: the directory's recorded side
    /// must match the current configuration.
    pub fn can_install(&self, config: &SyncConfig, installation: &Installation) -> SyncResult<()> {
        if config.side.is_server() != installation.server {
            error!("The existing installation in the output directory is for a different side than the current configuration, aborting!");
            return Err(SyncError::SideMismatch);
        }
        if matches!(self, Mode::Install) && installation.is_installed() {
            error!("Could not install modpack because there already was an installation in the desired output directory!");
            return Err(SyncError::AlreadyInstalled);
        }
        Ok(())
    }

    /// Put the output directory into the state this mode starts from.
    pub async fn prepare_directory(&self, output: &Path) -> SyncResult<()> {
        if matches!(self, Mode::Overwrite) && output.exists() {
            info!("Clearing output directory...");
            tokio::fs::remove_dir_all(output)
                .await
                .map_err(|e| SyncError::io(output, e))?;
        }
        tokio::fs::create_dir_all(output)
            .await
            .map_err(|e| SyncError::io(output, e))
    }

    /// Steps this mode contributes between directory preparation and the
    /// mod-list merge. All modes install the platform loader.
    pub fn contributed_steps(&self) -> Vec<StepKind> {
        vec![StepKind::InstallLoaders]
    }

    /// How the accepted artifact set is folded into an existing mod list.
    ///
    /// Update diffs against the previous run's accepted set; with no
    /// recorded set it falls back to a full replace.
    pub fn merge_policy(&self, previous_mods: Option<&[Mod]>, side: Side) -> MergePolicy {
        match self {
            Mode::Install | Mode::Overwrite => MergePolicy::Replace,
            Mode::Update => match previous_mods {
                Some(mods) => MergePolicy::Incremental {
                    previous: mods
                        .iter()
                        .filter(|m| side.accepts(m))
                        .map(Mod::dependency_string)
                        .collect(),
                },
                None => MergePolicy::Replace,
            },
        }
    }

    /// Compare every previously recorded override checksum against the file
    /// currently on disk. Only Update mode inspects anything; the other
    /// modes have no previous generation worth validating.
    ///
    /// Discrepancies are warnings unless `strict` is set, in which case any
    /// of them fails the run before destructive work starts.
    pub async fn validate_old_checksums(
        &self,
        output: &Path,
        previous: Option<&[FileOverride]>,
        strict: bool,
    ) -> SyncResult<()> {
        if !matches!(self, Mode::Update) {
            return Ok(());
        }
        let Some(previous) = previous else {
            return Ok(());
        };

        let mut discrepancies = 0usize;
        for recorded in previous {
            let target = output.join(&recorded.path);
            if !target.exists() {
                warn!(
                    "Expected file '{}' does not exist, can't calculate checksum!",
                    target.display()
                );
                discrepancies += 1;
                continue;
            }
            match hash_file(&target).await {
                Ok(current) if current == recorded.checksum => {}
                Ok(current) => {
                    warn!(
                        "Found discrepancies between existing file '{}' and its last known checksum!",
                        target.display()
                    );
                    warn!(" - Stored Checksum: {}", recorded.checksum);
                    warn!(" - Calculated Checksum: {}", current);
                    discrepancies += 1;
                }
                Err(e) => {
                    warn!(
                        "Failed to calculate checksum of file '{}': {}",
                        target.display(),
                        e
                    );
                    discrepancies += 1;
                }
            }
        }

        if discrepancies > 0 {
            if strict {
                error!("There appear to be discrepancies between the installation's last known state and the actual data.");
                error!("Please fix the listed discrepancies manually!");
                return Err(SyncError::Discrepancies(discrepancies));
            }
            warn!(
                "{} discrepancies between the recorded installation state and the files on disk.",
                discrepancies
            );
        }
        Ok(())
    }
}
