// ─── Install Pipeline ───
// Orchestrates one installer run as a fixed, ordered sequence of steps:
// download → unpack → manifest → artifacts → prepare → loaders → mod list →
// overrides → persist. The installation record is threaded through the steps
// as an explicit accumulator; a failed run never writes it back, so a retry
// starts from the last successfully persisted state.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::Utc;
use tracing::{debug, error, info};

use super::step::{StepKind, StepResult, StepSequencer};
use crate::core::catalog::{CatalogSource, ResolvedVersion};
use crate::core::config::SyncConfig;
use crate::core::downloader::{DownloadEntry, Downloader};
use crate::core::error::{SyncError, SyncResult};
use crate::core::installation::{Installation, InstallationStore};
use crate::core::loaders::{install_mod_loaders, LoaderContext};
use crate::core::modlist::merge_mod_list;
use crate::core::overrides::OverrideReconciler;
use crate::core::pack::{unpack_archive, PackManifest};

pub struct InstallPipeline<C: CatalogSource> {
    config: SyncConfig,
    version: ResolvedVersion,
    catalog: C,
    downloader: Downloader,
    store: InstallationStore,
    /// Parsed once by the load-manifest step, read by everything after it.
    manifest: Option<PackManifest>,
}

impl<C: CatalogSource> InstallPipeline<C> {
    pub fn new(
        config: SyncConfig,
        version: ResolvedVersion,
        catalog: C,
        downloader: Downloader,
    ) -> Self {
        let store = InstallationStore::new(config.installation_file());
        Self {
            config,
            version,
            catalog,
            downloader,
            store,
            manifest: None,
        }
    }

    /// The fixed step order. Mode-specific steps are contributed between
    /// directory preparation and the mod-list merge.
    fn steps(&self) -> Vec<StepKind> {
        let mut steps = vec![
            StepKind::DownloadPack,
            StepKind::UnpackArchive,
            StepKind::LoadManifest,
            StepKind::FetchArtifacts,
            StepKind::PrepareDirectory,
        ];
        steps.extend(self.config.mode.contributed_steps());
        steps.extend([
            StepKind::MergeModList,
            StepKind::ReconcileOverrides,
            StepKind::SaveInstallation,
        ]);
        steps
    }

    /// Execute the full pipeline and return the newly persisted record.
    ///
    /// The precondition check runs once, before any step mutates anything.
    pub async fn execute(mut self) -> SyncResult<Installation> {
        let mut acc = match self.store.load().await? {
            Some(previous) => previous,
            None => Installation::new(
                self.config.project_id,
                &self.config.project_name,
                &self.config.game_version,
                self.config.side.is_server(),
                self.config.default_repository(),
            ),
        };
        self.config.mode.can_install(&self.config, &acc)?;

        let mut sequencer = StepSequencer::new();
        let mut first_error: Option<SyncError> = None;
        for kind in self.steps() {
            if !sequencer.should_run() {
                debug!("Step {} skipped.", kind);
                continue;
            }
            let fallback = acc.clone();
            match self.run_step(kind, acc).await {
                Ok((result, next)) => {
                    acc = next;
                    sequencer.record(result);
                }
                Err(e) => {
                    error!("Step {} failed: {}", kind, e);
                    acc = fallback;
                    sequencer.record(StepResult::Failure);
                    first_error = Some(e);
                }
            }
        }

        if sequencer.failed() {
            Err(first_error
                .unwrap_or_else(|| SyncError::Other("installation failed".into())))
        } else {
            Ok(acc)
        }
    }

    async fn run_step(
        &mut self,
        kind: StepKind,
        acc: Installation,
    ) -> SyncResult<(StepResult, Installation)> {
        match kind {
            StepKind::DownloadPack => self.download_pack(acc).await,
            StepKind::UnpackArchive => self.unpack_pack(acc).await,
            StepKind::LoadManifest => self.load_manifest(acc).await,
            StepKind::FetchArtifacts => self.fetch_artifacts(acc).await,
            StepKind::PrepareDirectory => self.prepare_directory(acc).await,
            StepKind::InstallLoaders => self.install_loaders(acc).await,
            StepKind::MergeModList => self.merge_mod_list(acc).await,
            StepKind::ReconcileOverrides => self.reconcile_overrides(acc).await,
            StepKind::SaveInstallation => self.save_installation(acc).await,
        }
    }

    fn manifest(&self) -> SyncResult<&PackManifest> {
        self.manifest
            .as_ref()
            .ok_or_else(|| SyncError::Other("pack manifest not loaded yet".into()))
    }

    // ── Steps ───────────────────────────────────────────

    /// Step 1: fetch the pack archive for the resolved version.
    ///
    /// A pre-existing unpack directory short-circuits the download and skips
    /// the unpack step with it. Unpack re-checks on its own, so the skip is
    /// an optimization kept for behavioral parity, not a requirement.
    async fn download_pack(&self, acc: Installation) -> SyncResult<(StepResult, Installation)> {
        info!(
            "Modpack file is classified as '{}'. Downloading...",
            self.version.name
        );
        let cache_dir = self.config.pack_cache_dir(self.version.id);
        if cache_dir.is_dir() {
            info!("Found existing pack directory, assuming equivalence. Skipping download.");
            return Ok((StepResult::SkipNext, acc));
        }

        let url = self
            .catalog
            .pack_download_url(&self.config.project_name, &self.version)
            .await?;
        self.downloader
            .download_file(&url, &self.config.pack_archive_path(self.version.id), None)
            .await?;
        Ok((StepResult::Success, acc))
    }

    /// Step 2: unpack the archive and delete it afterwards.
    async fn unpack_pack(&self, acc: Installation) -> SyncResult<(StepResult, Installation)> {
        info!("Unpacking modpack file...");
        let archive = self.config.pack_archive_path(self.version.id);
        let dest = self.config.pack_cache_dir(self.version.id);
        unpack_archive(&archive, &dest).await?;

        if archive.exists() {
            info!("Pack was successfully unpacked, deleting zip file...");
            if let Err(e) = tokio::fs::remove_file(&archive).await {
                tracing::warn!("Failed to delete zip file: {}", e);
            }
        }
        Ok((StepResult::Success, acc))
    }

    /// Step 3: parse the pack manifest. Fatal when missing or malformed.
    async fn load_manifest(&mut self, acc: Installation) -> SyncResult<(StepResult, Installation)> {
        info!("Loading pack manifest file...");
        let manifest = PackManifest::load(&self.config.pack_cache_dir(self.version.id)).await?;
        debug!("Successfully loaded pack manifest: {:?}", manifest);
        self.manifest = Some(manifest);
        Ok((StepResult::Success, acc))
    }

    /// Step 4: fetch every accepted artifact into the shared repository.
    ///
    /// Best effort: every artifact is attempted, failures are collected, and
    /// the step fails only after the full sweep, naming every failure.
    async fn fetch_artifacts(&self, acc: Installation) -> SyncResult<(StepResult, Installation)> {
        let manifest = self.manifest()?;
        info!(
            "Mod repository is located at '{}'.",
            acc.mod_repository.display()
        );
        info!("Downloading required mod files to repository...");

        let mut failing: Vec<u32> = Vec::new();
        let mut entries: Vec<DownloadEntry> = Vec::new();
        let mut projects_by_dest: HashMap<PathBuf, u32> = HashMap::new();
        for artifact in &manifest.mods {
            if !self.config.side.accepts(artifact) {
                info!(
                    "Mod with id {}, version {} is not required on this side, skipping file...",
                    artifact.project_id, artifact.file_id
                );
                continue;
            }
            let dest = acc.mod_repository.join(artifact.artifact_path("jar"));
            if dest.exists() {
                info!(
                    "Mod with id {}, version {} was already downloaded, skipping file...",
                    artifact.project_id, artifact.file_id
                );
                continue;
            }
            match self.catalog.artifact_download_url(artifact).await {
                Ok(Some(url)) => {
                    info!(
                        "Downloading file {} for mod with id {}",
                        artifact.file_id, artifact.project_id
                    );
                    projects_by_dest.insert(dest.clone(), artifact.project_id);
                    entries.push(DownloadEntry {
                        url,
                        dest,
                        sha1: None,
                    });
                }
                Ok(None) => {
                    error!(
                        "Could not resolve project id {}, skipping file...",
                        artifact.project_id
                    );
                    failing.push(artifact.project_id);
                }
                Err(e) => {
                    error!(
                        "Could not resolve download url for project id {}: {}",
                        artifact.project_id, e
                    );
                    failing.push(artifact.project_id);
                }
            }
        }

        for (entry, e) in self.downloader.download_batch(entries).await {
            error!("Failed to download '{}': {}", entry.url, e);
            if let Some(project_id) = projects_by_dest.get(&entry.dest) {
                failing.push(*project_id);
            }
        }

        if !failing.is_empty() {
            error!("Not all mods were successfully downloaded!");
            failing.sort_unstable();
            failing.dedup();
            return Err(SyncError::ArtifactsFailed(failing));
        }
        Ok((StepResult::Success, acc))
    }

    /// Step 5: prepare the output directory per mode strategy.
    async fn prepare_directory(&self, acc: Installation) -> SyncResult<(StepResult, Installation)> {
        info!("Starting installation, preparing output directory...");
        self.config.mode.prepare_directory(&self.config.output).await?;
        Ok((StepResult::Success, acc))
    }

    /// Step 6 (mode-contributed): install the pack's platform loader.
    async fn install_loaders(
        &self,
        mut acc: Installation,
    ) -> SyncResult<(StepResult, Installation)> {
        let manifest = self.manifest()?;
        let installer_dir = self.config.installer_cache_dir();
        let ctx = LoaderContext {
            game_version: &self.config.game_version,
            output: &self.config.output,
            installer_dir: &installer_dir,
            side: self.config.side,
            downloader: &self.downloader,
        };
        let installed = install_mod_loaders(
            &ctx,
            manifest,
            acc.forge_version.as_deref(),
            &acc.game_version,
        )
        .await?;
        if let Some(version) = installed {
            acc.forge_version = Some(version);
        }
        Ok((StepResult::Success, acc))
    }

    /// Step 7: create or update the dependency manifest.
    async fn merge_mod_list(&self, acc: Installation) -> SyncResult<(StepResult, Installation)> {
        let manifest = self.manifest()?;
        info!("Adding mods to mod list file...");
        let current: Vec<String> = manifest
            .mods
            .iter()
            .filter(|m| self.config.side.accepts(m))
            .map(|m| m.dependency_string())
            .collect();
        let policy = self
            .config
            .mode
            .merge_policy(acc.mods.as_deref(), self.config.side);
        let repository_root = acc.mod_repository.display().to_string();
        merge_mod_list(&self.config.output, &repository_root, &current, &policy).await?;
        Ok((StepResult::Success, acc))
    }

    /// Step 8: reconcile override files into the output directory.
    async fn reconcile_overrides(
        &self,
        mut acc: Installation,
    ) -> SyncResult<(StepResult, Installation)> {
        info!("Copying override files...");
        let source_root = self
            .config
            .pack_cache_dir(self.version.id)
            .join(&self.manifest()?.overrides_path);
        let reconciler = OverrideReconciler::new(
            &self.config.output,
            self.config.mode,
            self.config.fail_discrepancies,
        );
        let fingerprint = reconciler
            .reconcile(&source_root, acc.overrides.as_deref())
            .await?;
        acc.overrides = Some(fingerprint);
        Ok((StepResult::Success, acc))
    }

    /// Step 9: persist the new installation record, fully replacing the old
    /// one. Failing here is fatal even though all content work is done: the
    /// on-disk state is then ahead of the recorded state, and the next run
    /// re-derives it from the manifest instead of trusting the record.
    async fn save_installation(&self, acc: Installation) -> SyncResult<(StepResult, Installation)> {
        let manifest = self.manifest()?;
        let record = Installation {
            project_id: self.config.project_id,
            project_name: self.config.project_name.clone(),
            project_slug: self.config.project_slug(),
            game_version: self.config.game_version.clone(),
            server: self.config.side.is_server(),
            mod_repository: acc.mod_repository.clone(),
            last_file: Some(self.version.name.clone()),
            forge_version: acc.forge_version.clone(),
            mods: Some(manifest.mods.clone()),
            overrides: acc.overrides.clone(),
            updated_at: Utc::now(),
        };
        self.store.save(&record).await?;
        Ok((StepResult::Success, record))
    }
}
