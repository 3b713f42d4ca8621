// ─── Forge Installer ───
// Installs Forge by downloading the official installer JAR. On the server
// side the installer is executed with `--installServer` in the output
// directory; on the client side it is only downloaded, since the graphical
// installer has to be run by the user.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{error, info};

use super::LoaderContext;
use crate::core::config::Side;
use crate::core::error::{SyncError, SyncResult};

const FORGE_MAVEN: &str = "https://files.minecraftforge.net/maven";

pub struct ForgeInstaller;

impl ForgeInstaller {
    /// Extract the Forge version from a manifest loader id, e.g.
    /// `forge-12.18.3.2254` → `12.18.3.2254`.
    pub fn version_from_id(id: &str) -> SyncResult<&str> {
        id.split_once('-')
            .map(|(_, version)| version)
            .filter(|version| !version.is_empty())
            .ok_or_else(|| SyncError::Loader(format!("malformed loader id '{}'", id)))
    }

    pub async fn install(
        &self,
        ctx: &LoaderContext<'_>,
        version: &str,
        previous_forge: Option<&str>,
        previous_game_version: &str,
    ) -> SyncResult<()> {
        match ctx.side {
            Side::Client => self.install_client(ctx, version).await,
            Side::Server => {
                self.install_server(ctx, version, previous_forge, previous_game_version)
                    .await
            }
        }
    }

    async fn download_installer(
        &self,
        ctx: &LoaderContext<'_>,
        version: &str,
    ) -> SyncResult<PathBuf> {
        let full_version = format!("{}-{}", ctx.game_version, version);
        let url = format!(
            "{}/net/minecraftforge/forge/{}/forge-{}-installer.jar",
            FORGE_MAVEN, full_version, full_version
        );
        let installer_path = ctx.installer_dir.join(format!("forge-{}.jar", version));
        ctx.downloader
            .download_file(&url, &installer_path, None)
            .await?;
        Ok(installer_path)
    }

    async fn install_client(&self, ctx: &LoaderContext<'_>, version: &str) -> SyncResult<()> {
        info!("Automatic installation of Forge on the client is not supported yet, will download installer though...");
        info!("Downloading Forge client installer v{}...", version);
        let installer_path = self.download_installer(ctx, version).await?;
        info!(
            "Downloaded Forge client installer to '{}', please invoke it manually to install Forge!",
            installer_path.display()
        );
        Ok(())
    }

    async fn install_server(
        &self,
        ctx: &LoaderContext<'_>,
        version: &str,
        previous_forge: Option<&str>,
        previous_game_version: &str,
    ) -> SyncResult<()> {
        // Clear leftovers from an older loader or game version before the
        // new installer writes next to them.
        if let Some(previous) = previous_forge {
            if previous != version {
                let old_universal = ctx.output.join(format!(
                    "forge-{}-{}-universal.jar",
                    previous_game_version, previous
                ));
                if old_universal.exists() {
                    info!(
                        "Installed Forge version {} is outdated, deleting old files...",
                        previous
                    );
                    tokio::fs::remove_file(&old_universal)
                        .await
                        .map_err(|e| SyncError::io(&old_universal, e))?;
                }
            }
        }
        if previous_game_version != ctx.game_version {
            let old_server = ctx
                .output
                .join(format!("minecraft_server.{}.jar", previous_game_version));
            if old_server.exists() {
                info!(
                    "Installed server version {} is outdated, deleting old files...",
                    previous_game_version
                );
                tokio::fs::remove_file(&old_server)
                    .await
                    .map_err(|e| SyncError::io(&old_server, e))?;
            }
        }

        let full_version = format!("{}-{}", ctx.game_version, version);
        let universal = ctx
            .output
            .join(format!("forge-{}-universal.jar", full_version));
        if universal.exists() {
            info!("Forge v{} already seems to be installed, skipping setup...", version);
            return Ok(());
        }

        info!("Downloading Forge server installer v{}...", version);
        let installer_path = self.download_installer(ctx, version).await?;

        info!("Invoking Forge server installation...");
        run_installer_process(&installer_path, ctx.output).await
    }
}

/// Run the platform installer as an external process with the output
/// directory as its working directory, forwarding its output line by line.
/// Only the exit code decides success.
async fn run_installer_process(installer: &Path, working_dir: &Path) -> SyncResult<()> {
    let mut child = Command::new("java")
        .arg("-jar")
        .arg(installer)
        .arg("--installServer")
        .current_dir(working_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| SyncError::Loader(format!("failed to spawn installer process: {}", e)))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let out_pump = tokio::spawn(pump_lines(stdout, false));
    let err_pump = tokio::spawn(pump_lines(stderr, true));

    let status = child
        .wait()
        .await
        .map_err(|e| SyncError::Loader(format!("installer process failed: {}", e)))?;
    let _ = out_pump.await;
    let _ = err_pump.await;

    if status.success() {
        Ok(())
    } else {
        Err(SyncError::Loader(format!(
            "installer process exited with {}",
            status
        )))
    }
}

async fn pump_lines<R>(reader: Option<R>, is_err: bool)
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else { return };
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if is_err {
            error!("{}", line);
        } else {
            info!("{}", line);
        }
    }
}
