use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the entire sync engine.
/// Every module returns `Result<T, SyncError>`.
#[derive(Debug, Error)]
pub enum SyncError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("Download of {url} gave up after {attempts} attempts")]
    DownloadExhausted { url: String, attempts: u32 },

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("{0} discrepancies between the recorded installation state and the files on disk")]
    Discrepancies(usize),

    // ── Pack ────────────────────────────────────────────
    #[error("Pack manifest not found at {0:?}")]
    ManifestMissing(PathBuf),

    #[error("Pack manifest at {path:?} is malformed: {source}")]
    ManifestParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    // ── Artifacts ───────────────────────────────────────
    #[error("Failed to fetch artifacts for projects {0:?}")]
    ArtifactsFailed(Vec<u32>),

    // ── Mod list ────────────────────────────────────────
    #[error("Mod list at {path:?} is malformed: {source}")]
    ModListParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Mod list parent chain loops back to {0:?}")]
    ModListCycle(PathBuf),

    // ── Preconditions ───────────────────────────────────
    #[error("An installation already exists in the output directory")]
    AlreadyInstalled,

    #[error("The existing installation is for a different side than the current configuration")]
    SideMismatch,

    // ── Loader ──────────────────────────────────────────
    #[error("Loader error: {0}")]
    Loader(String),

    // ── Overrides ───────────────────────────────────────
    #[error("Failed to delete obsolete override files: {0:?}")]
    ObsoleteNotDeleted(Vec<String>),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type SyncResult<T> = Result<T, SyncError>;

impl From<std::io::Error> for SyncError {
    fn from(source: std::io::Error) -> Self {
        SyncError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl SyncError {
    /// Attach a path to a raw IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }
}
