pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::catalog::{CatalogSource, RemoteCatalog, ResolvedVersion};
pub use crate::core::config::{Side, SyncConfig};
pub use crate::core::error::{SyncError, SyncResult};
pub use crate::core::installer::InstallPipeline;
pub use crate::core::mode::Mode;

/// Initialize structured logging for embedding binaries.
///
/// Honors `RUST_LOG`; defaults to info with debug output for this crate.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,packsync=debug")),
        )
        .init();
}
