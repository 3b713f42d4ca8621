pub mod fingerprint;
pub mod reconciler;

pub use fingerprint::{fingerprint_tree, hash_file, FileOverride};
pub use reconciler::OverrideReconciler;
