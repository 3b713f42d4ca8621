pub mod archive;
pub mod manifest;

pub use archive::unpack_archive;
pub use manifest::{GameInfo, Mod, ModLoader, PackManifest};
