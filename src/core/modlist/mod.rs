pub mod merger;
pub mod model;

pub use merger::{merge_mod_list, MergePolicy};
pub use model::{read_mod_list, write_mod_list, ModList, MOD_LIST_FILE, PACK_MOD_LIST_FILE};
