pub mod meta;
pub mod mounts;

pub use meta::{list_dir, resolve_link, stat_fso};
pub use mounts::{MountRegistry, ProcMountRegistry};
