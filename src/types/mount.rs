//! Plain mount-point data shared by the registry, the guard, and policy.

use serde::Serialize;
use std::path::PathBuf;

/// Read/write mode of a mounted filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MountMode {
    ReadOnly,
    ReadWrite,
}

impl MountMode {
    /// The mount option string for this mode (`ro` / `rw`).
    #[must_use]
    pub const fn as_option(self) -> &'static str {
        match self {
            MountMode::ReadOnly => "ro",
            MountMode::ReadWrite => "rw",
        }
    }
}

/// One entry of the mount table.
///
/// Read-mostly: the `mode` observed here reflects the table at query time
/// and is only changed on disk by a successful remount unit. Re-query the
/// registry to observe post-remount state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountPoint {
    /// Device or source the filesystem is mounted from.
    pub device: String,
    /// Mount path.
    pub path: PathBuf,
    /// Filesystem type as reported by the table.
    pub fstype: String,
    /// Current read/write mode.
    pub mode: MountMode,
    /// Whether policy permits remounting this entry at all.
    pub remount_allowed: bool,
}
