//! Filesystem object snapshots returned by list/info operations.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Kind of a filesystem node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FsoKind {
    File,
    Directory,
    Symlink,
    Other,
}

/// Snapshot of one filesystem entry.
///
/// Never updated in place once returned; a fresh query is required to
/// observe new state. Serialized to JSON for fact rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FsObject {
    pub path: PathBuf,
    pub kind: FsoKind,
    pub size: u64,
    /// Absolute target for symlinks, `None` otherwise.
    pub link_target: Option<PathBuf>,
}

impl FsObject {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn is_directory(&self) -> bool {
        matches!(self.kind, FsoKind::Directory)
    }
}
