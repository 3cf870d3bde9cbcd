//! Executable units: single-use descriptions of one channel operation.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::fso::FsObject;
use super::mount::{MountMode, MountPoint};

/// One operation for a channel to perform.
///
/// A unit is immutable after construction and consumed exactly once per
/// `Channel::run`; its result is the value the run returns. The associated
/// constructors below are the operation factory of the crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecUnit {
    DeleteFile { path: PathBuf },
    DeleteDir { path: PathBuf },
    CreateFile { path: PathBuf },
    CreateDir { path: PathBuf },
    CreateLink { target: PathBuf, link: PathBuf },
    Move { src: PathBuf, dst: PathBuf },
    Copy { src: PathBuf, dst: PathBuf },
    ChangePerms { path: PathBuf, mode: u32 },
    List { dir: PathBuf },
    Info { path: PathBuf, follow_symlinks: bool },
    ResolveLink { path: PathBuf },
    Remount { mount: MountPoint, mode: MountMode },
}

impl ExecUnit {
    #[must_use]
    pub fn delete_file(path: impl Into<PathBuf>) -> Self {
        ExecUnit::DeleteFile { path: path.into() }
    }

    #[must_use]
    pub fn delete_dir(path: impl Into<PathBuf>) -> Self {
        ExecUnit::DeleteDir { path: path.into() }
    }

    #[must_use]
    pub fn create_file(path: impl Into<PathBuf>) -> Self {
        ExecUnit::CreateFile { path: path.into() }
    }

    #[must_use]
    pub fn create_dir(path: impl Into<PathBuf>) -> Self {
        ExecUnit::CreateDir { path: path.into() }
    }

    /// Create a symbolic link at `link` pointing to `target`.
    #[must_use]
    pub fn create_link(target: impl Into<PathBuf>, link: impl Into<PathBuf>) -> Self {
        ExecUnit::CreateLink {
            target: target.into(),
            link: link.into(),
        }
    }

    #[must_use]
    pub fn move_entry(src: impl Into<PathBuf>, dst: impl Into<PathBuf>) -> Self {
        ExecUnit::Move {
            src: src.into(),
            dst: dst.into(),
        }
    }

    #[must_use]
    pub fn copy_entry(src: impl Into<PathBuf>, dst: impl Into<PathBuf>) -> Self {
        ExecUnit::Copy {
            src: src.into(),
            dst: dst.into(),
        }
    }

    /// Change permission bits to the octal `mode`.
    #[must_use]
    pub fn change_perms(path: impl Into<PathBuf>, mode: u32) -> Self {
        ExecUnit::ChangePerms {
            path: path.into(),
            mode,
        }
    }

    #[must_use]
    pub fn list(dir: impl Into<PathBuf>) -> Self {
        ExecUnit::List { dir: dir.into() }
    }

    /// Describe one entry. `follow_symlinks` resolves a trailing symlink
    /// and describes its target instead of the link itself.
    #[must_use]
    pub fn info(path: impl Into<PathBuf>, follow_symlinks: bool) -> Self {
        ExecUnit::Info {
            path: path.into(),
            follow_symlinks,
        }
    }

    #[must_use]
    pub fn resolve_link(path: impl Into<PathBuf>) -> Self {
        ExecUnit::ResolveLink { path: path.into() }
    }

    /// Remount `mount` in the given mode. Built by the writable guard as
    /// its auxiliary steps; also usable directly for explicit remounts.
    #[must_use]
    pub fn remount(mount: MountPoint, mode: MountMode) -> Self {
        ExecUnit::Remount { mount, mode }
    }

    /// Short kind label used in logs and error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            ExecUnit::DeleteFile { .. } => "delete-file",
            ExecUnit::DeleteDir { .. } => "delete-dir",
            ExecUnit::CreateFile { .. } => "create-file",
            ExecUnit::CreateDir { .. } => "create-dir",
            ExecUnit::CreateLink { .. } => "create-link",
            ExecUnit::Move { .. } => "move",
            ExecUnit::Copy { .. } => "copy",
            ExecUnit::ChangePerms { .. } => "change-perms",
            ExecUnit::List { .. } => "list",
            ExecUnit::Info { .. } => "info",
            ExecUnit::ResolveLink { .. } => "resolve-link",
            ExecUnit::Remount { .. } => "remount",
        }
    }

    /// The path whose mount must be writable, for mutating kinds.
    ///
    /// `None` for read-only kinds and for `Remount` itself, which is never
    /// re-guarded.
    #[must_use]
    pub fn write_target(&self) -> Option<&Path> {
        match self {
            ExecUnit::DeleteFile { path }
            | ExecUnit::DeleteDir { path }
            | ExecUnit::CreateFile { path }
            | ExecUnit::CreateDir { path }
            | ExecUnit::ChangePerms { path, .. } => Some(path),
            ExecUnit::CreateLink { link, .. } => Some(link),
            ExecUnit::Move { dst, .. } | ExecUnit::Copy { dst, .. } => Some(dst),
            ExecUnit::List { .. }
            | ExecUnit::Info { .. }
            | ExecUnit::ResolveLink { .. }
            | ExecUnit::Remount { .. } => None,
        }
    }

    /// Primary path of the unit, for display and fact envelopes.
    #[must_use]
    pub fn target(&self) -> &Path {
        match self {
            ExecUnit::DeleteFile { path }
            | ExecUnit::DeleteDir { path }
            | ExecUnit::CreateFile { path }
            | ExecUnit::CreateDir { path }
            | ExecUnit::ChangePerms { path, .. }
            | ExecUnit::Info { path, .. }
            | ExecUnit::ResolveLink { path } => path,
            ExecUnit::CreateLink { link, .. } => link,
            ExecUnit::Move { src, .. } | ExecUnit::Copy { src, .. } => src,
            ExecUnit::List { dir } => dir,
            ExecUnit::Remount { mount, .. } => &mount.path,
        }
    }
}

/// A mutating unit plus the mount it needs writable.
///
/// The mount is resolved from the registry when the writable unit is built.
/// `mount: None` means the target matched no table entry; the run proceeds
/// without remounting but forfeits the automatic guard.
#[derive(Debug, Clone)]
pub struct WritableUnit {
    pub unit: ExecUnit,
    pub mount: Option<MountPoint>,
}

impl WritableUnit {
    #[must_use]
    pub fn new(unit: ExecUnit, mount: Option<MountPoint>) -> Self {
        Self { unit, mount }
    }
}

/// Typed result of one successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutput {
    /// The operation completed and produces no value.
    Done,
    /// Directory listing, one snapshot per entry.
    Listing(Vec<FsObject>),
    /// Snapshot of a single entry.
    Entry(FsObject),
}

/// Ordered set of entries submitted for one deletion run.
///
/// Reordered internally before execution; the snapshots themselves are
/// never mutated.
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    pub items: Vec<FsObject>,
}

impl BatchRequest {
    #[must_use]
    pub fn new(items: Vec<FsObject>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
