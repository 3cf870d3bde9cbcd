//! Non-mutating metadata probes behind the channel's read-only kinds.
//!
//! These helpers answer `list`, `info`, and `resolve-link` units without
//! shelling out. All of them observe a snapshot; callers re-query to see
//! new state.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::types::{FsObject, FsoKind};

fn kind_of(md: &fs::Metadata) -> FsoKind {
    let ft = md.file_type();
    if ft.is_symlink() {
        FsoKind::Symlink
    } else if ft.is_file() {
        FsoKind::File
    } else if ft.is_dir() {
        FsoKind::Directory
    } else {
        FsoKind::Other
    }
}

/// If `path` is a symlink, resolve its target to an absolute path.
/// Relative links are resolved relative to the parent directory of `path`.
fn read_link_abs(path: &Path) -> Option<PathBuf> {
    let md = fs::symlink_metadata(path).ok()?;
    if !md.file_type().is_symlink() {
        return None;
    }
    let mut link = fs::read_link(path).ok()?;
    if link.is_relative() {
        if let Some(parent) = path.parent() {
            link = parent.join(link);
        }
    }
    Some(link)
}

/// Describe one entry. `follow` resolves a trailing symlink and describes
/// its target; otherwise the link itself is described.
///
/// # Errors
///
/// Propagates the underlying metadata error (`NotFound` for missing paths).
pub fn stat_fso(path: &Path, follow: bool) -> io::Result<FsObject> {
    let md = if follow {
        fs::metadata(path)?
    } else {
        fs::symlink_metadata(path)?
    };
    let kind = kind_of(&md);
    let link_target = if kind == FsoKind::Symlink {
        read_link_abs(path)
    } else {
        None
    };
    Ok(FsObject {
        path: path.to_path_buf(),
        kind,
        size: md.len(),
        link_target,
    })
}

/// List one directory, non-recursive. Entries are described without
/// following symlinks; entries that vanish mid-walk are skipped.
///
/// # Errors
///
/// Propagates the error opening or iterating the directory.
pub fn list_dir(dir: &Path) -> io::Result<Vec<FsObject>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        match stat_fso(&entry.path(), false) {
            Ok(fso) => out.push(fso),
            Err(_) => continue,
        }
    }
    Ok(out)
}

/// Resolve a symlink and describe its target.
///
/// # Errors
///
/// `NotFound` if the link is missing or dangling; `InvalidInput` if the
/// path is not a symlink.
pub fn resolve_link(path: &Path) -> io::Result<FsObject> {
    let md = fs::symlink_metadata(path)?;
    if !md.file_type().is_symlink() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a symbolic link",
        ));
    }
    let mut target = fs::read_link(path)?;
    if target.is_relative() {
        if let Some(parent) = path.parent() {
            target = parent.join(target);
        }
    }
    stat_fso(&target, false)
}
