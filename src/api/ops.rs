//! Per-operation convenience wrappers over the broker entry points.
//!
//! One method per catalog kind: each builds the unit, dispatches through
//! the right entry point (mutating kinds through the writable guard), and
//! extracts the expected output shape.

use std::path::Path;

use crate::logging::{AuditSink, FactsEmitter};
use crate::types::{ExecError, ExecUnit, FsObject, MountPoint, UnitOutput};

use super::Drawbridge;

fn expect_done(out: UnitOutput) -> Result<(), ExecError> {
    match out {
        UnitOutput::Done => Ok(()),
        other => Err(wrong_shape(&other)),
    }
}

fn expect_listing(out: UnitOutput) -> Result<Vec<FsObject>, ExecError> {
    match out {
        UnitOutput::Listing(entries) => Ok(entries),
        other => Err(wrong_shape(&other)),
    }
}

fn expect_entry(out: UnitOutput) -> Result<FsObject, ExecError> {
    match out {
        UnitOutput::Entry(fso) => Ok(fso),
        other => Err(wrong_shape(&other)),
    }
}

fn wrong_shape(out: &UnitOutput) -> ExecError {
    ExecError::ExecutionFailed(format!("channel returned the wrong result shape: {out:?}"))
}

impl<E: FactsEmitter, A: AuditSink> Drawbridge<E, A> {
    /// Create an empty file.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the run; an elevation failure
    /// carries the steps owed to [`Drawbridge::replay`].
    pub fn create_file(&self, path: &Path) -> Result<(), ExecError> {
        self.writable_execute(self.writable(ExecUnit::create_file(path)))
            .and_then(expect_done)
    }

    /// Create a directory.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the run.
    pub fn create_dir(&self, path: &Path) -> Result<(), ExecError> {
        self.writable_execute(self.writable(ExecUnit::create_dir(path)))
            .and_then(expect_done)
    }

    /// Create a symbolic link at `link` pointing to `target`.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the run.
    pub fn create_link(&self, target: &Path, link: &Path) -> Result<(), ExecError> {
        self.writable_execute(self.writable(ExecUnit::create_link(target, link)))
            .and_then(expect_done)
    }

    /// Delete a non-directory entry.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing path, or any other classified
    /// failure of the run.
    pub fn delete_file(&self, path: &Path) -> Result<(), ExecError> {
        self.writable_execute(self.writable(ExecUnit::delete_file(path)))
            .and_then(expect_done)
    }

    /// Delete a directory and its contents.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing path, or any other classified
    /// failure of the run.
    pub fn delete_dir(&self, path: &Path) -> Result<(), ExecError> {
        self.writable_execute(self.writable(ExecUnit::delete_dir(path)))
            .and_then(expect_done)
    }

    /// Change permission bits to the octal `mode`.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the run.
    pub fn change_perms(&self, path: &Path, mode: u32) -> Result<(), ExecError> {
        self.writable_execute(self.writable(ExecUnit::change_perms(path, mode)))
            .and_then(expect_done)
    }

    /// Move `src` to `dst`.
    ///
    /// The guard keys on the destination's mount.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the run.
    pub fn move_entry(&self, src: &Path, dst: &Path) -> Result<(), ExecError> {
        self.writable_execute(self.writable(ExecUnit::move_entry(src, dst)))
            .and_then(expect_done)
    }

    /// Copy `src` to `dst` recursively.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the run.
    pub fn copy_entry(&self, src: &Path, dst: &Path) -> Result<(), ExecError> {
        self.writable_execute(self.writable(ExecUnit::copy_entry(src, dst)))
            .and_then(expect_done)
    }

    /// List one directory, non-recursive.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the directory does not exist.
    pub fn list_files(&self, dir: &Path) -> Result<Vec<FsObject>, ExecError> {
        self.execute(ExecUnit::list(dir)).and_then(expect_listing)
    }

    /// Describe one entry. `follow_symlinks` resolves a trailing symlink
    /// and describes its target instead of the link itself.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the entry does not exist.
    pub fn file_info(&self, path: &Path, follow_symlinks: bool) -> Result<FsObject, ExecError> {
        self.execute(ExecUnit::info(path, follow_symlinks))
            .and_then(expect_entry)
    }

    /// Resolve a symlink and describe its target.
    ///
    /// # Errors
    ///
    /// Returns an execution failure if `path` is not a symlink.
    pub fn resolve_link(&self, path: &Path) -> Result<FsObject, ExecError> {
        self.execute(ExecUnit::resolve_link(path))
            .and_then(expect_entry)
    }

    /// Remount `mount` read-write or read-only.
    ///
    /// Remount is the guard's own auxiliary step and is never re-guarded;
    /// it runs through the plain execute path.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the remount invocation.
    pub fn remount(&self, mount: MountPoint, rw: bool) -> Result<(), ExecError> {
        let mode = if rw {
            crate::types::MountMode::ReadWrite
        } else {
            crate::types::MountMode::ReadOnly
        };
        self.execute(ExecUnit::remount(mount, mode))
            .and_then(expect_done)
    }
}
