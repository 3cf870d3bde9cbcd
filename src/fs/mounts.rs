//! Mount table inspection.

use std::path::{Path, PathBuf};

use crate::constants::PROC_MOUNTS;
use crate::policy::types::RemountRule;
use crate::types::{MountMode, MountPoint};

/// Authoritative view of the mount table.
///
/// Implementations must not cache across queries: "currently read-write"
/// is mutated behind our back by successful remount units.
pub trait MountRegistry: Send + Sync {
    /// Every entry currently known, with its remount permission applied.
    fn mount_points(&self) -> Vec<MountPoint>;

    /// The entry whose mount path is the longest prefix of `path`, or
    /// `None` when the path matches no table entry.
    fn mount_for(&self, path: &Path) -> Option<MountPoint>;
}

/// Production registry parsing `/proc/self/mounts` on every query.
#[derive(Debug, Clone)]
pub struct ProcMountRegistry {
    remount: RemountRule,
}

impl ProcMountRegistry {
    #[must_use]
    pub fn new(remount: RemountRule) -> Self {
        Self { remount }
    }

    fn table(&self) -> Vec<MountPoint> {
        match std::fs::read_to_string(PROC_MOUNTS) {
            Ok(content) => parse_mount_table(&content, &self.remount),
            Err(_) => Vec::new(),
        }
    }
}

impl MountRegistry for ProcMountRegistry {
    fn mount_points(&self) -> Vec<MountPoint> {
        self.table()
    }

    fn mount_for(&self, path: &Path) -> Option<MountPoint> {
        // Canonicalization may fail for paths that do not exist yet; match
        // on the raw path then.
        let p = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        best_match(&self.table(), &p)
    }
}

pub(crate) fn parse_mount_table(content: &str, remount: &RemountRule) -> Vec<MountPoint> {
    let mut out = Vec::new();
    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            continue;
        }
        let path = PathBuf::from(parts[1]);
        let fstype = parts[2].to_string();
        let opts = parts[3].to_ascii_lowercase();
        let mode = if opts.split(',').any(|o| o == "rw") {
            MountMode::ReadWrite
        } else {
            MountMode::ReadOnly
        };
        let remount_allowed = remount.allows(&fstype);
        out.push(MountPoint {
            device: parts[0].to_string(),
            path,
            fstype,
            mode,
            remount_allowed,
        });
    }
    out
}

pub(crate) fn best_match(table: &[MountPoint], path: &Path) -> Option<MountPoint> {
    let mut best: Option<&MountPoint> = None;
    for mp in table {
        if path.starts_with(&mp.path) {
            match best {
                None => best = Some(mp),
                Some(b) => {
                    if mp.path.as_os_str().len() > b.path.as_os_str().len() {
                        best = Some(mp);
                    }
                }
            }
        }
    }
    best.cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
/dev/root / ext4 rw,relatime 0 0
/dev/sda2 /media ext4 ro,noatime 0 0
/dev/sda3 /media/sdcard vfat rw,noexec 0 0
proc /proc proc rw,nosuid 0 0
garbage-line
";

    fn parsed() -> Vec<MountPoint> {
        parse_mount_table(TABLE, &RemountRule::default())
    }

    #[test]
    fn parses_modes_and_skips_malformed_lines() {
        let table = parsed();
        assert_eq!(table.len(), 4);
        assert_eq!(table[0].mode, MountMode::ReadWrite);
        assert_eq!(table[1].mode, MountMode::ReadOnly);
        assert_eq!(table[1].fstype, "ext4");
    }

    #[test]
    fn longest_prefix_wins() {
        let table = parsed();
        let mp = best_match(&table, Path::new("/media/sdcard/music/a.ogg")).unwrap();
        assert_eq!(mp.path, PathBuf::from("/media/sdcard"));
        let mp = best_match(&table, Path::new("/media/other")).unwrap();
        assert_eq!(mp.path, PathBuf::from("/media"));
        let mp = best_match(&table, Path::new("/var/log")).unwrap();
        assert_eq!(mp.path, PathBuf::from("/"));
    }

    #[test]
    fn default_rule_denies_pseudo_filesystems() {
        let table = parsed();
        let proc = table.iter().find(|m| m.fstype == "proc").unwrap();
        assert!(!proc.remount_allowed);
        let media = table.iter().find(|m| m.path == Path::new("/media")).unwrap();
        assert!(media.remount_allowed);
    }

    #[test]
    fn deny_all_blocks_everything() {
        let table = parse_mount_table(TABLE, &RemountRule::DenyAll);
        assert!(table.iter().all(|m| !m.remount_allowed));
    }
}
