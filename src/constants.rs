//! Shared crate-wide constants for Drawbridge.
//!
//! Magic values and default labels live here rather than at their call
//! sites; changing one changes it everywhere.

/// Default per-command timeout for the local shell channel, in milliseconds.
/// Surfaced as a `Timeout` failure when exceeded; the layers above the
/// channel never re-implement their own timers.
pub const DEFAULT_CMD_TIMEOUT_MS: u64 = 30_000;

/// Poll interval in milliseconds while waiting on a spawned command
/// (see `channel/local.rs`).
pub const CMD_POLL_MS: u64 = 25;

/// Thread name given to the dedicated batch-deletion worker.
pub const BATCH_WORKER_NAME: &str = "drawbridge-delete";

/// Mount table consulted by the production mount registry.
pub const PROC_MOUNTS: &str = "/proc/self/mounts";

/// Filesystem types the default policy refuses to remount. Pseudo
/// filesystems either ignore remount options or host state that must not
/// be flipped read-write by a file manager.
pub const REMOUNT_DENY_FSTYPES: &[&str] = &[
    "proc",
    "sysfs",
    "devtmpfs",
    "devpts",
    "tmpfs",
    "cgroup",
    "cgroup2",
    "securityfs",
    "debugfs",
];
