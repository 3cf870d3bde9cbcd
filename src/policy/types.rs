use crate::constants::REMOUNT_DENY_FSTYPES;

/// Which mount table entries the guard may remount.
#[derive(Clone, Debug)]
pub enum RemountRule {
    /// Remount anything the table reports.
    AllowAll,
    /// Never remount; writable runs proceed unmounted and surface the
    /// filesystem's own refusal.
    DenyAll,
    /// Remount unless the filesystem type matches one of these.
    DenyFsTypes(Vec<String>),
}

impl RemountRule {
    #[must_use]
    pub fn allows(&self, fstype: &str) -> bool {
        match self {
            RemountRule::AllowAll => true,
            RemountRule::DenyAll => false,
            RemountRule::DenyFsTypes(deny) => !deny.iter().any(|t| t == fstype),
        }
    }
}

impl Default for RemountRule {
    fn default() -> Self {
        RemountRule::DenyFsTypes(REMOUNT_DENY_FSTYPES.iter().map(|s| (*s).to_string()).collect())
    }
}

/// Mount governance knobs.
#[derive(Clone, Debug, Default)]
pub struct Mounts {
    pub remount: RemountRule,
}

/// Tuning for the default command channel.
#[derive(Clone, Debug)]
pub struct ChannelTuning {
    /// Bounded per-command timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ChannelTuning {
    fn default() -> Self {
        Self {
            timeout_ms: crate::constants::DEFAULT_CMD_TIMEOUT_MS,
        }
    }
}
