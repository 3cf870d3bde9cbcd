use super::types::{ChannelTuning, Mounts, RemountRule};

/// Policy governs remount permission and channel defaults for Drawbridge.
///
/// Grouped fields provide clearer ownership and ergonomics. Post-delete
/// verification is deliberately not a knob: a delete that reports success
/// while the entry is still present always aborts the batch.
#[derive(Clone, Debug, Default)]
pub struct Policy {
    pub mounts: Mounts,
    pub channel: ChannelTuning,
}

impl Policy {
    /// Construct a Policy that never remounts anything.
    ///
    /// Writable operations still run; a filesystem that is genuinely
    /// read-only reports its own refusal, surfaced as
    /// `ReadOnlyFilesystem`. Useful on appliances where flipping a mount
    /// read-write is operationally forbidden.
    ///
    /// # Example
    /// ```rust
    /// use drawbridge::policy::Policy;
    /// use drawbridge::{logging::JsonlSink, Drawbridge};
    ///
    /// let api = Drawbridge::new(
    ///     JsonlSink::default(),
    ///     JsonlSink::default(),
    ///     Policy::locked_down_preset(),
    /// );
    /// # let _ = api;
    /// ```
    #[must_use]
    pub fn locked_down_preset() -> Self {
        let mut p = Self::default();
        p.mounts.remount = RemountRule::DenyAll;
        p
    }

    /// Mutate this Policy to refuse all remounts.
    pub fn apply_locked_down_preset(&mut self) -> &mut Self {
        self.mounts.remount = RemountRule::DenyAll;
        self
    }
}
