//! The command channel: blocking execution endpoint for executable units.
//!
//! A channel runs exactly one unit at a time and performs no retries and no
//! classification; its raw failure vocabulary is mapped onto the public
//! taxonomy once, at the broker boundary.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::types::{ExecUnit, UnitOutput};

pub mod local;

pub use local::{LocalChannelProvider, LocalShellChannel};

/// Raw failure vocabulary of a channel.
#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    #[error("no such file or directory")]
    NotFound,
    #[error("permission denied")]
    PermissionDenied,
    #[error("operation not supported by this channel")]
    Unsupported,
    #[error("command timed out")]
    Timeout,
    #[error("command failed: {0}")]
    Failed(String),
    #[error("read-only file system")]
    ReadOnly,
}

/// Blocking, synchronous executor of one unit at a time.
///
/// Serialized access is structural: the shared handle wraps every instance
/// in a mutex, so two units never run concurrently on one channel.
pub trait Channel: Send {
    fn run(&mut self, unit: ExecUnit) -> Result<UnitOutput, ChannelError>;
}

/// Shared handle serializing access to one channel instance.
pub type SharedChannel = Arc<Mutex<Box<dyn Channel>>>;

/// Failure to obtain a channel at all.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct AllocationError(pub String);

/// Allocates the session's default channel on first use.
pub trait ChannelProvider: Send + Sync {
    /// Build a fresh channel.
    ///
    /// # Errors
    ///
    /// Returns `AllocationError` when no channel can be obtained; the
    /// broker surfaces this as `AllocationFailed`.
    fn allocate(&self) -> Result<Box<dyn Channel>, AllocationError>;
}

/// Supplied-or-lazy channel slot.
///
/// An empty slot is filled from the provider on first dispatch and the
/// channel is cached for the rest of the session. Installing a channel
/// (at build time, or by a resolver swapping in an elevated one) replaces
/// whatever the slot held.
#[derive(Default)]
pub struct ChannelSlot {
    cell: Mutex<Option<SharedChannel>>,
}

impl ChannelSlot {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn holding(channel: Box<dyn Channel>) -> Self {
        Self {
            cell: Mutex::new(Some(Arc::new(Mutex::new(channel)))),
        }
    }

    /// Replace the session channel.
    pub fn install(&self, channel: Box<dyn Channel>) {
        if let Ok(mut cell) = self.cell.lock() {
            *cell = Some(Arc::new(Mutex::new(channel)));
        }
    }

    /// The cached channel, or a fresh one from `provider` on first use.
    ///
    /// # Errors
    ///
    /// Propagates the provider's `AllocationError`; a poisoned slot is
    /// reported the same way.
    pub(crate) fn obtain(
        &self,
        provider: &dyn ChannelProvider,
    ) -> Result<SharedChannel, AllocationError> {
        let mut cell = self
            .cell
            .lock()
            .map_err(|_| AllocationError("channel slot poisoned".to_string()))?;
        if let Some(existing) = cell.as_ref() {
            return Ok(Arc::clone(existing));
        }
        let fresh: SharedChannel = Arc::new(Mutex::new(provider.allocate()?));
        *cell = Some(Arc::clone(&fresh));
        Ok(fresh)
    }
}
