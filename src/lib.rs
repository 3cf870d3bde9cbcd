#![forbid(unsafe_code)]
//! Drawbridge: privileged filesystem command execution with a writable
//! guard and an elevation retry protocol.
//!
//! Model highlights:
//! - One session channel executes every unit; callers never shell out
//!   themselves. Failures land in a closed taxonomy (`ExecError`) so
//!   callers match on kinds, not message strings.
//! - Mutations go through the writable guard: a read-only but
//!   remountable mount is remounted read-write around the unit and
//!   read-only again afterwards, whatever the unit's outcome.
//! - A permission denial carries the exact steps still owed; after an
//!   out-of-band elevation the caller replays them verbatim and the
//!   mount discipline is restored.
//! - Batch deletion runs on a dedicated worker with children-first
//!   ordering, post-delete verification, and whole-batch abort.

pub mod adapters;
pub mod api;
pub mod channel;
pub mod constants;
pub mod fs;
pub mod logging;
pub mod policy;
pub mod types;

pub use api::*;
