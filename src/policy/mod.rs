//! Policy configuration for remount governance and channel defaults.
//!
//! The `policy` module centralizes the administrative knobs consulted while
//! building writable units and allocating the default channel. Consumers
//! typically construct a [`Policy`](crate::policy::Policy) via `default()`
//! or the `locked_down_preset`, customize fields, and hand it to a
//! [`Drawbridge`](crate::Drawbridge) instance.
//!
//! Submodules:
//! - `config`: policy struct and presets
//! - `types`: grouped knob types

pub mod config;
pub mod types;

pub use config::Policy;
