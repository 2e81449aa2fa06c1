//! C ABI for plugins that are not written in Rust.
//!
//! The layout mirrors the Rust traits:
//! - a plugin fills an [`XrLifecycleProvider`] table and the host wraps it in a
//!   [`ForeignLifecycleProvider`];
//! - from `initialize` the plugin calls
//!   [`XrInputInterface::register_input_provider`] with its
//!   [`XrInputProvider`] table;
//! - during `fill_device_definition` and `update_device_state` it receives an
//!   opaque [`XrDeviceDefinition`] / [`XrDeviceState`] pointer and calls back
//!   into the table returned by [`xrtether_input_interface`].
//!
//! Opaque pointers handed to the plugin are only valid for the duration of
//! the callback they were passed to, except the subsystem pointer, which lives
//! until the lifecycle provider is dropped.

mod foreign;
mod host;
mod types;

pub use foreign::{ForeignInputProvider, ForeignLifecycleProvider, ForeignSubsystem};
pub use host::xrtether_input_interface;
pub use types::*;
