//! In-process plugin implementations shipped with the host.
//!
//! # Feature flags
//! - **`virtual`**: scriptable virtual rig (HMD plus two controllers by default).
//!
//! Hardware plugins live in their own crates and talk to the host either
//! through the Rust traits or the C table in [`crate::ffi`].

#[cfg(feature = "virtual")]
#[cfg_attr(docsrs, doc(cfg(feature = "virtual")))]
pub mod virtual_input;
