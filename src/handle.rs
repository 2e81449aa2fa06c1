//! Strongly typed identifiers crossing the host/plugin boundary.
//!
//! The C interface passes these around as bare pointers and integers; here each
//! role gets its own wrapper so a device id can't be handed to a function that
//! expects a feature index.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Registry-issued token naming one subsystem instance.
///
/// Handles are allocated from a monotonically increasing counter and are never
/// reused by a [`Manager`](crate::manager::Manager).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubsystemHandle(u32);

impl SubsystemHandle {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SubsystemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subsystem#{}", self.0)
    }
}

/// Plugin-chosen id of a device within one subsystem.
///
/// Unique among the subsystem's live devices. [`DeviceId::INVALID`] means
/// "no specific device" and is used to broadcast events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub u32);

impl DeviceId {
    pub const INVALID: DeviceId = DeviceId(u32::MAX);

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.0)
        } else {
            f.write_str("<any>")
        }
    }
}

/// Position of a feature within a device definition, and of its slot in the device state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureIndex(pub u32);

impl FeatureIndex {
    /// Returned across the C boundary when a feature could not be added.
    pub const INVALID: FeatureIndex = FeatureIndex(u32::MAX);

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }

    #[inline]
    pub(crate) fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
