//! Per-subsystem snapshot of device states.
//!
//! [`Snapshot`] is an **owned**, read-only view of every live device of one
//! subsystem at a point in time (typically "this frame"): its immutable
//! definition plus the last successfully committed state. It is produced by
//! [`Manager::snapshot`](crate::manager::Manager::snapshot) and is cheap to
//! clone for fan-out to multiple consumers; definitions are shared.
//!
//! # Semantics
//! - Keys are [`DeviceId`]s, iterated in ascending order.
//! - A snapshot is **immutable**. To refresh, run another update and take a new one.
//! - A snapshot does **not** poll providers.
//!
//! # Example
//! ```no_run
//! use xrtether::{usage, Snapshot};
//!
//! fn print_triggers(snap: &Snapshot) {
//!     for (id, dev) in snap.iter() {
//!         if let Some(idx) = dev.definition.find_usage(usage::TRIGGER) {
//!             println!("{id}: trigger={:?}", dev.state.axis1d(idx));
//!         }
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::device::DeviceDefinition;
use crate::handle::DeviceId;
use crate::metadata::DeviceRole;
use crate::state::DeviceState;

/// One device inside a [`Snapshot`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub definition: Arc<DeviceDefinition>,
    pub state: DeviceState,
}

/// Owned snapshot of a subsystem's devices (`device_id -> definition + state`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot(pub BTreeMap<DeviceId, DeviceSnapshot>);

impl Snapshot {
    #[inline]
    pub fn get(&self, device: DeviceId) -> Option<&DeviceSnapshot> {
        self.0.get(&device)
    }

    /// Iterate `(device_id, device)` pairs in id order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (DeviceId, &DeviceSnapshot)> {
        self.0.iter().map(|(id, d)| (*id, d))
    }

    /// Devices with the given role, in id order.
    pub fn find_by_role(&self, role: DeviceRole) -> impl Iterator<Item = (DeviceId, &DeviceSnapshot)> {
        self.iter().filter(move |(_, d)| d.definition.role() == role)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pretty JSON dump, for diagnostics.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Consume the snapshot and return the inner map.
    #[inline]
    pub fn into_inner(self) -> BTreeMap<DeviceId, DeviceSnapshot> {
        self.0
    }
}
