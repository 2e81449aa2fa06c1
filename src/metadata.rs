//! Device metadata.
//!
//! [`DeviceMeta`] is the descriptive half of a device definition: what the
//! device is called, who made it, which unit it is, and what it is for
//! ([`DeviceRole`]). Plugins fill it during `fill_device_definition`; the host
//! surfaces it to UI, logging and bindings.
//!
//! # Conventions
//! - `name` should be a friendly, user-facing product name.
//! - `manufacturer` identifies the device family's vendor.
//! - `serial_number` identifies one physical unit; useful for re-identification
//!   across reconnects when the plugin reuses device ids.
//!
//! All strings must be non-empty and shorter than
//! [`XR_STRING_SIZE`](crate::device::XR_STRING_SIZE) bytes when set.

use serde::{Deserialize, Serialize};

use crate::error::XrError;

/// How a device is expected to be used.
///
/// Values match the C interface. `Count` and `Invalid` exist for wire
/// compatibility and are rejected by `set_role`.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceRole {
    /// Not mapped to anything.
    #[default]
    Unknown = 0,
    /// Cameras and HMDs.
    Generic = 1,
    LeftHanded = 2,
    RightHanded = 3,
    GameController = 4,
    TrackingReference = 5,
    HardwareTracker = 6,
    LegacyController = 7,
    Count = 8,
    Invalid = u32::MAX,
}

impl DeviceRole {
    /// `false` for the `Count` and `Invalid` markers.
    pub fn is_assignable(self) -> bool {
        !matches!(self, DeviceRole::Count | DeviceRole::Invalid)
    }
}

impl TryFrom<u32> for DeviceRole {
    type Error = XrError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Ok(match raw {
            0 => DeviceRole::Unknown,
            1 => DeviceRole::Generic,
            2 => DeviceRole::LeftHanded,
            3 => DeviceRole::RightHanded,
            4 => DeviceRole::GameController,
            5 => DeviceRole::TrackingReference,
            6 => DeviceRole::HardwareTracker,
            7 => DeviceRole::LegacyController,
            other => return Err(XrError::InvalidRole(other)),
        })
    }
}

/// Descriptive metadata of a single device.
///
/// Unset strings remain `None`; the role defaults to [`DeviceRole::Unknown`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceMeta {
    /// Human-readable product name.
    pub name: Option<String>,

    /// Intended use of the device.
    pub role: DeviceRole,

    /// Vendor name, reported upwards to help identify device families.
    pub manufacturer: Option<String>,

    /// Serial number of this particular unit.
    pub serial_number: Option<String>,
}
