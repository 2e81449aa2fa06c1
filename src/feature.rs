//! Feature kinds and the values they carry.
//!
//! A device declares an ordered list of features at definition time; each has a
//! [`FeatureType`] that fixes which [`FeatureValue`] variant its state slot holds.
//!
//! ## Value conventions
//! - **Binary:** `true` = pressed / active.
//! - **DiscreteStates:** an unsigned integer; tracking-state features carry
//!   [`TrackingState`] bits here.
//! - **Axis1D:** triggers and grips are conventionally `[0.0, 1.0]`, other
//!   axes `[-1.0, 1.0]`. Nothing enforces the range.
//! - **Axis2D / Axis3D / Rotation:** plain `f32` vectors; positions in meters,
//!   rotations as unit quaternions.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::XrError;

/// Type tag of a device feature. Values match the C interface.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureType {
    /// Opaque blob of a size declared with `add_custom_feature`.
    Custom = 0,
    Binary = 1,
    DiscreteStates = 2,
    Axis1D = 3,
    Axis2D = 4,
    Axis3D = 5,
    Rotation = 6,
    Invalid = u32::MAX,
}

impl FeatureType {
    /// Decode a raw C value; unknown values map to [`FeatureType::Invalid`].
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => FeatureType::Custom,
            1 => FeatureType::Binary,
            2 => FeatureType::DiscreteStates,
            3 => FeatureType::Axis1D,
            4 => FeatureType::Axis2D,
            5 => FeatureType::Axis3D,
            6 => FeatureType::Rotation,
            _ => FeatureType::Invalid,
        }
    }
}

/// Two-component vector, laid out like the C `XRVector2`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Three-component vector, laid out like the C `XRVector3`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Rotation quaternion `(x, y, z, w)`, laid out like the C `XRVector4`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Quaternion::IDENTITY
    }
}

static_assertions::assert_eq_size!(Vector2, [f32; 2]);
static_assertions::assert_eq_size!(Vector3, [f32; 3]);
static_assertions::assert_eq_size!(Quaternion, [f32; 4]);
static_assertions::assert_eq_size!(FeatureType, u32);

/// Current value of one feature slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum FeatureValue {
    Custom(Vec<u8>),
    Binary(bool),
    DiscreteStates(u32),
    Axis1D(f32),
    Axis2D(Vector2),
    Axis3D(Vector3),
    Rotation(Quaternion),
}

impl FeatureValue {
    /// Initial slot value for a feature of `ty`; `custom_size` sizes custom blobs.
    ///
    /// Returns `None` for [`FeatureType::Invalid`].
    pub fn initial(ty: FeatureType, custom_size: usize) -> Option<Self> {
        Some(match ty {
            FeatureType::Custom => FeatureValue::Custom(vec![0; custom_size]),
            FeatureType::Binary => FeatureValue::Binary(false),
            FeatureType::DiscreteStates => FeatureValue::DiscreteStates(0),
            FeatureType::Axis1D => FeatureValue::Axis1D(0.0),
            FeatureType::Axis2D => FeatureValue::Axis2D(Vector2::ZERO),
            FeatureType::Axis3D => FeatureValue::Axis3D(Vector3::ZERO),
            FeatureType::Rotation => FeatureValue::Rotation(Quaternion::IDENTITY),
            FeatureType::Invalid => return None,
        })
    }

    pub fn feature_type(&self) -> FeatureType {
        match self {
            FeatureValue::Custom(_) => FeatureType::Custom,
            FeatureValue::Binary(_) => FeatureType::Binary,
            FeatureValue::DiscreteStates(_) => FeatureType::DiscreteStates,
            FeatureValue::Axis1D(_) => FeatureType::Axis1D,
            FeatureValue::Axis2D(_) => FeatureType::Axis2D,
            FeatureValue::Axis3D(_) => FeatureType::Axis3D,
            FeatureValue::Rotation(_) => FeatureType::Rotation,
        }
    }
}

/// Which poll of the frame an `update_device_state` call belongs to.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateType {
    /// Regular per-frame poll, preceded by `on_new_input_frame`.
    Dynamic = 0,
    /// Late pose-only repoll right before frame submission. Must not block.
    BeforeRender = 1,
}

impl TryFrom<u32> for UpdateType {
    type Error = XrError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(UpdateType::Dynamic),
            1 => Ok(UpdateType::BeforeRender),
            _ => Err(XrError::MalformedPayload {
                event: "update type",
                reason: "unknown value",
            }),
        }
    }
}

bitflags! {
    /// Which parts of a tracked pose are currently valid.
    ///
    /// Reported through a `DiscreteStates` feature carrying the
    /// [`TRACKING_STATE`](crate::usage::TRACKING_STATE) usage.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct TrackingState: u32 {
        const POSITION             = 1 << 0;
        const ROTATION             = 1 << 1;
        const VELOCITY             = 1 << 2;
        const ANGULAR_VELOCITY     = 1 << 3;
        const ACCELERATION         = 1 << 4;
        const ANGULAR_ACCELERATION = 1 << 5;
        const ALL = (1 << 6) - 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_feature_types_decode_and_unknowns_are_invalid() {
        assert_eq!(FeatureType::from_raw(3), FeatureType::Axis1D);
        assert_eq!(FeatureType::from_raw(6), FeatureType::Rotation);
        assert_eq!(FeatureType::from_raw(7), FeatureType::Invalid);
        assert_eq!(FeatureType::Invalid as u32, u32::MAX);
    }

    #[test]
    fn initial_values_match_their_type() {
        for ty in [
            FeatureType::Binary,
            FeatureType::DiscreteStates,
            FeatureType::Axis1D,
            FeatureType::Axis2D,
            FeatureType::Axis3D,
            FeatureType::Rotation,
        ] {
            let v = FeatureValue::initial(ty, 0).map(|v| v.feature_type());
            assert_eq!(v, Some(ty));
        }
        assert_eq!(
            FeatureValue::initial(FeatureType::Custom, 4),
            Some(FeatureValue::Custom(vec![0; 4]))
        );
        assert_eq!(FeatureValue::initial(FeatureType::Invalid, 0), None);
        assert_eq!(
            FeatureValue::initial(FeatureType::Rotation, 0),
            Some(FeatureValue::Rotation(Quaternion::IDENTITY))
        );
    }

    #[test]
    fn tracking_all_covers_every_flag() {
        assert_eq!(TrackingState::ALL.bits(), 0x3F);
        let pose = TrackingState::POSITION | TrackingState::ROTATION;
        assert!(TrackingState::ALL.contains(pose));
    }
}
