//! Catalog of well-known feature usage hints.
//!
//! Usages are free-form strings: a plugin may attach any valid string to a
//! feature, and generic mapping code looks features up by these names. The
//! constants below are the ones input mapping understands out of the box.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// A usage hint attached to a feature.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureUsage(Cow<'static, str>);

impl FeatureUsage {
    pub const fn from_static(s: &'static str) -> Self {
        Self(Cow::Borrowed(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` when the string is part of the built-in catalog.
    pub fn is_well_known(&self) -> bool {
        is_well_known(&self.0)
    }
}

impl From<&'static str> for FeatureUsage {
    fn from(s: &'static str) -> Self {
        Self(Cow::Borrowed(s))
    }
}

impl From<String> for FeatureUsage {
    fn from(s: String) -> Self {
        Self(Cow::Owned(s))
    }
}

impl AsRef<str> for FeatureUsage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for FeatureUsage {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for FeatureUsage {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for FeatureUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Pose & tracking
pub const IS_TRACKED: &str = "IsTracked";
pub const TRACKING_STATE: &str = "TrackingState";
pub const DEVICE_POSITION: &str = "DevicePosition";
pub const DEVICE_ROTATION: &str = "DeviceRotation";
pub const DEVICE_VELOCITY: &str = "DeviceVelocity";
pub const DEVICE_ANGULAR_VELOCITY: &str = "DeviceAngularVelocity";
pub const DEVICE_ACCELERATION: &str = "DeviceAcceleration";
pub const DEVICE_ANGULAR_ACCELERATION: &str = "DeviceAngularAcceleration";
pub const LEFT_EYE_POSITION: &str = "LeftEyePosition";
pub const LEFT_EYE_ROTATION: &str = "LeftEyeRotation";
pub const LEFT_EYE_VELOCITY: &str = "LeftEyeVelocity";
pub const LEFT_EYE_ANGULAR_VELOCITY: &str = "LeftEyeAngularVelocity";
pub const LEFT_EYE_ACCELERATION: &str = "LeftEyeAcceleration";
pub const LEFT_EYE_ANGULAR_ACCELERATION: &str = "LeftEyeAngularAcceleration";
pub const RIGHT_EYE_POSITION: &str = "RightEyePosition";
pub const RIGHT_EYE_ROTATION: &str = "RightEyeRotation";
pub const RIGHT_EYE_VELOCITY: &str = "RightEyeVelocity";
pub const RIGHT_EYE_ANGULAR_VELOCITY: &str = "RightEyeAngularVelocity";
pub const RIGHT_EYE_ACCELERATION: &str = "RightEyeAcceleration";
pub const RIGHT_EYE_ANGULAR_ACCELERATION: &str = "RightEyeAngularAcceleration";
pub const CENTER_EYE_POSITION: &str = "CenterEyePosition";
pub const CENTER_EYE_ROTATION: &str = "CenterEyeRotation";
pub const CENTER_EYE_VELOCITY: &str = "CenterEyeVelocity";
pub const CENTER_EYE_ANGULAR_VELOCITY: &str = "CenterEyeAngularVelocity";
pub const CENTER_EYE_ACCELERATION: &str = "CenterEyeAcceleration";
pub const CENTER_EYE_ANGULAR_ACCELERATION: &str = "CenterEyeAngularAcceleration";
pub const COLOR_CAMERA_POSITION: &str = "CameraPosition";
pub const COLOR_CAMERA_ROTATION: &str = "CameraRotation";
pub const COLOR_CAMERA_VELOCITY: &str = "CameraVelocity";
pub const COLOR_CAMERA_ANGULAR_VELOCITY: &str = "CameraAngularVelocity";
pub const COLOR_CAMERA_ACCELERATION: &str = "CameraAcceleration";
pub const COLOR_CAMERA_ANGULAR_ACCELERATION: &str = "CameraAngularAcceleration";

// Device information
pub const BATTERY_LEVEL: &str = "BatteryLevel";

// Legacy axes
pub const PRIMARY_2D_AXIS: &str = "Primary2DAxis";
pub const DPAD: &str = "DPad";
pub const TRIGGER: &str = "Trigger";
pub const GRIP: &str = "Grip";
pub const INDEX_TOUCH: &str = "IndexTouch";
pub const THUMB_TOUCH: &str = "ThumbTouch";
pub const SECONDARY_2D_AXIS: &str = "Secondary2DAxis";
pub const INDEX_FINGER: &str = "IndexFinger";
pub const MIDDLE_FINGER: &str = "MiddleFinger";
pub const RING_FINGER: &str = "RingFinger";
pub const PINKY_FINGER: &str = "PinkyFinger";
pub const COMBINED_TRIGGER: &str = "CombinedTrigger";

// Legacy buttons
pub const PRIMARY_BUTTON: &str = "PrimaryButton";
pub const PRIMARY_TOUCH: &str = "PrimaryTouch";
pub const SECONDARY_BUTTON: &str = "SecondaryButton";
pub const SECONDARY_TOUCH: &str = "SecondaryTouch";
pub const GRIP_BUTTON: &str = "GripButton";
pub const TRIGGER_BUTTON: &str = "TriggerButton";
pub const MENU_BUTTON: &str = "MenuButton";
pub const PRIMARY_2D_AXIS_CLICK: &str = "2DAxisClick";
pub const PRIMARY_2D_AXIS_TOUCH: &str = "2DAxisTouch";
pub const THUMBREST: &str = "Thumbrest";

/// Number of direct legacy button ids (`ButtonId0` ..= `ButtonId19`).
pub const LEGACY_BUTTON_COUNT: u32 = 20;
/// Number of direct legacy axis ids (`AxisId0` ..= `AxisId27`).
pub const LEGACY_AXIS_COUNT: u32 = 28;

/// Usages whose features describe a pose; these are the features a
/// before-render repoll refreshes.
pub const POSE_USAGES: &[&str] = &[
    DEVICE_POSITION,
    DEVICE_ROTATION,
    LEFT_EYE_POSITION,
    LEFT_EYE_ROTATION,
    RIGHT_EYE_POSITION,
    RIGHT_EYE_ROTATION,
    CENTER_EYE_POSITION,
    CENTER_EYE_ROTATION,
    COLOR_CAMERA_POSITION,
    COLOR_CAMERA_ROTATION,
];

/// All named catalog entries, excluding the numbered legacy ids.
pub const WELL_KNOWN: &[&str] = &[
    IS_TRACKED,
    TRACKING_STATE,
    DEVICE_POSITION,
    DEVICE_ROTATION,
    DEVICE_VELOCITY,
    DEVICE_ANGULAR_VELOCITY,
    DEVICE_ACCELERATION,
    DEVICE_ANGULAR_ACCELERATION,
    LEFT_EYE_POSITION,
    LEFT_EYE_ROTATION,
    LEFT_EYE_VELOCITY,
    LEFT_EYE_ANGULAR_VELOCITY,
    LEFT_EYE_ACCELERATION,
    LEFT_EYE_ANGULAR_ACCELERATION,
    RIGHT_EYE_POSITION,
    RIGHT_EYE_ROTATION,
    RIGHT_EYE_VELOCITY,
    RIGHT_EYE_ANGULAR_VELOCITY,
    RIGHT_EYE_ACCELERATION,
    RIGHT_EYE_ANGULAR_ACCELERATION,
    CENTER_EYE_POSITION,
    CENTER_EYE_ROTATION,
    CENTER_EYE_VELOCITY,
    CENTER_EYE_ANGULAR_VELOCITY,
    CENTER_EYE_ACCELERATION,
    CENTER_EYE_ANGULAR_ACCELERATION,
    COLOR_CAMERA_POSITION,
    COLOR_CAMERA_ROTATION,
    COLOR_CAMERA_VELOCITY,
    COLOR_CAMERA_ANGULAR_VELOCITY,
    COLOR_CAMERA_ACCELERATION,
    COLOR_CAMERA_ANGULAR_ACCELERATION,
    BATTERY_LEVEL,
    PRIMARY_2D_AXIS,
    DPAD,
    TRIGGER,
    GRIP,
    INDEX_TOUCH,
    THUMB_TOUCH,
    SECONDARY_2D_AXIS,
    INDEX_FINGER,
    MIDDLE_FINGER,
    RING_FINGER,
    PINKY_FINGER,
    COMBINED_TRIGGER,
    PRIMARY_BUTTON,
    PRIMARY_TOUCH,
    SECONDARY_BUTTON,
    SECONDARY_TOUCH,
    GRIP_BUTTON,
    TRIGGER_BUTTON,
    MENU_BUTTON,
    PRIMARY_2D_AXIS_CLICK,
    PRIMARY_2D_AXIS_TOUCH,
    THUMBREST,
];

/// Usage string of direct legacy button `n` (`ButtonId{n}`), if in range.
pub fn legacy_button(n: u32) -> Option<FeatureUsage> {
    (n < LEGACY_BUTTON_COUNT).then(|| FeatureUsage::from(format!("ButtonId{n}")))
}

/// Usage string of direct legacy axis `n` (`AxisId{n}`), if in range.
pub fn legacy_axis(n: u32) -> Option<FeatureUsage> {
    (n < LEGACY_AXIS_COUNT).then(|| FeatureUsage::from(format!("AxisId{n}")))
}

fn parse_legacy(s: &str, prefix: &str, count: u32) -> bool {
    s.strip_prefix(prefix)
        .filter(|digits| !digits.starts_with('0') || digits.len() == 1)
        .and_then(|digits| digits.parse::<u32>().ok())
        .is_some_and(|n| n < count)
}

/// `true` for any catalog string, including the numbered legacy ids.
pub fn is_well_known(s: &str) -> bool {
    WELL_KNOWN.contains(&s)
        || parse_legacy(s, "ButtonId", LEGACY_BUTTON_COUNT)
        || parse_legacy(s, "AxisId", LEGACY_AXIS_COUNT)
}

/// `true` when features with this usage are refreshed by before-render polls.
pub fn is_pose_usage(s: &str) -> bool {
    POSE_USAGES.contains(&s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_ids_cover_documented_ranges() {
        assert_eq!(legacy_button(0).map(|u| u.to_string()), Some("ButtonId0".into()));
        assert_eq!(legacy_button(19).map(|u| u.to_string()), Some("ButtonId19".into()));
        assert!(legacy_button(20).is_none());
        assert_eq!(legacy_axis(27).map(|u| u.to_string()), Some("AxisId27".into()));
        assert!(legacy_axis(28).is_none());
    }

    #[test]
    fn catalog_lookup_accepts_named_and_numbered_entries() {
        assert!(is_well_known(PRIMARY_BUTTON));
        assert!(is_well_known("2DAxisClick"));
        assert!(is_well_known("ButtonId7"));
        assert!(is_well_known("AxisId27"));
        assert!(!is_well_known("AxisId28"));
        assert!(!is_well_known("ButtonId07"));
        assert!(!is_well_known("HapticStrength"));
        assert!(FeatureUsage::from(String::from("Custom")).as_str() == "Custom");
    }

    #[test]
    fn pose_usages_are_well_known() {
        for u in POSE_USAGES {
            assert!(is_well_known(u), "{u}");
        }
        assert!(is_pose_usage(DEVICE_ROTATION));
        assert!(!is_pose_usage(TRIGGER));
    }
}
