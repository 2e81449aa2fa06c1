//! Status codes and the crate error type.
//!
//! Every fallible operation on the boundary reports one of three outcomes,
//! [`Status::Success`], [`Status::Failure`] or [`Status::InvalidArguments`].
//! Rust callers see a [`Result`] carrying an [`XrError`] with context; the C
//! layer collapses the error back into its [`Status`] via [`XrError::status`].

use crate::feature::FeatureType;
use crate::handle::{DeviceId, FeatureIndex, SubsystemHandle};
use crate::lifecycle::{LifecycleOp, LifecycleState};
use thiserror::Error;

/// Closed three-value status used uniformly across the boundary.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    Success = 0,
    /// Operation-specific failure; the caller may skip the device/feature and continue.
    Failure = 1,
    /// Caller contract violation (bad handle, index or payload).
    InvalidArguments = 2,
}

impl Status {
    #[inline]
    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

impl From<Result<()>> for Status {
    fn from(r: Result<()>) -> Self {
        match r {
            Ok(()) => Status::Success,
            Err(e) => e.status(),
        }
    }
}

/// Which device-definition string attribute a validation error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StringField {
    DeviceName,
    Manufacturer,
    SerialNumber,
    FeatureName,
    Usage,
    PluginName,
    SubsystemId,
}

impl std::fmt::Display for StringField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StringField::DeviceName => "device name",
            StringField::Manufacturer => "manufacturer",
            StringField::SerialNumber => "serial number",
            StringField::FeatureName => "feature name",
            StringField::Usage => "usage hint",
            StringField::PluginName => "plugin name",
            StringField::SubsystemId => "subsystem id",
        };
        f.write_str(s)
    }
}

/// Errors produced by the host registry, the definition builder and the state writer.
#[derive(Debug, Error)]
pub enum XrError {
    #[error("provider reported failure: {0}")]
    Provider(String),

    #[error("{field} is empty")]
    EmptyString { field: StringField },

    #[error("{field} is {len} bytes, must be shorter than {max}")]
    StringTooLong {
        field: StringField,
        len: usize,
        max: usize,
    },

    #[error("{field} contains an interior NUL byte")]
    InteriorNul { field: StringField },

    #[error("feature `{0}` already exists on this device")]
    DuplicateFeature(String),

    #[error("device already declares the maximum of {0} features")]
    FeatureCapacity(usize),

    #[error("feature type {0:?} cannot be added with add_feature")]
    UnsupportedFeatureType(FeatureType),

    #[error("custom feature size {size} outside 1..={max}")]
    CustomSizeOutOfRange { size: usize, max: usize },

    #[error("no feature at index {0}")]
    UnknownFeature(FeatureIndex),

    #[error("feature index {index} out of range (device has {count} features)")]
    FeatureIndexOutOfRange { index: FeatureIndex, count: usize },

    #[error("feature {index} is {declared:?}, setter writes {written:?}")]
    FeatureTypeMismatch {
        index: FeatureIndex,
        declared: FeatureType,
        written: FeatureType,
    },

    #[error("custom feature {index} is {declared} bytes, got {given}")]
    CustomSizeMismatch {
        index: FeatureIndex,
        declared: usize,
        given: usize,
    },

    #[error("invalid device role value {0}")]
    InvalidRole(u32),

    #[error("unknown event tag {0:#010x}")]
    UnknownEventTag(u32),

    #[error("malformed {event} payload: {reason}")]
    MalformedPayload {
        event: &'static str,
        reason: &'static str,
    },

    #[error("unknown subsystem {0}")]
    UnknownSubsystem(SubsystemHandle),

    #[error("device {device} is not connected to subsystem {subsystem}")]
    UnknownDevice {
        subsystem: SubsystemHandle,
        device: DeviceId,
    },

    #[error("cannot {op:?} a subsystem in state {state:?}")]
    InvalidTransition {
        op: LifecycleOp,
        state: LifecycleState,
    },

    #[error("subsystem {0} is not started")]
    NotRunning(SubsystemHandle),

    #[error("subsystem {0} already has an input provider")]
    ProviderAlreadyRegistered(SubsystemHandle),

    #[error("subsystem `{plugin}/{id}` is already registered")]
    DuplicateSubsystem { plugin: String, id: String },

    #[error("null {0} pointer")]
    NullPointer(&'static str),

    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(&'static str),
}

impl XrError {
    /// Classify this error into the three-value status of the boundary.
    pub fn status(&self) -> Status {
        match self {
            XrError::Provider(_)
            | XrError::EmptyString { .. }
            | XrError::StringTooLong { .. }
            | XrError::InteriorNul { .. }
            | XrError::DuplicateFeature(_)
            | XrError::FeatureCapacity(_)
            | XrError::UnsupportedFeatureType(_)
            | XrError::CustomSizeOutOfRange { .. }
            | XrError::UnknownFeature(_)
            | XrError::FeatureTypeMismatch { .. }
            | XrError::CustomSizeMismatch { .. }
            | XrError::UnknownEventTag(_)
            | XrError::NotRunning(_)
            | XrError::ProviderAlreadyRegistered(_)
            | XrError::DuplicateSubsystem { .. }
            | XrError::InvalidUtf8(_) => Status::Failure,

            XrError::FeatureIndexOutOfRange { .. }
            | XrError::InvalidRole(_)
            | XrError::MalformedPayload { .. }
            | XrError::UnknownSubsystem(_)
            | XrError::UnknownDevice { .. }
            | XrError::InvalidTransition { .. }
            | XrError::NullPointer(_) => Status::InvalidArguments,
        }
    }

    /// Shorthand for a provider-side failure with a message.
    pub fn provider(msg: impl Into<String>) -> Self {
        XrError::Provider(msg.into())
    }
}

pub type Result<T, E = XrError> = std::result::Result<T, E>;
