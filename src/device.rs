//! Device definitions.
//!
//! A definition is what a device *is*: its [`DeviceMeta`] and the ordered list
//! of features it reports. The host creates a [`DeviceDefinitionBuilder`] for
//! each newly connected device and lends it to the plugin's
//! `fill_device_definition` exactly once; afterwards it is frozen into an
//! immutable [`DeviceDefinition`] that lives as long as the connection.
//!
//! # Index space
//! Feature indices are handed out in strict call order starting at zero, and
//! the device state exposes one slot per feature in the same order. A failed
//! `add_*` call never consumes an index.
//!
//! # Example
//! ```
//! use xrtether::device::{DeviceDefinitionBuilder, DefinitionLimits};
//! use xrtether::{usage, DeviceRole, FeatureType};
//!
//! let mut def = DeviceDefinitionBuilder::new(DefinitionLimits::default());
//! def.set_name("Right Controller")?;
//! def.set_role(DeviceRole::RightHanded)?;
//! let trigger = def.add_feature_with_usage("Trigger", FeatureType::Axis1D, usage::TRIGGER)?;
//! assert_eq!(trigger.0, 0);
//! let def = def.finish();
//! assert_eq!(def.find_usage(usage::TRIGGER), Some(trigger));
//! # Ok::<(), xrtether::XrError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, StringField, XrError};
use crate::feature::FeatureType;
use crate::handle::FeatureIndex;
use crate::metadata::{DeviceMeta, DeviceRole};
use crate::usage::FeatureUsage;

/// Strings crossing the boundary must be shorter than this many bytes.
pub const XR_STRING_SIZE: usize = 128;

/// Upper bound (inclusive) on the size of a custom feature, in bytes.
pub const MAX_CUSTOM_FEATURE_SIZE: usize = 128;

/// Default cap on the number of features one device may declare.
pub const DEFAULT_MAX_FEATURES: usize = 256;

/// Host-chosen limits applied while a definition is being filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DefinitionLimits {
    /// Exclusive upper bound on string length in bytes.
    pub max_string_len: usize,
    /// Maximum number of features per device.
    pub max_features: usize,
}

impl Default for DefinitionLimits {
    fn default() -> Self {
        Self {
            max_string_len: XR_STRING_SIZE,
            max_features: DEFAULT_MAX_FEATURES,
        }
    }
}

impl DefinitionLimits {
    pub(crate) fn check_str(&self, field: StringField, s: &str) -> Result<()> {
        if s.is_empty() {
            return Err(XrError::EmptyString { field });
        }
        if s.len() >= self.max_string_len {
            return Err(XrError::StringTooLong {
                field,
                len: s.len(),
                max: self.max_string_len,
            });
        }
        if s.contains('\0') {
            return Err(XrError::InteriorNul { field });
        }
        Ok(())
    }
}

/// Describes one feature of a device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureDesc {
    /// Device-specific feature name, unique within the device.
    pub name: String,
    /// Declared type; fixes which setter is valid for this index.
    pub feature_type: FeatureType,
    /// Byte size of a custom feature; `0` for every other type.
    pub custom_size: usize,
    /// Usage hints, in the order they were attached.
    pub usages: Vec<FeatureUsage>,
}

impl FeatureDesc {
    /// Size of this feature's value on the wire.
    pub fn value_size(&self) -> usize {
        match self.feature_type {
            FeatureType::Custom => self.custom_size,
            FeatureType::Binary => 1,
            FeatureType::DiscreteStates | FeatureType::Axis1D => 4,
            FeatureType::Axis2D => 8,
            FeatureType::Axis3D => 12,
            FeatureType::Rotation => 16,
            FeatureType::Invalid => 0,
        }
    }

    pub fn has_usage(&self, usage: &str) -> bool {
        self.usages.iter().any(|u| u == usage)
    }
}

/// Write-only view of a definition that is being filled.
///
/// Only ever lent out (`&mut`) for the duration of one `fill_device_definition` call.
#[derive(Debug)]
pub struct DeviceDefinitionBuilder {
    limits: DefinitionLimits,
    meta: DeviceMeta,
    features: Vec<FeatureDesc>,
}

impl DeviceDefinitionBuilder {
    pub fn new(limits: DefinitionLimits) -> Self {
        Self {
            limits,
            meta: DeviceMeta::default(),
            features: Vec::new(),
        }
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        self.limits.check_str(StringField::DeviceName, name)?;
        self.meta.name = Some(name.to_owned());
        Ok(())
    }

    pub fn set_role(&mut self, role: DeviceRole) -> Result<()> {
        if !role.is_assignable() {
            return Err(XrError::InvalidRole(role as u32));
        }
        self.meta.role = role;
        Ok(())
    }

    pub fn set_manufacturer(&mut self, manufacturer: &str) -> Result<()> {
        self.limits
            .check_str(StringField::Manufacturer, manufacturer)?;
        self.meta.manufacturer = Some(manufacturer.to_owned());
        Ok(())
    }

    pub fn set_serial_number(&mut self, serial: &str) -> Result<()> {
        self.limits.check_str(StringField::SerialNumber, serial)?;
        self.meta.serial_number = Some(serial.to_owned());
        Ok(())
    }

    /// Append a typed feature and return its index.
    ///
    /// Custom features must go through [`add_custom_feature`](Self::add_custom_feature).
    pub fn add_feature(&mut self, name: &str, feature_type: FeatureType) -> Result<FeatureIndex> {
        if matches!(feature_type, FeatureType::Custom | FeatureType::Invalid) {
            return Err(XrError::UnsupportedFeatureType(feature_type));
        }
        self.push(name, feature_type, 0, None)
    }

    /// Append an opaque blob feature of `size` bytes (`1..=128`).
    pub fn add_custom_feature(&mut self, name: &str, size: usize) -> Result<FeatureIndex> {
        if size == 0 || size > MAX_CUSTOM_FEATURE_SIZE {
            return Err(XrError::CustomSizeOutOfRange {
                size,
                max: MAX_CUSTOM_FEATURE_SIZE,
            });
        }
        self.push(name, FeatureType::Custom, size, None)
    }

    /// [`add_feature`](Self::add_feature) plus one usage hint, all or nothing.
    pub fn add_feature_with_usage(
        &mut self,
        name: &str,
        feature_type: FeatureType,
        usage: impl Into<FeatureUsage>,
    ) -> Result<FeatureIndex> {
        if matches!(feature_type, FeatureType::Custom | FeatureType::Invalid) {
            return Err(XrError::UnsupportedFeatureType(feature_type));
        }
        let usage = usage.into();
        self.limits.check_str(StringField::Usage, usage.as_str())?;
        self.push(name, feature_type, 0, Some(usage))
    }

    /// Attach a usage hint to an already added feature.
    ///
    /// Attaching a usage the feature already carries is a no-op.
    pub fn add_usage_at_index(
        &mut self,
        index: FeatureIndex,
        usage: impl Into<FeatureUsage>,
    ) -> Result<()> {
        let usage = usage.into();
        self.limits.check_str(StringField::Usage, usage.as_str())?;
        let feature = self
            .features
            .get_mut(index.as_usize())
            .ok_or(XrError::UnknownFeature(index))?;
        if !feature.usages.contains(&usage) {
            feature.usages.push(usage);
        }
        Ok(())
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Freeze into an immutable definition.
    pub fn finish(self) -> DeviceDefinition {
        DeviceDefinition {
            meta: self.meta,
            features: self.features,
        }
    }

    fn push(
        &mut self,
        name: &str,
        feature_type: FeatureType,
        custom_size: usize,
        usage: Option<FeatureUsage>,
    ) -> Result<FeatureIndex> {
        self.limits.check_str(StringField::FeatureName, name)?;
        if self.features.iter().any(|f| f.name == name) {
            return Err(XrError::DuplicateFeature(name.to_owned()));
        }
        // Capping below u32::MAX keeps the sentinel out of the index space.
        let cap = self.limits.max_features.min(u32::MAX as usize);
        if self.features.len() >= cap {
            return Err(XrError::FeatureCapacity(cap));
        }
        let index = FeatureIndex(self.features.len() as u32);
        self.features.push(FeatureDesc {
            name: name.to_owned(),
            feature_type,
            custom_size,
            usages: usage.into_iter().collect(),
        });
        Ok(index)
    }
}

/// Immutable capability description of one connected device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceDefinition {
    pub meta: DeviceMeta,
    features: Vec<FeatureDesc>,
}

impl DeviceDefinition {
    pub fn name(&self) -> Option<&str> {
        self.meta.name.as_deref()
    }

    pub fn role(&self) -> DeviceRole {
        self.meta.role
    }

    pub fn manufacturer(&self) -> Option<&str> {
        self.meta.manufacturer.as_deref()
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.meta.serial_number.as_deref()
    }

    /// Features in index order.
    pub fn features(&self) -> &[FeatureDesc] {
        &self.features
    }

    pub fn feature(&self, index: FeatureIndex) -> Option<&FeatureDesc> {
        self.features.get(index.as_usize())
    }

    pub fn find_feature(&self, name: &str) -> Option<FeatureIndex> {
        self.features
            .iter()
            .position(|f| f.name == name)
            .map(|i| FeatureIndex(i as u32))
    }

    /// First feature carrying `usage`.
    pub fn find_usage(&self, usage: &str) -> Option<FeatureIndex> {
        self.features
            .iter()
            .position(|f| f.has_usage(usage))
            .map(|i| FeatureIndex(i as u32))
    }

    /// Iterate `(index, feature)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureIndex, &FeatureDesc)> {
        self.features
            .iter()
            .enumerate()
            .map(|(i, f)| (FeatureIndex(i as u32), f))
    }
}
