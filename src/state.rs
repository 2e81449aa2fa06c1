//! Per-device state buffers.
//!
//! A [`DeviceState`] holds one [`FeatureValue`] slot per feature of a
//! [`DeviceDefinition`], in index order. Plugins never see the state directly;
//! during `update_device_state` they get a [`DeviceStateWriter`] that checks
//! each write against the declared feature type before touching a slot.

use serde::{Deserialize, Serialize};

use crate::device::DeviceDefinition;
use crate::error::{Result, XrError};
use crate::feature::{FeatureType, FeatureValue, Quaternion, TrackingState, Vector2, Vector3};
use crate::handle::FeatureIndex;

/// Values of one device, shaped by its definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    slots: Vec<FeatureValue>,
}

impl DeviceState {
    /// Fresh state with every slot at its initial value.
    pub fn new(definition: &DeviceDefinition) -> Self {
        let slots = definition
            .features()
            .iter()
            .filter_map(|f| FeatureValue::initial(f.feature_type, f.custom_size))
            .collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn value(&self, index: FeatureIndex) -> Option<&FeatureValue> {
        self.slots.get(index.as_usize())
    }

    pub fn values(&self) -> &[FeatureValue] {
        &self.slots
    }

    pub fn binary(&self, index: FeatureIndex) -> Option<bool> {
        match self.value(index)? {
            FeatureValue::Binary(v) => Some(*v),
            _ => None,
        }
    }

    pub fn discrete(&self, index: FeatureIndex) -> Option<u32> {
        match self.value(index)? {
            FeatureValue::DiscreteStates(v) => Some(*v),
            _ => None,
        }
    }

    pub fn axis1d(&self, index: FeatureIndex) -> Option<f32> {
        match self.value(index)? {
            FeatureValue::Axis1D(v) => Some(*v),
            _ => None,
        }
    }

    pub fn axis2d(&self, index: FeatureIndex) -> Option<Vector2> {
        match self.value(index)? {
            FeatureValue::Axis2D(v) => Some(*v),
            _ => None,
        }
    }

    pub fn axis3d(&self, index: FeatureIndex) -> Option<Vector3> {
        match self.value(index)? {
            FeatureValue::Axis3D(v) => Some(*v),
            _ => None,
        }
    }

    pub fn rotation(&self, index: FeatureIndex) -> Option<Quaternion> {
        match self.value(index)? {
            FeatureValue::Rotation(v) => Some(*v),
            _ => None,
        }
    }

    pub fn custom(&self, index: FeatureIndex) -> Option<&[u8]> {
        match self.value(index)? {
            FeatureValue::Custom(v) => Some(v),
            _ => None,
        }
    }

    /// Tracking flags stored in a discrete feature; unknown bits are dropped.
    pub fn tracking_state(&self, index: FeatureIndex) -> Option<TrackingState> {
        self.discrete(index).map(TrackingState::from_bits_truncate)
    }

    /// Borrow a writer over this state for one update call.
    pub fn writer<'a>(&'a mut self, definition: &'a DeviceDefinition) -> DeviceStateWriter<'a> {
        DeviceStateWriter {
            definition,
            slots: &mut self.slots,
        }
    }
}

/// Typed, bounds- and type-checked write access to one device's state.
///
/// Valid only for the duration of the `update_device_state` call it was lent to.
#[derive(Debug)]
pub struct DeviceStateWriter<'a> {
    definition: &'a DeviceDefinition,
    slots: &'a mut [FeatureValue],
}

impl<'a> DeviceStateWriter<'a> {
    /// The definition this state is laid out by.
    pub fn definition(&self) -> &'a DeviceDefinition {
        self.definition
    }

    fn slot(&mut self, index: FeatureIndex, written: FeatureType) -> Result<&mut FeatureValue> {
        let count = self.slots.len();
        let slot = self
            .slots
            .get_mut(index.as_usize())
            .ok_or(XrError::FeatureIndexOutOfRange { index, count })?;
        let declared = slot.feature_type();
        if declared != written {
            return Err(XrError::FeatureTypeMismatch {
                index,
                declared,
                written,
            });
        }
        Ok(slot)
    }

    /// Copy `bytes` into a custom feature; the length must equal the declared size.
    pub fn set_custom_value(&mut self, index: FeatureIndex, bytes: &[u8]) -> Result<()> {
        match self.slot(index, FeatureType::Custom)? {
            FeatureValue::Custom(buf) if buf.len() == bytes.len() => {
                buf.copy_from_slice(bytes);
                Ok(())
            }
            FeatureValue::Custom(buf) => Err(XrError::CustomSizeMismatch {
                index,
                declared: buf.len(),
                given: bytes.len(),
            }),
            _ => Err(XrError::UnknownFeature(index)),
        }
    }

    pub fn set_binary_value(&mut self, index: FeatureIndex, value: bool) -> Result<()> {
        *self.slot(index, FeatureType::Binary)? = FeatureValue::Binary(value);
        Ok(())
    }

    pub fn set_discrete_state_value(&mut self, index: FeatureIndex, value: u32) -> Result<()> {
        *self.slot(index, FeatureType::DiscreteStates)? = FeatureValue::DiscreteStates(value);
        Ok(())
    }

    pub fn set_axis1d_value(&mut self, index: FeatureIndex, value: f32) -> Result<()> {
        *self.slot(index, FeatureType::Axis1D)? = FeatureValue::Axis1D(value);
        Ok(())
    }

    pub fn set_axis2d_value(&mut self, index: FeatureIndex, value: Vector2) -> Result<()> {
        *self.slot(index, FeatureType::Axis2D)? = FeatureValue::Axis2D(value);
        Ok(())
    }

    pub fn set_axis3d_value(&mut self, index: FeatureIndex, value: Vector3) -> Result<()> {
        *self.slot(index, FeatureType::Axis3D)? = FeatureValue::Axis3D(value);
        Ok(())
    }

    pub fn set_rotation_value(&mut self, index: FeatureIndex, value: Quaternion) -> Result<()> {
        *self.slot(index, FeatureType::Rotation)? = FeatureValue::Rotation(value);
        Ok(())
    }

    /// Write tracking flags into a discrete-states feature.
    pub fn set_tracking_state(&mut self, index: FeatureIndex, state: TrackingState) -> Result<()> {
        self.set_discrete_state_value(index, state.bits())
    }

    /// Write any value whose variant matches the feature's declared type.
    pub fn set_value(&mut self, index: FeatureIndex, value: &FeatureValue) -> Result<()> {
        match value {
            FeatureValue::Custom(b) => self.set_custom_value(index, b),
            FeatureValue::Binary(v) => self.set_binary_value(index, *v),
            FeatureValue::DiscreteStates(v) => self.set_discrete_state_value(index, *v),
            FeatureValue::Axis1D(v) => self.set_axis1d_value(index, *v),
            FeatureValue::Axis2D(v) => self.set_axis2d_value(index, *v),
            FeatureValue::Axis3D(v) => self.set_axis3d_value(index, *v),
            FeatureValue::Rotation(v) => self.set_rotation_value(index, *v),
        }
    }
}
