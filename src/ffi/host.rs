//! Host functions exported to C plugins through [`XrInputInterface`].

use std::ffi::{c_char, CStr};

use super::foreign::ForeignSubsystem;
use super::types::{
    XrDeviceDefinition, XrDeviceState, XrInputInterface, XrInputProvider, XrStatus, XrSubsystem,
};
use crate::device::DeviceDefinitionBuilder;
use crate::error::{Result, StringField, XrError};
use crate::feature::{FeatureType, Quaternion, Vector2, Vector3};
use crate::handle::{DeviceId, FeatureIndex};
use crate::metadata::DeviceRole;
use crate::state::DeviceStateWriter;

static INPUT_INTERFACE: XrInputInterface = XrInputInterface {
    register_input_provider,
    device_connected,
    device_disconnected,
    device_definition_set_name,
    device_definition_set_role,
    device_definition_set_manufacturer,
    device_definition_set_serial_number,
    device_definition_add_feature,
    device_definition_add_custom_feature,
    device_definition_add_feature_with_usage,
    device_definition_add_usage_at_index,
    device_state_set_custom_value,
    device_state_set_binary_value,
    device_state_set_discrete_state_value,
    device_state_set_axis1d_value,
    device_state_set_axis2d_value,
    device_state_set_axis3d_value,
    device_state_set_rotation_value,
};

/// Table of host functions for C plugins. The pointer is valid for the
/// lifetime of the process.
#[no_mangle]
pub extern "C" fn xrtether_input_interface() -> *const XrInputInterface {
    &INPUT_INTERFACE
}

// ---- pointer helpers ------------------------------------------------------

unsafe fn subsystem<'a>(ptr: *mut XrSubsystem) -> Result<&'a ForeignSubsystem> {
    // SAFETY: the plugin only holds subsystem pointers handed out by
    // `ForeignLifecycleProvider`, which keeps them alive until it is dropped.
    unsafe { ptr.cast::<ForeignSubsystem>().as_ref() }.ok_or(XrError::NullPointer("subsystem"))
}

unsafe fn builder<'a>(ptr: *mut XrDeviceDefinition) -> Result<&'a mut DeviceDefinitionBuilder> {
    // SAFETY: definition pointers are created from a `&mut DeviceDefinitionBuilder`
    // that outlives the `fill_device_definition` callback using them.
    unsafe { ptr.cast::<DeviceDefinitionBuilder>().as_mut() }
        .ok_or(XrError::NullPointer("device definition"))
}

unsafe fn writer<'a, 'w>(ptr: *mut XrDeviceState) -> Result<&'a mut DeviceStateWriter<'w>> {
    // SAFETY: state pointers are created from a `&mut DeviceStateWriter` that
    // outlives the `update_device_state` callback using them.
    unsafe { ptr.cast::<DeviceStateWriter<'w>>().as_mut() }
        .ok_or(XrError::NullPointer("device state"))
}

unsafe fn c_str<'a>(ptr: *const c_char, what: &'static str) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(XrError::NullPointer(what));
    }
    // SAFETY: non-null strings from the plugin are NUL-terminated and live
    // for the duration of the call.
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| XrError::InvalidUtf8(what))
}

/// String argument of a definition attribute setter; null reads as empty.
unsafe fn attribute<'a>(ptr: *const c_char, field: StringField, what: &'static str) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(XrError::EmptyString { field });
    }
    unsafe { c_str(ptr, what) }
}

fn status(op: &'static str, result: Result<()>) -> XrStatus {
    if let Err(e) = &result {
        tracing::debug!(op, error = %e, "host call from plugin failed");
    }
    result.into()
}

fn index(op: &'static str, result: Result<FeatureIndex>) -> u32 {
    match result {
        Ok(i) => i.0,
        Err(e) => {
            tracing::debug!(op, error = %e, "host call from plugin failed");
            FeatureIndex::INVALID.0
        }
    }
}

// ---- registration and topology --------------------------------------------

unsafe extern "C" fn register_input_provider(
    sub: *mut XrSubsystem,
    provider: *const XrInputProvider,
) -> XrStatus {
    status("register_input_provider", (|| -> Result<()> {
        let sub = unsafe { subsystem(sub) }?;
        // SAFETY: the plugin passes a pointer to a provider table it owns;
        // the table is copied before returning.
        let provider = unsafe { provider.as_ref() }.ok_or(XrError::NullPointer("input provider"))?;
        sub.stage_input_provider(*provider)
    })())
}

unsafe extern "C" fn device_connected(sub: *mut XrSubsystem, device: u32) -> XrStatus {
    status("device_connected", (|| -> Result<()> {
        let sub = unsafe { subsystem(sub) }?;
        let device = DeviceId(device);
        if !device.is_valid() {
            return Err(XrError::UnknownDevice {
                subsystem: sub.notifier().subsystem(),
                device,
            });
        }
        sub.notifier().device_connected(device);
        Ok(())
    })())
}

unsafe extern "C" fn device_disconnected(sub: *mut XrSubsystem, device: u32) -> XrStatus {
    status("device_disconnected", (|| -> Result<()> {
        let sub = unsafe { subsystem(sub) }?;
        let device = DeviceId(device);
        if !device.is_valid() {
            return Err(XrError::UnknownDevice {
                subsystem: sub.notifier().subsystem(),
                device,
            });
        }
        sub.notifier().device_disconnected(device);
        Ok(())
    })())
}

// ---- device definition ----------------------------------------------------

unsafe extern "C" fn device_definition_set_name(
    def: *mut XrDeviceDefinition,
    name: *const c_char,
) -> XrStatus {
    status("set_name", (|| -> Result<()> {
        let def = unsafe { builder(def) }?;
        def.set_name(unsafe { attribute(name, StringField::DeviceName, "device name") }?)
    })())
}

unsafe extern "C" fn device_definition_set_role(def: *mut XrDeviceDefinition, role: u32) -> XrStatus {
    status("set_role", (|| -> Result<()> {
        let def = unsafe { builder(def) }?;
        def.set_role(DeviceRole::try_from(role)?)
    })())
}

unsafe extern "C" fn device_definition_set_manufacturer(
    def: *mut XrDeviceDefinition,
    manufacturer: *const c_char,
) -> XrStatus {
    status("set_manufacturer", (|| -> Result<()> {
        let def = unsafe { builder(def) }?;
        def.set_manufacturer(unsafe { attribute(manufacturer, StringField::Manufacturer, "manufacturer") }?)
    })())
}

unsafe extern "C" fn device_definition_set_serial_number(
    def: *mut XrDeviceDefinition,
    serial: *const c_char,
) -> XrStatus {
    status("set_serial_number", (|| -> Result<()> {
        let def = unsafe { builder(def) }?;
        def.set_serial_number(unsafe {
            attribute(serial, StringField::SerialNumber, "serial number")
        }?)
    })())
}

unsafe extern "C" fn device_definition_add_feature(
    def: *mut XrDeviceDefinition,
    name: *const c_char,
    feature_type: u32,
) -> u32 {
    index("add_feature", (|| -> Result<FeatureIndex> {
        let def = unsafe { builder(def) }?;
        let name = unsafe { c_str(name, "feature name") }?;
        def.add_feature(name, FeatureType::from_raw(feature_type))
    })())
}

unsafe extern "C" fn device_definition_add_custom_feature(
    def: *mut XrDeviceDefinition,
    name: *const c_char,
    size: u32,
) -> u32 {
    index("add_custom_feature", (|| -> Result<FeatureIndex> {
        let def = unsafe { builder(def) }?;
        let name = unsafe { c_str(name, "feature name") }?;
        def.add_custom_feature(name, size as usize)
    })())
}

unsafe extern "C" fn device_definition_add_feature_with_usage(
    def: *mut XrDeviceDefinition,
    name: *const c_char,
    feature_type: u32,
    usage: *const c_char,
) -> u32 {
    index("add_feature_with_usage", (|| -> Result<FeatureIndex> {
        let def = unsafe { builder(def) }?;
        let name = unsafe { c_str(name, "feature name") }?;
        let usage = unsafe { c_str(usage, "usage hint") }?;
        def.add_feature_with_usage(name, FeatureType::from_raw(feature_type), usage.to_owned())
    })())
}

unsafe extern "C" fn device_definition_add_usage_at_index(
    def: *mut XrDeviceDefinition,
    feature: u32,
    usage: *const c_char,
) -> XrStatus {
    status("add_usage_at_index", (|| -> Result<()> {
        let def = unsafe { builder(def) }?;
        let usage = unsafe { c_str(usage, "usage hint") }?;
        def.add_usage_at_index(FeatureIndex(feature), usage.to_owned())
    })())
}

// ---- device state ---------------------------------------------------------

unsafe extern "C" fn device_state_set_custom_value(
    state: *mut XrDeviceState,
    feature: u32,
    data: *const u8,
    size: u32,
) -> XrStatus {
    status("set_custom_value", (|| -> Result<()> {
        let state = unsafe { writer(state) }?;
        let bytes: &[u8] = match (data.is_null(), size) {
            (_, 0) => &[],
            (true, _) => return Err(XrError::NullPointer("custom value")),
            // SAFETY: the plugin guarantees `data` points at `size` readable bytes.
            (false, n) => unsafe { std::slice::from_raw_parts(data, n as usize) },
        };
        state.set_custom_value(FeatureIndex(feature), bytes)
    })())
}

unsafe extern "C" fn device_state_set_binary_value(
    state: *mut XrDeviceState,
    feature: u32,
    value: bool,
) -> XrStatus {
    status("set_binary_value", (|| -> Result<()> {
        unsafe { writer(state) }?.set_binary_value(FeatureIndex(feature), value)
    })())
}

unsafe extern "C" fn device_state_set_discrete_state_value(
    state: *mut XrDeviceState,
    feature: u32,
    value: u32,
) -> XrStatus {
    status("set_discrete_state_value", (|| -> Result<()> {
        unsafe { writer(state) }?.set_discrete_state_value(FeatureIndex(feature), value)
    })())
}

unsafe extern "C" fn device_state_set_axis1d_value(
    state: *mut XrDeviceState,
    feature: u32,
    value: f32,
) -> XrStatus {
    status("set_axis1d_value", (|| -> Result<()> {
        unsafe { writer(state) }?.set_axis1d_value(FeatureIndex(feature), value)
    })())
}

unsafe extern "C" fn device_state_set_axis2d_value(
    state: *mut XrDeviceState,
    feature: u32,
    value: Vector2,
) -> XrStatus {
    status("set_axis2d_value", (|| -> Result<()> {
        unsafe { writer(state) }?.set_axis2d_value(FeatureIndex(feature), value)
    })())
}

unsafe extern "C" fn device_state_set_axis3d_value(
    state: *mut XrDeviceState,
    feature: u32,
    value: Vector3,
) -> XrStatus {
    status("set_axis3d_value", (|| -> Result<()> {
        unsafe { writer(state) }?.set_axis3d_value(FeatureIndex(feature), value)
    })())
}

unsafe extern "C" fn device_state_set_rotation_value(
    state: *mut XrDeviceState,
    feature: u32,
    value: Quaternion,
) -> XrStatus {
    status("set_rotation_value", (|| -> Result<()> {
        unsafe { writer(state) }?.set_rotation_value(FeatureIndex(feature), value)
    })())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DefinitionLimits;
    use std::ffi::CString;
    use std::ptr;

    fn api() -> &'static XrInputInterface {
        // SAFETY: points at a static.
        unsafe { &*xrtether_input_interface() }
    }

    #[test]
    fn null_pointers_are_invalid_arguments() {
        let api = api();
        unsafe {
            assert_eq!(
                (api.device_connected)(ptr::null_mut(), 1),
                XrStatus::INVALID_ARGUMENTS
            );
            assert_eq!(
                (api.device_definition_set_name)(ptr::null_mut(), c"x".as_ptr()),
                XrStatus::INVALID_ARGUMENTS
            );
            assert_eq!(
                (api.device_state_set_binary_value)(ptr::null_mut(), 0, true),
                XrStatus::INVALID_ARGUMENTS
            );
        }
    }

    #[test]
    fn null_attribute_strings_fail_like_oversized_ones() {
        let api = api();
        let mut b = DeviceDefinitionBuilder::new(DefinitionLimits::default());
        let def = (&mut b as *mut DeviceDefinitionBuilder).cast::<XrDeviceDefinition>();
        let long = CString::new("x".repeat(200)).unwrap_or_default();
        unsafe {
            assert_eq!(
                (api.device_definition_set_name)(def, ptr::null()),
                XrStatus::FAILURE
            );
            assert_eq!(
                (api.device_definition_set_name)(def, long.as_ptr()),
                XrStatus::FAILURE
            );
            assert_eq!(
                (api.device_definition_set_manufacturer)(def, ptr::null()),
                XrStatus::FAILURE
            );
            assert_eq!(
                (api.device_definition_set_serial_number)(def, ptr::null()),
                XrStatus::FAILURE
            );
            assert_eq!(
                (api.device_definition_set_role)(def, 42),
                XrStatus::INVALID_ARGUMENTS
            );
        }
        let finished = b.finish();
        assert_eq!(finished.name(), None);
    }

    #[test]
    fn null_feature_name_yields_sentinel_and_leaves_count() {
        let api = api();
        let mut b = DeviceDefinitionBuilder::new(DefinitionLimits::default());
        let def = (&mut b as *mut DeviceDefinitionBuilder).cast::<XrDeviceDefinition>();
        unsafe {
            assert_eq!((api.device_definition_add_feature)(def, c"a".as_ptr(), 1), 0);
            assert_eq!(
                (api.device_definition_add_feature)(def, ptr::null(), 1),
                FeatureIndex::INVALID.0
            );
            assert_eq!(
                (api.device_definition_add_custom_feature)(def, c"blob".as_ptr(), 129),
                FeatureIndex::INVALID.0
            );
            assert_eq!(
                (api.device_definition_add_custom_feature)(def, c"blob".as_ptr(), 128),
                1
            );
            assert_eq!(
                (api.device_definition_set_role)(def, 42),
                XrStatus::INVALID_ARGUMENTS
            );
        }
        assert_eq!(b.feature_count(), 2);
    }

    #[test]
    fn custom_value_with_null_data_and_zero_size_reaches_size_check() {
        let api = api();
        let mut b = DeviceDefinitionBuilder::new(DefinitionLimits::default());
        let _ = b.add_custom_feature("blob", 4);
        let def = b.finish();
        let mut state = crate::state::DeviceState::new(&def);
        let mut w = state.writer(&def);
        let ptr = (&mut w as *mut DeviceStateWriter<'_>).cast::<XrDeviceState>();
        unsafe {
            assert_eq!(
                (api.device_state_set_custom_value)(ptr, 0, ptr::null(), 0),
                XrStatus::FAILURE
            );
            assert_eq!(
                (api.device_state_set_custom_value)(ptr, 0, ptr::null(), 4),
                XrStatus::INVALID_ARGUMENTS
            );
            let bytes = [9u8, 8, 7, 6];
            assert_eq!(
                (api.device_state_set_custom_value)(ptr, 0, bytes.as_ptr(), 4),
                XrStatus::SUCCESS
            );
        }
        assert_eq!(state.custom(FeatureIndex(0)), Some(&[9u8, 8, 7, 6][..]));
    }
}
