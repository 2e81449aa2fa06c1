use std::ffi::{c_char, c_void};

use crate::error::{Result, Status};
use crate::feature::{Quaternion, Vector2, Vector3};

/// Status code as it crosses the C boundary.
///
/// Unlike [`Status`] this accepts any `u32` a plugin may return; unknown
/// values read as [`Status::Failure`].
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct XrStatus(pub u32);

impl XrStatus {
    pub const SUCCESS: Self = Self(Status::Success as u32);
    pub const FAILURE: Self = Self(Status::Failure as u32);
    pub const INVALID_ARGUMENTS: Self = Self(Status::InvalidArguments as u32);

    pub fn to_status(self) -> Status {
        match self.0 {
            0 => Status::Success,
            2 => Status::InvalidArguments,
            _ => Status::Failure,
        }
    }
}

impl From<Status> for XrStatus {
    fn from(s: Status) -> Self {
        Self(s as u32)
    }
}

impl From<Result<()>> for XrStatus {
    fn from(r: Result<()>) -> Self {
        Status::from(r).into()
    }
}

/// Opaque subsystem a C plugin talks about; valid from `initialize` until
/// its lifecycle provider is dropped.
#[repr(C)]
pub struct XrSubsystem {
    _private: [u8; 0],
}

/// Opaque device definition under construction.
#[repr(C)]
pub struct XrDeviceDefinition {
    _private: [u8; 0],
}

/// Opaque device state being written.
#[repr(C)]
pub struct XrDeviceState {
    _private: [u8; 0],
}

pub type XrLifecycleFn = unsafe extern "C" fn(*mut XrSubsystem, *mut c_void) -> XrStatus;
pub type XrLifecycleVoidFn = unsafe extern "C" fn(*mut XrSubsystem, *mut c_void);

/// Lifecycle callbacks of a C plugin.
///
/// `user_data` is passed back unchanged on every call.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct XrLifecycleProvider {
    pub user_data: *mut c_void,
    pub initialize: Option<XrLifecycleFn>,
    pub start: Option<XrLifecycleFn>,
    pub stop: Option<XrLifecycleVoidFn>,
    pub shutdown: Option<XrLifecycleVoidFn>,
}

/// Input callbacks of a C plugin.
///
/// Device ids, update types and event tags travel as raw `u32`s.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct XrInputProvider {
    pub user_data: *mut c_void,
    pub on_new_input_frame: Option<XrLifecycleVoidFn>,
    pub fill_device_definition: Option<
        unsafe extern "C" fn(*mut XrSubsystem, *mut c_void, u32, *mut XrDeviceDefinition),
    >,
    pub update_device_state: Option<
        unsafe extern "C" fn(*mut XrSubsystem, *mut c_void, u32, u32, *mut XrDeviceState) -> XrStatus,
    >,
    pub handle_event: Option<
        unsafe extern "C" fn(*mut XrSubsystem, *mut c_void, u32, u32, *const u8, u32) -> XrStatus,
    >,
}

/// Host functions available to a C plugin.
///
/// The `add_*` functions return the new feature index, or `u32::MAX` on failure.
#[repr(C)]
pub struct XrInputInterface {
    pub register_input_provider:
        unsafe extern "C" fn(*mut XrSubsystem, *const XrInputProvider) -> XrStatus,
    pub device_connected: unsafe extern "C" fn(*mut XrSubsystem, u32) -> XrStatus,
    pub device_disconnected: unsafe extern "C" fn(*mut XrSubsystem, u32) -> XrStatus,

    pub device_definition_set_name:
        unsafe extern "C" fn(*mut XrDeviceDefinition, *const c_char) -> XrStatus,
    pub device_definition_set_role: unsafe extern "C" fn(*mut XrDeviceDefinition, u32) -> XrStatus,
    pub device_definition_set_manufacturer:
        unsafe extern "C" fn(*mut XrDeviceDefinition, *const c_char) -> XrStatus,
    pub device_definition_set_serial_number:
        unsafe extern "C" fn(*mut XrDeviceDefinition, *const c_char) -> XrStatus,
    pub device_definition_add_feature:
        unsafe extern "C" fn(*mut XrDeviceDefinition, *const c_char, u32) -> u32,
    pub device_definition_add_custom_feature:
        unsafe extern "C" fn(*mut XrDeviceDefinition, *const c_char, u32) -> u32,
    pub device_definition_add_feature_with_usage:
        unsafe extern "C" fn(*mut XrDeviceDefinition, *const c_char, u32, *const c_char) -> u32,
    pub device_definition_add_usage_at_index:
        unsafe extern "C" fn(*mut XrDeviceDefinition, u32, *const c_char) -> XrStatus,

    pub device_state_set_custom_value:
        unsafe extern "C" fn(*mut XrDeviceState, u32, *const u8, u32) -> XrStatus,
    pub device_state_set_binary_value: unsafe extern "C" fn(*mut XrDeviceState, u32, bool) -> XrStatus,
    pub device_state_set_discrete_state_value:
        unsafe extern "C" fn(*mut XrDeviceState, u32, u32) -> XrStatus,
    pub device_state_set_axis1d_value: unsafe extern "C" fn(*mut XrDeviceState, u32, f32) -> XrStatus,
    pub device_state_set_axis2d_value:
        unsafe extern "C" fn(*mut XrDeviceState, u32, Vector2) -> XrStatus,
    pub device_state_set_axis3d_value:
        unsafe extern "C" fn(*mut XrDeviceState, u32, Vector3) -> XrStatus,
    pub device_state_set_rotation_value:
        unsafe extern "C" fn(*mut XrDeviceState, u32, Quaternion) -> XrStatus,
}

const PTR: usize = std::mem::size_of::<*const c_void>();

static_assertions::assert_eq_size!(XrStatus, u32);
static_assertions::const_assert_eq!(std::mem::size_of::<Option<XrLifecycleFn>>(), PTR);
static_assertions::const_assert_eq!(std::mem::size_of::<XrLifecycleProvider>(), 5 * PTR);
static_assertions::const_assert_eq!(std::mem::size_of::<XrInputProvider>(), 5 * PTR);
static_assertions::const_assert_eq!(std::mem::size_of::<XrInputInterface>(), 18 * PTR);
