//! Adapters from C vtables to the provider traits.

use std::ffi::c_void;
use std::sync::{Mutex, MutexGuard};

use super::types::{
    XrDeviceDefinition, XrDeviceState, XrInputProvider, XrLifecycleProvider, XrStatus, XrSubsystem,
};
use crate::device::DeviceDefinitionBuilder;
use crate::error::{Result, Status, XrError};
use crate::event::InputEvent;
use crate::feature::UpdateType;
use crate::handle::{DeviceId, SubsystemHandle};
use crate::lifecycle::{LifecycleProvider, SubsystemContext};
use crate::manager::ReregistrationPolicy;
use crate::provider::InputProvider;
use crate::state::DeviceStateWriter;
use crate::topology::DeviceNotifier;

#[derive(Default)]
struct Registration {
    pending: Option<XrInputProvider>,
    registered: bool,
}

/// What a C plugin's subsystem pointer refers to.
///
/// Opaque to C. Lives on the heap for as long as its
/// [`ForeignLifecycleProvider`], so plugins may keep the pointer and announce
/// devices from their own threads. The host drops the provider once the
/// subsystem is shut down or fails to initialize; the pointer is dangling after that.
pub struct ForeignSubsystem {
    notifier: DeviceNotifier,
    policy: ReregistrationPolicy,
    registration: Mutex<Registration>,
}

// SAFETY: the raw `user_data` in a staged provider table is never dereferenced
// by the host, only handed back to the plugin; all mutable state is behind a mutex.
unsafe impl Send for ForeignSubsystem {}
unsafe impl Sync for ForeignSubsystem {}

impl ForeignSubsystem {
    fn registration(&self) -> MutexGuard<'_, Registration> {
        self.registration
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn notifier(&self) -> &DeviceNotifier {
        &self.notifier
    }

    /// Hold a provider table until the current lifecycle callback returns.
    pub(crate) fn stage_input_provider(&self, provider: XrInputProvider) -> Result<()> {
        let mut reg = self.registration();
        if reg.registered && self.policy == ReregistrationPolicy::Reject {
            tracing::warn!(subsystem = %self.notifier.subsystem(), "input provider re-registration rejected");
            return Err(XrError::ProviderAlreadyRegistered(self.notifier.subsystem()));
        }
        reg.pending = Some(provider);
        reg.registered = true;
        Ok(())
    }

    fn take_pending(&self) -> Option<XrInputProvider> {
        self.registration().pending.take()
    }
}

fn check(op: &'static str, status: XrStatus) -> Result<()> {
    match status.to_status() {
        Status::Success => Ok(()),
        other => Err(XrError::provider(format!("{op} returned {other:?}"))),
    }
}

/// [`LifecycleProvider`] backed by a C vtable.
pub struct ForeignLifecycleProvider {
    vtable: XrLifecycleProvider,
    subsystem: Option<Box<ForeignSubsystem>>,
}

// SAFETY: the plugin contract requires its callbacks and `user_data` to be
// usable from whichever thread drives the host.
unsafe impl Send for ForeignLifecycleProvider {}

impl ForeignLifecycleProvider {
    /// # Safety
    ///
    /// Every non-null function pointer in `vtable` must be callable with the
    /// arguments documented on [`XrLifecycleProvider`], and `user_data` must
    /// stay valid until the provider is dropped.
    pub unsafe fn new(vtable: XrLifecycleProvider) -> Self {
        Self {
            vtable,
            subsystem: None,
        }
    }

    fn subsystem_ptr(&mut self) -> *mut XrSubsystem {
        self.subsystem
            .as_deref_mut()
            .map_or(std::ptr::null_mut(), |s| (s as *mut ForeignSubsystem).cast())
    }

    /// Hand any provider table registered during the last callback to the host.
    fn adopt_input_provider(&mut self, ctx: &mut SubsystemContext<'_>) -> Result<()> {
        let subsystem = self.subsystem_ptr();
        let Some(sub) = self.subsystem.as_deref() else {
            return Ok(());
        };
        if let Some(vtable) = sub.take_pending() {
            ctx.register_input_provider(Box::new(ForeignInputProvider { vtable, subsystem }))?;
        }
        Ok(())
    }
}

impl LifecycleProvider for ForeignLifecycleProvider {
    fn initialize(&mut self, ctx: &mut SubsystemContext<'_>) -> Result<()> {
        let init = self
            .vtable
            .initialize
            .ok_or_else(|| XrError::provider("plugin has no initialize callback"))?;
        self.subsystem = Some(Box::new(ForeignSubsystem {
            notifier: ctx.notifier().clone(),
            policy: ctx.reregistration_policy(),
            registration: Mutex::new(Registration {
                pending: None,
                registered: ctx.has_input_provider(),
            }),
        }));
        let sub = self.subsystem_ptr();
        // SAFETY: upheld by the caller of `new`; `sub` is heap-allocated and
        // owned by `self`.
        check("initialize", unsafe { init(sub, self.vtable.user_data) })?;
        self.adopt_input_provider(ctx)
    }

    fn start(&mut self, ctx: &mut SubsystemContext<'_>) -> Result<()> {
        let start = self
            .vtable
            .start
            .ok_or_else(|| XrError::provider("plugin has no start callback"))?;
        let sub = self.subsystem_ptr();
        // SAFETY: as in `initialize`.
        check("start", unsafe { start(sub, self.vtable.user_data) })?;
        self.adopt_input_provider(ctx)
    }

    fn stop(&mut self, _ctx: &mut SubsystemContext<'_>) {
        if let Some(stop) = self.vtable.stop {
            let sub = self.subsystem_ptr();
            // SAFETY: as in `initialize`.
            unsafe { stop(sub, self.vtable.user_data) };
        }
    }

    fn shutdown(&mut self, _ctx: &mut SubsystemContext<'_>) {
        if let Some(shutdown) = self.vtable.shutdown {
            let sub = self.subsystem_ptr();
            // SAFETY: as in `initialize`.
            unsafe { shutdown(sub, self.vtable.user_data) };
        }
    }
}

/// [`InputProvider`] backed by a C vtable registered from a lifecycle callback.
pub struct ForeignInputProvider {
    vtable: XrInputProvider,
    subsystem: *mut XrSubsystem,
}

// SAFETY: see `ForeignLifecycleProvider`.
unsafe impl Send for ForeignInputProvider {}

impl InputProvider for ForeignInputProvider {
    fn on_new_input_frame(&mut self, _subsystem: SubsystemHandle) {
        if let Some(f) = self.vtable.on_new_input_frame {
            // SAFETY: the table was registered by the plugin for this subsystem.
            unsafe { f(self.subsystem, self.vtable.user_data) };
        }
    }

    fn fill_device_definition(
        &mut self,
        _subsystem: SubsystemHandle,
        device: DeviceId,
        definition: &mut DeviceDefinitionBuilder,
    ) {
        let Some(f) = self.vtable.fill_device_definition else {
            return;
        };
        let def = (definition as *mut DeviceDefinitionBuilder).cast::<XrDeviceDefinition>();
        // SAFETY: `def` is only valid during this call, which the plugin contract requires.
        unsafe { f(self.subsystem, self.vtable.user_data, device.0, def) };
    }

    fn update_device_state(
        &mut self,
        _subsystem: SubsystemHandle,
        device: DeviceId,
        update: UpdateType,
        state: &mut DeviceStateWriter<'_>,
    ) -> Result<()> {
        let f = self
            .vtable
            .update_device_state
            .ok_or_else(|| XrError::provider("plugin has no update_device_state callback"))?;
        let ptr = (state as *mut DeviceStateWriter<'_>).cast::<XrDeviceState>();
        // SAFETY: `ptr` is only valid during this call, which the plugin contract requires.
        let status = unsafe { f(self.subsystem, self.vtable.user_data, device.0, update as u32, ptr) };
        check("update_device_state", status)
    }

    fn handle_event(
        &mut self,
        _subsystem: SubsystemHandle,
        device: DeviceId,
        event: &InputEvent,
    ) -> Result<()> {
        let f = self
            .vtable
            .handle_event
            .ok_or_else(|| XrError::provider("plugin has no handle_event callback"))?;
        let (tag, payload) = event.encode();
        // SAFETY: the payload outlives the call; the length fits an event payload.
        let status = unsafe {
            f(
                self.subsystem,
                self.vtable.user_data,
                tag,
                device.0,
                payload.as_ptr(),
                payload.len() as u32,
            )
        };
        check("handle_event", status)
    }
}
