//! Host registry.
//!
//! [`Manager`] owns every registered subsystem: its lifecycle provider, the
//! optional input provider it registered, the live device table and the
//! receiving end of its topology channel. The engine drives it from one
//! thread:
//!
//! ```no_run
//! # #[cfg(feature = "virtual")] {
//! use xrtether::{Manager, UpdateType};
//! use xrtether::backends::virtual_input::VirtualRig;
//!
//! let mut mgr = Manager::new();
//! let (rig, _handle) = VirtualRig::standard();
//! let sub = mgr.register_lifecycle_provider("virtual", "rig", rig)?;
//! mgr.initialize(sub)?;
//! mgr.start(sub)?;
//! loop {
//!     mgr.update(UpdateType::Dynamic);
//!     // ... simulate, then right before submitting the frame:
//!     mgr.update(UpdateType::BeforeRender);
//! #   break;
//! }
//! # }
//! # Ok::<(), xrtether::XrError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::HostConfig;
use crate::device::{DefinitionLimits, DeviceDefinition, DeviceDefinitionBuilder};
use crate::error::{Result, StringField, XrError};
use crate::event::InputEvent;
use crate::eventbus::{EventFilter, HostEvent, HostEventBus, HostListener, ListenerId};
use crate::feature::UpdateType;
use crate::handle::{DeviceId, SubsystemHandle};
use crate::lifecycle::{LifecycleOp, LifecycleProvider, LifecycleState, SubsystemContext};
use crate::provider::InputProvider;
use crate::snapshot::{DeviceSnapshot, Snapshot};
use crate::state::DeviceState;
use crate::topology::{self, DeviceNotifier, TopologyEvent, TopologyQueue};

/// What a second input-provider registration on the same subsystem does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReregistrationPolicy {
    /// Keep the first provider; the new registration fails with `Failure`.
    #[default]
    Reject,
    /// Swap in the new provider. Live devices and their definitions are kept.
    Replace,
}

struct LiveDevice {
    definition: Arc<DeviceDefinition>,
    state: DeviceState,
}

struct Subsystem {
    handle: SubsystemHandle,
    plugin_name: String,
    subsystem_id: String,
    state: LifecycleState,
    /// Released once the subsystem is shut down or unavailable.
    lifecycle: Option<Box<dyn LifecycleProvider>>,
    input: Option<Box<dyn InputProvider>>,
    notifier: DeviceNotifier,
    /// `None` after retirement, so late notifications fail on the sender side.
    topology: Option<TopologyQueue>,
    /// Connects received before an input provider was registered.
    pending: Vec<TopologyEvent>,
    devices: BTreeMap<DeviceId, LiveDevice>,
}

impl Subsystem {
    fn with_lifecycle<R>(
        &mut self,
        policy: ReregistrationPolicy,
        op: LifecycleOp,
        f: impl FnOnce(&mut dyn LifecycleProvider, &mut SubsystemContext<'_>) -> R,
    ) -> Result<R> {
        let Subsystem {
            handle,
            plugin_name,
            subsystem_id,
            state,
            lifecycle,
            input,
            notifier,
            ..
        } = self;
        let Some(lifecycle) = lifecycle.as_mut() else {
            return Err(XrError::InvalidTransition { op, state: *state });
        };
        let mut ctx = SubsystemContext {
            handle: *handle,
            plugin_name: plugin_name.as_str(),
            subsystem_id: subsystem_id.as_str(),
            notifier,
            policy,
            input,
        };
        Ok(f(lifecycle.as_mut(), &mut ctx))
    }

    fn set_state(&mut self, state: LifecycleState, bus: &mut HostEventBus) {
        self.state = state;
        tracing::info!(
            subsystem = %self.handle,
            plugin = %self.plugin_name,
            id = %self.subsystem_id,
            ?state,
            "lifecycle"
        );
        bus.emit(&HostEvent::LifecycleChanged {
            subsystem: self.handle,
            state,
        });
    }

    /// Apply every queued connect/disconnect.
    fn apply_topology(&mut self, limits: DefinitionLimits, bus: &mut HostEventBus) {
        let mut events = std::mem::take(&mut self.pending);
        if let Some(queue) = &self.topology {
            events.extend(queue.drain());
        }

        for event in events {
            match event {
                TopologyEvent::Connected(device) => {
                    if !device.is_valid() {
                        tracing::warn!(subsystem = %self.handle, "connect with invalid device id ignored");
                        continue;
                    }
                    if self.devices.contains_key(&device)
                        || self.pending.contains(&TopologyEvent::Connected(device))
                    {
                        tracing::warn!(subsystem = %self.handle, %device, "device already connected");
                        continue;
                    }
                    let Some(input) = self.input.as_mut() else {
                        self.pending.push(event);
                        continue;
                    };

                    let mut builder = DeviceDefinitionBuilder::new(limits);
                    input.fill_device_definition(self.handle, device, &mut builder);
                    let definition = Arc::new(builder.finish());
                    let state = DeviceState::new(&definition);
                    tracing::debug!(
                        subsystem = %self.handle,
                        %device,
                        features = definition.features().len(),
                        "device definition filled"
                    );
                    self.devices.insert(
                        device,
                        LiveDevice {
                            definition: Arc::clone(&definition),
                            state,
                        },
                    );
                    bus.emit(&HostEvent::DeviceConnected {
                        subsystem: self.handle,
                        device,
                        definition,
                    });
                }
                TopologyEvent::Disconnected(device) => {
                    if self.devices.remove(&device).is_some() {
                        bus.emit(&HostEvent::DeviceDisconnected {
                            subsystem: self.handle,
                            device,
                        });
                    } else if let Some(pos) = self
                        .pending
                        .iter()
                        .position(|e| *e == TopologyEvent::Connected(device))
                    {
                        self.pending.remove(pos);
                        tracing::debug!(subsystem = %self.handle, %device, "device left before it was defined");
                    } else {
                        tracing::warn!(subsystem = %self.handle, %device, "disconnect for unknown device ignored");
                    }
                }
            }
        }
    }

    /// Drop the providers and the topology receiver. Only the registration
    /// names and final state remain.
    fn retire(&mut self) {
        self.input = None;
        self.lifecycle = None;
        if let Some(queue) = self.topology.take() {
            let dropped = queue.drain().len();
            if dropped > 0 {
                tracing::debug!(subsystem = %self.handle, dropped, "topology events discarded at retirement");
            }
        }
    }

    fn disconnect_all(&mut self, bus: &mut HostEventBus) {
        self.pending.clear();
        for device in std::mem::take(&mut self.devices).into_keys() {
            bus.emit(&HostEvent::DeviceDisconnected {
                subsystem: self.handle,
                device,
            });
        }
    }

    fn poll(&mut self, update: UpdateType) {
        let handle = self.handle;
        let Some(input) = self.input.as_mut() else {
            return;
        };
        if update == UpdateType::Dynamic {
            input.on_new_input_frame(handle);
        }
        for (device, live) in self.devices.iter_mut() {
            let mut scratch = live.state.clone();
            let result = {
                let mut writer = scratch.writer(&live.definition);
                input.update_device_state(handle, *device, update, &mut writer)
            };
            match result {
                Ok(()) => live.state = scratch,
                Err(e) => {
                    tracing::warn!(subsystem = %handle, %device, ?update, error = %e, "device update failed; keeping previous state");
                }
            }
        }
    }
}

/// Host-side registry of subsystems and their providers.
pub struct Manager {
    config: HostConfig,
    next_handle: u32,
    subsystems: BTreeMap<SubsystemHandle, Subsystem>,
    bus: HostEventBus,
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl Manager {
    pub fn new() -> Self {
        Self::with_config(HostConfig::default())
    }

    pub fn with_config(config: HostConfig) -> Self {
        Self {
            config,
            next_handle: 0,
            subsystems: BTreeMap::new(),
            bus: HostEventBus::new(),
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    fn subsystem(&self, handle: SubsystemHandle) -> Result<&Subsystem> {
        self.subsystems
            .get(&handle)
            .ok_or(XrError::UnknownSubsystem(handle))
    }

    // ---- registration -------------------------------------------------

    /// Register a plugin's lifecycle provider under `plugin_name/subsystem_id`.
    ///
    /// The pair must be unique among subsystems that have not been shut down.
    pub fn register_lifecycle_provider(
        &mut self,
        plugin_name: &str,
        subsystem_id: &str,
        provider: impl LifecycleProvider + 'static,
    ) -> Result<SubsystemHandle> {
        self.register_boxed(plugin_name, subsystem_id, Box::new(provider))
    }

    pub fn register_boxed(
        &mut self,
        plugin_name: &str,
        subsystem_id: &str,
        provider: Box<dyn LifecycleProvider>,
    ) -> Result<SubsystemHandle> {
        let limits = self.config.definition_limits();
        limits.check_str(StringField::PluginName, plugin_name)?;
        limits.check_str(StringField::SubsystemId, subsystem_id)?;

        let clash = self.subsystems.values().any(|s| {
            s.plugin_name == plugin_name
                && s.subsystem_id == subsystem_id
                && !matches!(s.state, LifecycleState::Shutdown | LifecycleState::Unavailable)
        });
        if clash {
            return Err(XrError::DuplicateSubsystem {
                plugin: plugin_name.to_owned(),
                id: subsystem_id.to_owned(),
            });
        }

        let handle = SubsystemHandle::from_raw(self.next_handle);
        self.next_handle = self
            .next_handle
            .checked_add(1)
            .ok_or_else(|| XrError::provider("subsystem handles exhausted"))?;

        let (notifier, topology) = topology::channel(handle);
        self.subsystems.insert(
            handle,
            Subsystem {
                handle,
                plugin_name: plugin_name.to_owned(),
                subsystem_id: subsystem_id.to_owned(),
                state: LifecycleState::Uninitialized,
                lifecycle: Some(provider),
                input: None,
                notifier,
                topology: Some(topology),
                pending: Vec::new(),
                devices: BTreeMap::new(),
            },
        );
        tracing::info!(subsystem = %handle, plugin = plugin_name, id = subsystem_id, "lifecycle provider registered");
        Ok(handle)
    }

    /// Look up a subsystem that is not shut down by its registration names.
    pub fn find_subsystem(&self, plugin_name: &str, subsystem_id: &str) -> Option<SubsystemHandle> {
        self.subsystems
            .values()
            .find(|s| {
                s.plugin_name == plugin_name
                    && s.subsystem_id == subsystem_id
                    && !matches!(s.state, LifecycleState::Shutdown | LifecycleState::Unavailable)
            })
            .map(|s| s.handle)
    }

    /// Handles of all registered subsystems, in registration order.
    pub fn subsystems(&self) -> impl Iterator<Item = SubsystemHandle> + '_ {
        self.subsystems.keys().copied()
    }

    // ---- lifecycle ----------------------------------------------------

    pub fn lifecycle_state(&self, handle: SubsystemHandle) -> Result<LifecycleState> {
        Ok(self.subsystem(handle)?.state)
    }

    /// Run the provider's `initialize`. On failure the subsystem becomes
    /// [`LifecycleState::Unavailable`].
    pub fn initialize(&mut self, handle: SubsystemHandle) -> Result<()> {
        let policy = self.config.reregistration;
        let sub = self
            .subsystems
            .get_mut(&handle)
            .ok_or(XrError::UnknownSubsystem(handle))?;
        let next = sub.state.after(LifecycleOp::Initialize)?;
        match sub.with_lifecycle(policy, LifecycleOp::Initialize, |p, ctx| p.initialize(ctx))? {
            Ok(()) => {
                sub.set_state(next, &mut self.bus);
                Ok(())
            }
            Err(e) => {
                tracing::error!(subsystem = %handle, plugin = %sub.plugin_name, error = %e, "initialize failed");
                sub.retire();
                sub.set_state(LifecycleState::Unavailable, &mut self.bus);
                Err(e)
            }
        }
    }

    /// Run the provider's `start`. On failure the state is unchanged.
    pub fn start(&mut self, handle: SubsystemHandle) -> Result<()> {
        let policy = self.config.reregistration;
        let sub = self
            .subsystems
            .get_mut(&handle)
            .ok_or(XrError::UnknownSubsystem(handle))?;
        let next = sub.state.after(LifecycleOp::Start)?;
        match sub.with_lifecycle(policy, LifecycleOp::Start, |p, ctx| p.start(ctx))? {
            Ok(()) => {
                sub.set_state(next, &mut self.bus);
                Ok(())
            }
            Err(e) => {
                tracing::error!(subsystem = %handle, plugin = %sub.plugin_name, error = %e, "start failed");
                Err(e)
            }
        }
    }

    /// Run the provider's `stop`, then apply any topology changes it announced.
    pub fn stop(&mut self, handle: SubsystemHandle) -> Result<()> {
        let policy = self.config.reregistration;
        let limits = self.config.definition_limits();
        let sub = self
            .subsystems
            .get_mut(&handle)
            .ok_or(XrError::UnknownSubsystem(handle))?;
        let next = sub.state.after(LifecycleOp::Stop)?;
        sub.with_lifecycle(policy, LifecycleOp::Stop, |p, ctx| p.stop(ctx))?;
        sub.apply_topology(limits, &mut self.bus);
        sub.set_state(next, &mut self.bus);
        Ok(())
    }

    /// Run the provider's `shutdown`, stopping first if the subsystem is running.
    ///
    /// Remaining devices are disconnected, both providers are dropped and
    /// later topology notifications are discarded.
    pub fn shutdown(&mut self, handle: SubsystemHandle) -> Result<()> {
        if self.lifecycle_state(handle)? == LifecycleState::Started {
            self.stop(handle)?;
        }
        let policy = self.config.reregistration;
        let sub = self
            .subsystems
            .get_mut(&handle)
            .ok_or(XrError::UnknownSubsystem(handle))?;
        let next = sub.state.after(LifecycleOp::Shutdown)?;
        sub.with_lifecycle(policy, LifecycleOp::Shutdown, |p, ctx| p.shutdown(ctx))?;
        sub.disconnect_all(&mut self.bus);
        sub.retire();
        sub.set_state(next, &mut self.bus);
        Ok(())
    }

    /// Topology notifier of a subsystem, for host-side device announcements.
    pub fn notifier(&self, handle: SubsystemHandle) -> Result<DeviceNotifier> {
        Ok(self.subsystem(handle)?.notifier.clone())
    }

    // ---- polling ------------------------------------------------------

    /// Update every started subsystem.
    pub fn update(&mut self, update: UpdateType) {
        let limits = self.config.definition_limits();
        for sub in self.subsystems.values_mut() {
            if sub.state.is_running() {
                sub.apply_topology(limits, &mut self.bus);
                sub.poll(update);
            }
        }
    }

    /// Update one subsystem: apply queued topology changes, then poll every live device.
    ///
    /// Per-device failures are logged and leave that device's previous state in place.
    pub fn update_subsystem(&mut self, handle: SubsystemHandle, update: UpdateType) -> Result<()> {
        let limits = self.config.definition_limits();
        let sub = self
            .subsystems
            .get_mut(&handle)
            .ok_or(XrError::UnknownSubsystem(handle))?;
        if !sub.state.is_running() {
            return Err(XrError::NotRunning(handle));
        }
        sub.apply_topology(limits, &mut self.bus);
        sub.poll(update);
        Ok(())
    }

    // ---- events -------------------------------------------------------

    /// Decode a tagged event and deliver it to the subsystem's input provider.
    ///
    /// Nothing is delivered if decoding fails.
    pub fn send_event(
        &mut self,
        handle: SubsystemHandle,
        tag: u32,
        device: DeviceId,
        payload: &[u8],
    ) -> Result<()> {
        let event = InputEvent::decode(tag, payload)?;
        self.send_input_event(handle, device, &event)
    }

    /// Deliver an already decoded event to `device`, or to all devices with [`DeviceId::INVALID`].
    pub fn send_input_event(
        &mut self,
        handle: SubsystemHandle,
        device: DeviceId,
        event: &InputEvent,
    ) -> Result<()> {
        let sub = self
            .subsystems
            .get_mut(&handle)
            .ok_or(XrError::UnknownSubsystem(handle))?;
        if !sub.state.is_running() {
            return Err(XrError::NotRunning(handle));
        }
        if device.is_valid() && !sub.devices.contains_key(&device) {
            return Err(XrError::UnknownDevice {
                subsystem: handle,
                device,
            });
        }
        let input = sub.input.as_mut().ok_or(XrError::NotRunning(handle))?;
        tracing::debug!(subsystem = %handle, %device, ?event, "delivering event");
        input.handle_event(handle, device, event)
    }

    // ---- queries ------------------------------------------------------

    /// Live device ids in ascending order.
    pub fn devices(&self, handle: SubsystemHandle) -> Result<Vec<DeviceId>> {
        Ok(self.subsystem(handle)?.devices.keys().copied().collect())
    }

    pub fn definition(
        &self,
        handle: SubsystemHandle,
        device: DeviceId,
    ) -> Result<Arc<DeviceDefinition>> {
        self.subsystem(handle)?
            .devices
            .get(&device)
            .map(|d| Arc::clone(&d.definition))
            .ok_or(XrError::UnknownDevice {
                subsystem: handle,
                device,
            })
    }

    /// Last committed state of a live device.
    pub fn state(&self, handle: SubsystemHandle, device: DeviceId) -> Result<&DeviceState> {
        self.subsystem(handle)?
            .devices
            .get(&device)
            .map(|d| &d.state)
            .ok_or(XrError::UnknownDevice {
                subsystem: handle,
                device,
            })
    }

    pub fn snapshot(&self, handle: SubsystemHandle) -> Result<Snapshot> {
        let sub = self.subsystem(handle)?;
        Ok(Snapshot(
            sub.devices
                .iter()
                .map(|(id, d)| {
                    (
                        *id,
                        DeviceSnapshot {
                            definition: Arc::clone(&d.definition),
                            state: d.state.clone(),
                        },
                    )
                })
                .collect(),
        ))
    }

    // ---- listeners ----------------------------------------------------

    pub fn add_listener(
        &mut self,
        listener: impl HostListener + 'static,
        filter: EventFilter,
        tag: Option<SubsystemHandle>,
    ) -> ListenerId {
        self.bus.add_listener(listener, filter, tag)
    }

    pub fn enable_listener(&mut self, id: ListenerId) {
        self.bus.enable(id);
    }

    pub fn disable_listener(&mut self, id: ListenerId) {
        self.bus.disable(id);
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.bus.remove_listener(id)
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        let live: Vec<_> = self
            .subsystems
            .values()
            .filter(|s| {
                matches!(
                    s.state,
                    LifecycleState::Initialized | LifecycleState::Started | LifecycleState::Stopped
                )
            })
            .map(|s| s.handle)
            .collect();
        for handle in live {
            if let Err(e) = self.shutdown(handle) {
                tracing::warn!(subsystem = %handle, error = %e, "shutdown on drop failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureType;
    use crate::handle::FeatureIndex;
    use crate::state::DeviceStateWriter;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Calls(Mutex<Vec<String>>);

    impl Calls {
        fn push(&self, s: impl Into<String>) {
            if let Ok(mut v) = self.0.lock() {
                v.push(s.into());
            }
        }

        fn take(&self) -> Vec<String> {
            self.0.lock().map(|mut v| std::mem::take(&mut *v)).unwrap_or_default()
        }
    }

    struct Plugin {
        calls: Arc<Calls>,
        fail_init: bool,
        fail_start: bool,
    }

    struct Input {
        calls: Arc<Calls>,
        fail_updates: bool,
    }

    impl InputProvider for Input {
        fn on_new_input_frame(&mut self, _: SubsystemHandle) {
            self.calls.push("frame");
        }

        fn fill_device_definition(
            &mut self,
            _: SubsystemHandle,
            device: DeviceId,
            def: &mut DeviceDefinitionBuilder,
        ) {
            self.calls.push(format!("fill {}", device.0));
            let _ = def.add_feature("Button", FeatureType::Binary);
        }

        fn update_device_state(
            &mut self,
            _: SubsystemHandle,
            device: DeviceId,
            update: UpdateType,
            state: &mut DeviceStateWriter<'_>,
        ) -> Result<()> {
            self.calls.push(format!("update {} {update:?}", device.0));
            state.set_binary_value(FeatureIndex(0), true)?;
            if self.fail_updates {
                return Err(XrError::provider("sensor glitch"));
            }
            Ok(())
        }

        fn handle_event(&mut self, _: SubsystemHandle, device: DeviceId, event: &InputEvent) -> Result<()> {
            self.calls.push(format!("event {device} {:?}", event.event_type()));
            Ok(())
        }
    }

    impl LifecycleProvider for Plugin {
        fn initialize(&mut self, ctx: &mut SubsystemContext<'_>) -> Result<()> {
            self.calls.push("initialize");
            if self.fail_init {
                return Err(XrError::provider("no runtime"));
            }
            ctx.register_input_provider(Box::new(Input {
                calls: self.calls.clone(),
                fail_updates: false,
            }))
        }

        fn start(&mut self, _: &mut SubsystemContext<'_>) -> Result<()> {
            self.calls.push("start");
            if self.fail_start {
                return Err(XrError::provider("device busy"));
            }
            Ok(())
        }

        fn stop(&mut self, _: &mut SubsystemContext<'_>) {
            self.calls.push("stop");
        }

        fn shutdown(&mut self, _: &mut SubsystemContext<'_>) {
            self.calls.push("shutdown");
        }
    }

    fn plugin(calls: &Arc<Calls>) -> Plugin {
        Plugin {
            calls: calls.clone(),
            fail_init: false,
            fail_start: false,
        }
    }

    #[test]
    fn lifecycle_calls_reach_provider_in_order() -> Result<()> {
        let calls = Arc::new(Calls::default());
        let mut mgr = Manager::new();
        let h = mgr.register_lifecycle_provider("test", "input", plugin(&calls))?;
        assert!(mgr.start(h).is_err());
        mgr.initialize(h)?;
        mgr.start(h)?;
        mgr.stop(h)?;
        assert!(mgr.stop(h).is_err());
        mgr.start(h)?;
        mgr.shutdown(h)?;
        assert!(matches!(
            mgr.initialize(h),
            Err(XrError::InvalidTransition { .. })
        ));
        assert_eq!(
            calls.take(),
            ["initialize", "start", "stop", "start", "stop", "shutdown"]
        );
        assert_eq!(mgr.lifecycle_state(h)?, LifecycleState::Shutdown);
        Ok(())
    }

    #[test]
    fn initialize_failure_makes_subsystem_unavailable() -> Result<()> {
        let calls = Arc::new(Calls::default());
        let mut mgr = Manager::new();
        let h = mgr.register_lifecycle_provider(
            "test",
            "input",
            Plugin {
                fail_init: true,
                ..plugin(&calls)
            },
        )?;
        assert!(mgr.initialize(h).is_err());
        assert_eq!(mgr.lifecycle_state(h)?, LifecycleState::Unavailable);
        assert_eq!(Arc::strong_count(&calls), 1);
        assert!(mgr.subsystems[&h].topology.is_none());
        assert!(mgr.start(h).is_err());
        assert!(mgr.shutdown(h).is_err());
        drop(mgr);
        assert_eq!(calls.take(), ["initialize"]);
        Ok(())
    }

    #[test]
    fn start_failure_leaves_subsystem_unpolled() -> Result<()> {
        let calls = Arc::new(Calls::default());
        let mut mgr = Manager::new();
        let h = mgr.register_lifecycle_provider(
            "test",
            "input",
            Plugin {
                fail_start: true,
                ..plugin(&calls)
            },
        )?;
        mgr.initialize(h)?;
        mgr.notifier(h)?.device_connected(DeviceId(0));
        assert!(mgr.start(h).is_err());
        assert_eq!(mgr.lifecycle_state(h)?, LifecycleState::Initialized);
        assert!(matches!(
            mgr.update_subsystem(h, UpdateType::Dynamic),
            Err(XrError::NotRunning(_))
        ));
        mgr.update(UpdateType::Dynamic);
        assert!(mgr.devices(h)?.is_empty());
        Ok(())
    }

    #[test]
    fn definition_is_filled_once_before_first_update() -> Result<()> {
        let calls = Arc::new(Calls::default());
        let mut mgr = Manager::new();
        let h = mgr.register_lifecycle_provider("test", "input", plugin(&calls))?;
        mgr.initialize(h)?;
        mgr.start(h)?;
        calls.take();

        let n = mgr.notifier(h)?;
        n.device_connected(DeviceId(5));
        n.device_connected(DeviceId(5));
        mgr.update(UpdateType::Dynamic);
        mgr.update(UpdateType::BeforeRender);
        assert_eq!(
            calls.take(),
            ["fill 5", "frame", "update 5 Dynamic", "update 5 BeforeRender"]
        );
        assert_eq!(mgr.state(h, DeviceId(5))?.binary(FeatureIndex(0)), Some(true));

        n.device_disconnected(DeviceId(5));
        n.device_disconnected(DeviceId(5));
        mgr.update(UpdateType::Dynamic);
        assert!(mgr.devices(h)?.is_empty());
        assert!(mgr.state(h, DeviceId(5)).is_err());
        Ok(())
    }

    #[test]
    fn invalid_device_id_never_becomes_live() -> Result<()> {
        let calls = Arc::new(Calls::default());
        let mut mgr = Manager::new();
        let h = mgr.register_lifecycle_provider("test", "input", plugin(&calls))?;
        mgr.initialize(h)?;
        mgr.start(h)?;
        mgr.notifier(h)?.device_connected(DeviceId::INVALID);
        mgr.update(UpdateType::Dynamic);
        assert!(mgr.devices(h)?.is_empty());
        Ok(())
    }

    #[test]
    fn failed_update_keeps_previous_state() -> Result<()> {
        struct Flaky;
        impl LifecycleProvider for Flaky {
            fn initialize(&mut self, ctx: &mut SubsystemContext<'_>) -> Result<()> {
                ctx.register_input_provider(Box::new(Input {
                    calls: Arc::new(Calls::default()),
                    fail_updates: true,
                }))
            }
            fn start(&mut self, ctx: &mut SubsystemContext<'_>) -> Result<()> {
                ctx.notifier().device_connected(DeviceId(1));
                Ok(())
            }
            fn stop(&mut self, _: &mut SubsystemContext<'_>) {}
            fn shutdown(&mut self, _: &mut SubsystemContext<'_>) {}
        }

        let mut mgr = Manager::new();
        let h = mgr.register_lifecycle_provider("test", "flaky", Flaky)?;
        mgr.initialize(h)?;
        mgr.start(h)?;
        mgr.update_subsystem(h, UpdateType::Dynamic)?;
        assert_eq!(mgr.state(h, DeviceId(1))?.binary(FeatureIndex(0)), Some(false));
        Ok(())
    }

    #[test]
    fn duplicate_registration_names_are_rejected_until_shutdown() -> Result<()> {
        let calls = Arc::new(Calls::default());
        let mut mgr = Manager::new();
        let a = mgr.register_lifecycle_provider("test", "input", plugin(&calls))?;
        assert!(matches!(
            mgr.register_lifecycle_provider("test", "input", plugin(&calls)),
            Err(XrError::DuplicateSubsystem { .. })
        ));
        assert!(mgr.register_lifecycle_provider("", "input", plugin(&calls)).is_err());
        assert_eq!(mgr.find_subsystem("test", "input"), Some(a));
        mgr.initialize(a)?;
        mgr.shutdown(a)?;
        let b = mgr.register_lifecycle_provider("test", "input", plugin(&calls))?;
        assert_ne!(a, b);
        assert_eq!(mgr.subsystems().count(), 2);
        Ok(())
    }

    #[test]
    fn events_need_running_subsystem_and_live_target() -> Result<()> {
        let calls = Arc::new(Calls::default());
        let mut mgr = Manager::new();
        let h = mgr.register_lifecycle_provider("test", "input", plugin(&calls))?;
        mgr.initialize(h)?;
        let recenter = InputEvent::Recenter.encode();
        assert!(matches!(
            mgr.send_event(h, recenter.0, DeviceId::INVALID, &recenter.1),
            Err(XrError::NotRunning(_))
        ));
        mgr.start(h)?;
        mgr.notifier(h)?.device_connected(DeviceId(2));
        mgr.update(UpdateType::Dynamic);
        calls.take();

        mgr.send_event(h, recenter.0, DeviceId::INVALID, &recenter.1)?;
        mgr.send_event(h, recenter.0, DeviceId(2), &recenter.1)?;
        assert!(matches!(
            mgr.send_event(h, recenter.0, DeviceId(3), &recenter.1),
            Err(XrError::UnknownDevice { .. })
        ));
        assert_eq!(calls.take(), ["event <any> Recenter", "event 2 Recenter"]);
        Ok(())
    }

    #[test]
    fn shutdown_releases_providers_and_discards_late_topology() -> Result<()> {
        let calls = Arc::new(Calls::default());
        let mut mgr = Manager::new();
        let h = mgr.register_lifecycle_provider("test", "input", plugin(&calls))?;
        mgr.initialize(h)?;
        mgr.start(h)?;
        let notifier = mgr.notifier(h)?;
        mgr.shutdown(h)?;
        // Only the test's own handle is left once lifecycle and input providers are gone.
        assert_eq!(Arc::strong_count(&calls), 1);

        for i in 0..1000 {
            notifier.device_connected(DeviceId(i));
        }
        mgr.update(UpdateType::Dynamic);
        let sub = &mgr.subsystems[&h];
        assert!(sub.topology.is_none());
        assert!(sub.lifecycle.is_none() && sub.input.is_none());
        assert!(sub.pending.is_empty() && sub.devices.is_empty());
        assert!(matches!(
            mgr.shutdown(h),
            Err(XrError::InvalidTransition { .. })
        ));
        Ok(())
    }

    #[test]
    fn drop_shuts_down_running_subsystems() -> Result<()> {
        let calls = Arc::new(Calls::default());
        let mut mgr = Manager::new();
        let h = mgr.register_lifecycle_provider("test", "input", plugin(&calls))?;
        mgr.initialize(h)?;
        mgr.start(h)?;
        calls.take();
        drop(mgr);
        assert_eq!(calls.take(), ["stop", "shutdown"]);
        Ok(())
    }
}
