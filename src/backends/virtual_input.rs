//! Scriptable in-process XR rig.
//!
//! [`VirtualRig`] is a complete plugin, lifecycle and input provider, that
//! reports devices described by [`VirtualDeviceSpec`]s. Values are pushed in
//! from the outside through a cloneable [`VirtualRigHandle`], from any thread,
//! which makes it the stand-in for real hardware in tests and demos.
//!
//! Behavior:
//! - `start` connects every configured device, `stop` disconnects them.
//! - Before-render polls only write pose features (see [`usage::POSE_USAGES`]).
//! - `Recenter` zeroes stored device positions; `SimpleRumble` is recorded per device.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::ConfigError;
use crate::device::DeviceDefinitionBuilder;
use crate::error::{Result, XrError};
use crate::event::InputEvent;
use crate::feature::{FeatureType, FeatureValue, Quaternion, TrackingState, UpdateType, Vector3};
use crate::handle::{DeviceId, SubsystemHandle};
use crate::lifecycle::{LifecycleProvider, SubsystemContext};
use crate::metadata::DeviceRole;
use crate::provider::InputProvider;
use crate::state::DeviceStateWriter;
use crate::topology::DeviceNotifier;
use crate::usage;

/// One feature of a virtual device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VirtualFeatureSpec {
    pub name: String,
    pub feature_type: FeatureType,
    /// Only used by custom features.
    #[serde(default)]
    pub custom_size: usize,
    #[serde(default)]
    pub usages: Vec<String>,
}

/// Static description of a virtual device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VirtualDeviceSpec {
    pub id: DeviceId,
    pub name: String,
    #[serde(default)]
    pub role: DeviceRole,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub features: Vec<VirtualFeatureSpec>,
}

impl VirtualDeviceSpec {
    pub fn new(id: DeviceId, name: &str, role: DeviceRole) -> Self {
        Self {
            id,
            name: name.to_owned(),
            role,
            manufacturer: Some("Belegrade Virtual".to_owned()),
            serial_number: Some(format!("VIRT-{:04}", id.0)),
            features: Vec::new(),
        }
    }

    /// Append a typed feature carrying `usages`.
    pub fn feature(mut self, name: &str, feature_type: FeatureType, usages: &[&str]) -> Self {
        self.features.push(VirtualFeatureSpec {
            name: name.to_owned(),
            feature_type,
            custom_size: 0,
            usages: usages.iter().map(|u| (*u).to_owned()).collect(),
        });
        self
    }

    pub fn custom_feature(mut self, name: &str, size: usize) -> Self {
        self.features.push(VirtualFeatureSpec {
            name: name.to_owned(),
            feature_type: FeatureType::Custom,
            custom_size: size,
            usages: Vec::new(),
        });
        self
    }

    /// Head-mounted display with a tracked center-eye pose.
    pub fn hmd(id: DeviceId) -> Self {
        Self::new(id, "Virtual HMD", DeviceRole::Generic)
            .feature("IsTracked", FeatureType::Binary, &[usage::IS_TRACKED])
            .feature("TrackingState", FeatureType::DiscreteStates, &[usage::TRACKING_STATE])
            .feature(
                "CenterEyePosition",
                FeatureType::Axis3D,
                &[usage::DEVICE_POSITION, usage::CENTER_EYE_POSITION],
            )
            .feature(
                "CenterEyeRotation",
                FeatureType::Rotation,
                &[usage::DEVICE_ROTATION, usage::CENTER_EYE_ROTATION],
            )
    }

    /// Six-DoF hand controller with the usual buttons and axes.
    pub fn controller(id: DeviceId, role: DeviceRole) -> Self {
        let name = match role {
            DeviceRole::LeftHanded => "Virtual Controller (Left)",
            DeviceRole::RightHanded => "Virtual Controller (Right)",
            _ => "Virtual Controller",
        };
        Self::new(id, name, role)
            .feature("IsTracked", FeatureType::Binary, &[usage::IS_TRACKED])
            .feature("TrackingState", FeatureType::DiscreteStates, &[usage::TRACKING_STATE])
            .feature("Position", FeatureType::Axis3D, &[usage::DEVICE_POSITION])
            .feature("Rotation", FeatureType::Rotation, &[usage::DEVICE_ROTATION])
            .feature("Trigger", FeatureType::Axis1D, &[usage::TRIGGER])
            .feature("Grip", FeatureType::Axis1D, &[usage::GRIP])
            .feature("Primary", FeatureType::Binary, &[usage::PRIMARY_BUTTON])
            .feature("Secondary", FeatureType::Binary, &[usage::SECONDARY_BUTTON])
            .feature("Menu", FeatureType::Binary, &[usage::MENU_BUTTON])
            .feature("Thumbstick", FeatureType::Axis2D, &[usage::PRIMARY_2D_AXIS])
            .feature(
                "ThumbstickClick",
                FeatureType::Binary,
                &[usage::PRIMARY_2D_AXIS_CLICK],
            )
            .feature("Battery", FeatureType::Axis1D, &[usage::BATTERY_LEVEL])
    }

    fn feature_spec(&self, name: &str) -> Option<&VirtualFeatureSpec> {
        self.features.iter().find(|f| f.name == name)
    }

    fn features_with_usage<'a>(&'a self, wanted: &'a str) -> impl Iterator<Item = &'a VirtualFeatureSpec> + 'a {
        self.features
            .iter()
            .filter(move |f| f.usages.iter().any(|u| u == wanted))
    }
}

/// TOML-loadable rig description: a list of `[[devices]]`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VirtualRigConfig {
    #[serde(default)]
    pub devices: Vec<VirtualDeviceSpec>,
}

impl VirtualRigConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }
}

#[derive(Default)]
struct RigState {
    specs: BTreeMap<DeviceId, VirtualDeviceSpec>,
    values: BTreeMap<DeviceId, HashMap<String, FeatureValue>>,
    connected: BTreeSet<DeviceId>,
    notifier: Option<DeviceNotifier>,
    rumble: HashMap<DeviceId, (f32, f32)>,
    recenters: u32,
    frames: u64,
}

impl RigState {
    fn connect(&mut self, device: DeviceId) -> Result<()> {
        if !self.specs.contains_key(&device) {
            return Err(XrError::provider(format!("no virtual device {device}")));
        }
        let notifier = self
            .notifier
            .as_ref()
            .ok_or_else(|| XrError::provider("rig is not initialized"))?;
        if self.connected.insert(device) {
            notifier.device_connected(device);
        }
        Ok(())
    }

    fn disconnect(&mut self, device: DeviceId) {
        if self.connected.remove(&device) {
            if let Some(n) = &self.notifier {
                n.device_disconnected(device);
            }
        }
    }

    fn targets(&self, device: DeviceId) -> Vec<DeviceId> {
        if device.is_valid() {
            vec![device]
        } else {
            self.connected.iter().copied().collect()
        }
    }
}

fn initial_values(spec: &VirtualDeviceSpec) -> HashMap<String, FeatureValue> {
    let mut values = HashMap::new();
    for f in &spec.features {
        if f.usages.iter().any(|u| u == usage::IS_TRACKED) && f.feature_type == FeatureType::Binary {
            values.insert(f.name.clone(), FeatureValue::Binary(true));
        }
        if f.usages.iter().any(|u| u == usage::TRACKING_STATE)
            && f.feature_type == FeatureType::DiscreteStates
        {
            let pose = TrackingState::POSITION | TrackingState::ROTATION;
            values.insert(f.name.clone(), FeatureValue::DiscreteStates(pose.bits()));
        }
    }
    values
}

type Shared = Arc<Mutex<RigState>>;

fn lock(shared: &Shared) -> MutexGuard<'_, RigState> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Lifecycle half of the virtual plugin.
pub struct VirtualRig {
    shared: Shared,
}

impl VirtualRig {
    pub fn new(devices: Vec<VirtualDeviceSpec>) -> (Self, VirtualRigHandle) {
        let mut state = RigState::default();
        for spec in devices {
            state.values.insert(spec.id, initial_values(&spec));
            state.specs.insert(spec.id, spec);
        }
        let shared = Arc::new(Mutex::new(state));
        (
            Self {
                shared: Arc::clone(&shared),
            },
            VirtualRigHandle { shared },
        )
    }

    /// HMD (id 0) plus left (id 1) and right (id 2) controllers.
    pub fn standard() -> (Self, VirtualRigHandle) {
        Self::new(vec![
            VirtualDeviceSpec::hmd(DeviceId(0)),
            VirtualDeviceSpec::controller(DeviceId(1), DeviceRole::LeftHanded),
            VirtualDeviceSpec::controller(DeviceId(2), DeviceRole::RightHanded),
        ])
    }

    pub fn from_config(config: VirtualRigConfig) -> (Self, VirtualRigHandle) {
        Self::new(config.devices)
    }
}

impl LifecycleProvider for VirtualRig {
    fn initialize(&mut self, ctx: &mut SubsystemContext<'_>) -> Result<()> {
        lock(&self.shared).notifier = Some(ctx.notifier().clone());
        ctx.register_input_provider(Box::new(VirtualInput {
            shared: Arc::clone(&self.shared),
        }))
    }

    fn start(&mut self, _ctx: &mut SubsystemContext<'_>) -> Result<()> {
        let mut rig = lock(&self.shared);
        let ids: Vec<_> = rig.specs.keys().copied().collect();
        for id in ids {
            rig.connect(id)?;
        }
        Ok(())
    }

    fn stop(&mut self, _ctx: &mut SubsystemContext<'_>) {
        let mut rig = lock(&self.shared);
        let ids: Vec<_> = rig.connected.iter().copied().collect();
        for id in ids {
            rig.disconnect(id);
        }
    }

    fn shutdown(&mut self, _ctx: &mut SubsystemContext<'_>) {
        let mut rig = lock(&self.shared);
        rig.notifier = None;
        rig.connected.clear();
        rig.rumble.clear();
    }
}

/// Input half of the virtual plugin.
struct VirtualInput {
    shared: Shared,
}

impl InputProvider for VirtualInput {
    fn on_new_input_frame(&mut self, _subsystem: SubsystemHandle) {
        lock(&self.shared).frames += 1;
    }

    fn fill_device_definition(
        &mut self,
        subsystem: SubsystemHandle,
        device: DeviceId,
        def: &mut DeviceDefinitionBuilder,
    ) {
        let rig = lock(&self.shared);
        let Some(spec) = rig.specs.get(&device) else {
            tracing::warn!(%subsystem, %device, "definition requested for unknown virtual device");
            return;
        };
        if let Err(e) = fill(spec, def) {
            tracing::warn!(%subsystem, %device, error = %e, "virtual device definition incomplete");
        }
    }

    fn update_device_state(
        &mut self,
        _subsystem: SubsystemHandle,
        device: DeviceId,
        update: UpdateType,
        state: &mut DeviceStateWriter<'_>,
    ) -> Result<()> {
        let rig = lock(&self.shared);
        let values = rig
            .values
            .get(&device)
            .ok_or_else(|| XrError::provider(format!("no virtual device {device}")))?;
        let definition = state.definition();
        for (index, feature) in definition.iter() {
            if update == UpdateType::BeforeRender
                && !feature.usages.iter().any(|u| usage::is_pose_usage(u.as_str()))
            {
                continue;
            }
            if let Some(value) = values.get(&feature.name) {
                state.set_value(index, value)?;
            }
        }
        Ok(())
    }

    fn handle_event(
        &mut self,
        subsystem: SubsystemHandle,
        device: DeviceId,
        event: &InputEvent,
    ) -> Result<()> {
        let mut rig = lock(&self.shared);
        let targets = rig.targets(device);
        match *event {
            InputEvent::Recenter => {
                for id in &targets {
                    let positions: Vec<String> = rig
                        .specs
                        .get(id)
                        .map(|s| {
                            s.features_with_usage(usage::DEVICE_POSITION)
                                .filter(|f| f.feature_type == FeatureType::Axis3D)
                                .map(|f| f.name.clone())
                                .collect()
                        })
                        .unwrap_or_default();
                    if let Some(values) = rig.values.get_mut(id) {
                        for name in positions {
                            values.insert(name, FeatureValue::Axis3D(Vector3::ZERO));
                        }
                    }
                }
                rig.recenters += 1;
                tracing::debug!(%subsystem, %device, "virtual rig recentered");
            }
            InputEvent::SimpleRumble {
                amplitude,
                duration,
            } => {
                for id in targets {
                    rig.rumble.insert(id, (amplitude, duration));
                }
            }
        }
        Ok(())
    }
}

fn fill(spec: &VirtualDeviceSpec, def: &mut DeviceDefinitionBuilder) -> Result<()> {
    def.set_name(&spec.name)?;
    def.set_role(spec.role)?;
    if let Some(m) = &spec.manufacturer {
        def.set_manufacturer(m)?;
    }
    if let Some(s) = &spec.serial_number {
        def.set_serial_number(s)?;
    }
    for f in &spec.features {
        let index = match (f.feature_type, f.usages.split_first()) {
            (FeatureType::Custom, _) => def.add_custom_feature(&f.name, f.custom_size)?,
            (ty, None) => def.add_feature(&f.name, ty)?,
            (ty, Some((first, _))) => def.add_feature_with_usage(&f.name, ty, first.clone())?,
        };
        let rest = match f.feature_type {
            FeatureType::Custom => &f.usages[..],
            _ => f.usages.get(1..).unwrap_or(&[]),
        };
        for u in rest {
            def.add_usage_at_index(index, u.clone())?;
        }
    }
    Ok(())
}

/// Cloneable remote control of a [`VirtualRig`].
#[derive(Clone)]
pub struct VirtualRigHandle {
    shared: Shared,
}

impl VirtualRigHandle {
    /// Set the value reported for `feature`; the variant must match its declared type.
    pub fn set_value(&self, device: DeviceId, feature: &str, value: FeatureValue) -> Result<()> {
        let mut rig = lock(&self.shared);
        let spec = rig
            .specs
            .get(&device)
            .ok_or_else(|| XrError::provider(format!("no virtual device {device}")))?;
        let f = spec
            .feature_spec(feature)
            .ok_or_else(|| XrError::provider(format!("no feature `{feature}` on {device}")))?;
        if f.feature_type != value.feature_type() {
            return Err(XrError::provider(format!(
                "`{feature}` is {:?}, not {:?}",
                f.feature_type,
                value.feature_type()
            )));
        }
        if let FeatureValue::Custom(bytes) = &value {
            if bytes.len() != f.custom_size {
                return Err(XrError::provider(format!(
                    "`{feature}` holds {} bytes, got {}",
                    f.custom_size,
                    bytes.len()
                )));
            }
        }
        rig.values
            .entry(device)
            .or_default()
            .insert(feature.to_owned(), value);
        Ok(())
    }

    pub fn press(&self, device: DeviceId, feature: &str) -> Result<()> {
        self.set_value(device, feature, FeatureValue::Binary(true))
    }

    pub fn release(&self, device: DeviceId, feature: &str) -> Result<()> {
        self.set_value(device, feature, FeatureValue::Binary(false))
    }

    pub fn set_axis(&self, device: DeviceId, feature: &str, value: f32) -> Result<()> {
        self.set_value(device, feature, FeatureValue::Axis1D(value))
    }

    /// Set every device position/rotation feature of `device`.
    pub fn set_pose(&self, device: DeviceId, position: Vector3, rotation: Quaternion) -> Result<()> {
        let (positions, rotations): (Vec<String>, Vec<String>) = {
            let rig = lock(&self.shared);
            let spec = rig
                .specs
                .get(&device)
                .ok_or_else(|| XrError::provider(format!("no virtual device {device}")))?;
            (
                spec.features_with_usage(usage::DEVICE_POSITION)
                    .map(|f| f.name.clone())
                    .collect(),
                spec.features_with_usage(usage::DEVICE_ROTATION)
                    .map(|f| f.name.clone())
                    .collect(),
            )
        };
        for name in positions {
            self.set_value(device, &name, FeatureValue::Axis3D(position))?;
        }
        for name in rotations {
            self.set_value(device, &name, FeatureValue::Rotation(rotation))?;
        }
        Ok(())
    }

    /// Announce `device` to the host. Only valid between initialize and shutdown.
    pub fn connect(&self, device: DeviceId) -> Result<()> {
        lock(&self.shared).connect(device)
    }

    pub fn disconnect(&self, device: DeviceId) {
        lock(&self.shared).disconnect(device);
    }

    pub fn connected(&self) -> Vec<DeviceId> {
        lock(&self.shared).connected.iter().copied().collect()
    }

    /// Last `(amplitude, duration)` rumble delivered to `device`.
    pub fn last_rumble(&self, device: DeviceId) -> Option<(f32, f32)> {
        lock(&self.shared).rumble.get(&device).copied()
    }

    pub fn recenter_count(&self) -> u32 {
        lock(&self.shared).recenters
    }

    pub fn frame_count(&self) -> u64 {
        lock(&self.shared).frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DefinitionLimits;

    #[test]
    fn controller_spec_fills_expected_definition() -> Result<()> {
        let spec = VirtualDeviceSpec::controller(DeviceId(1), DeviceRole::LeftHanded)
            .custom_feature("Haptics", 16);
        let mut def = DeviceDefinitionBuilder::new(DefinitionLimits::default());
        fill(&spec, &mut def)?;
        let def = def.finish();
        assert_eq!(def.role(), DeviceRole::LeftHanded);
        assert_eq!(def.features().len(), spec.features.len());
        assert_eq!(def.find_feature("Trigger"), def.find_usage(usage::TRIGGER));
        assert_eq!(def.serial_number(), Some("VIRT-0001"));
        Ok(())
    }

    #[test]
    fn hmd_position_carries_both_usages() -> Result<()> {
        let mut def = DeviceDefinitionBuilder::new(DefinitionLimits::default());
        fill(&VirtualDeviceSpec::hmd(DeviceId(0)), &mut def)?;
        let def = def.finish();
        let idx = def.find_usage(usage::CENTER_EYE_POSITION);
        assert!(idx.is_some());
        assert_eq!(idx, def.find_usage(usage::DEVICE_POSITION));
        Ok(())
    }

    #[test]
    fn handle_rejects_mistyped_values() {
        let (_rig, handle) = VirtualRig::standard();
        assert!(handle.set_axis(DeviceId(1), "Primary", 1.0).is_err());
        assert!(handle.press(DeviceId(1), "Nope").is_err());
        assert!(handle.press(DeviceId(9), "Primary").is_err());
        assert!(handle.press(DeviceId(1), "Primary").is_ok());
    }

    #[test]
    fn connect_requires_initialized_rig() {
        let (_rig, handle) = VirtualRig::standard();
        assert!(handle.connect(DeviceId(0)).is_err());
        assert!(handle.connected().is_empty());
    }

    #[test]
    fn rig_loads_from_toml() {
        let cfg = VirtualRigConfig::from_toml_str(
            r#"
            [[devices]]
            id = 7
            name = "Puck"
            role = "HardwareTracker"

            [[devices.features]]
            name = "Position"
            feature_type = "Axis3D"
            usages = ["DevicePosition"]
            "#,
        );
        let cfg = match cfg {
            Ok(c) => c,
            Err(e) => panic!("{e}"),
        };
        assert_eq!(cfg.devices.len(), 1);
        assert_eq!(cfg.devices[0].id, DeviceId(7));
        assert_eq!(cfg.devices[0].role, DeviceRole::HardwareTracker);
        assert_eq!(cfg.devices[0].features[0].usages, ["DevicePosition"]);
    }
}
