//! Usage-based action bindings.
//!
//! Generic input mapping does not know device-specific feature names, only
//! usage hints. A [`BindingProfile`] maps usages (optionally restricted to a
//! device role) onto named actions and resolves them against a [`Snapshot`].
//!
//! ```toml
//! name = "default"
//!
//! [[bindings]]
//! usage = "Trigger"
//! role = "RightHanded"
//! action = "fire"
//! deadzone = 0.1
//!
//! [[bindings]]
//! usage = "Primary2DAxis"
//! role = "LeftHanded"
//! action = "move"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::ConfigError;
use crate::feature::FeatureValue;
use crate::metadata::DeviceRole;
use crate::snapshot::Snapshot;

/// Maps one usage to a named action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Binding {
    pub usage: String,
    /// Only devices with this role are considered; any role when `None`.
    #[serde(default)]
    pub role: Option<DeviceRole>,
    pub action: String,
    #[serde(default)]
    pub invert: bool,
    #[serde(default)]
    pub deadzone: f32,
}

/// Serializable profile of usage bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingProfile {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

/// Normalized output generated from device states and bindings.
#[derive(Default, Debug, Serialize, Deserialize)]
pub struct BindingOutput {
    pub axes: HashMap<String, f32>,
    pub buttons: HashMap<String, bool>,
}

impl BindingOutput {
    /// Value of a bound axis (0.0 if missing).
    pub fn axis(&self, action: &str) -> f32 {
        self.axes.get(action).copied().unwrap_or(0.0)
    }

    /// State of a bound button (false if missing).
    pub fn button(&self, action: &str) -> bool {
        self.buttons.get(action).copied().unwrap_or(false)
    }
}

fn shape(binding: &Binding, mut value: f32) -> f32 {
    if binding.invert {
        value *= -1.0;
    }
    if value.abs() < binding.deadzone {
        value = 0.0;
    }
    value
}

impl BindingProfile {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    fn source<'a>(&self, binding: &Binding, snapshot: &'a Snapshot) -> Option<&'a FeatureValue> {
        snapshot
            .iter()
            .filter(|(_, d)| binding.role.map_or(true, |r| d.definition.role() == r))
            .find_map(|(_, d)| {
                let idx = d.definition.find_usage(&binding.usage)?;
                d.state.value(idx)
            })
    }

    /// Resolves bound actions from a snapshot.
    ///
    /// The first device (lowest id) that matches the role and carries the usage wins.
    pub fn resolve(&self, snapshot: &Snapshot) -> BindingOutput {
        let mut output = BindingOutput::default();

        for binding in &self.bindings {
            match self.source(binding, snapshot) {
                Some(FeatureValue::Binary(pressed)) => {
                    output.buttons.insert(binding.action.clone(), *pressed);
                }
                Some(FeatureValue::Axis1D(v)) => {
                    output.axes.insert(binding.action.clone(), shape(binding, *v));
                }
                Some(FeatureValue::Axis2D(v)) => {
                    output
                        .axes
                        .insert(format!("{}.x", binding.action), shape(binding, v.x));
                    output
                        .axes
                        .insert(format!("{}.y", binding.action), shape(binding, v.y));
                }
                _ => {}
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DefinitionLimits, DeviceDefinitionBuilder};
    use crate::feature::{FeatureType, Vector2};
    use crate::handle::{DeviceId, FeatureIndex};
    use crate::snapshot::DeviceSnapshot;
    use crate::state::DeviceState;
    use crate::usage;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn controller(role: DeviceRole, trigger: f32, stick: Vector2, pressed: bool) -> DeviceSnapshot {
        let mut b = DeviceDefinitionBuilder::new(DefinitionLimits::default());
        let _ = b.set_role(role);
        let _ = b.add_feature_with_usage("trigger", FeatureType::Axis1D, usage::TRIGGER);
        let _ = b.add_feature_with_usage("stick", FeatureType::Axis2D, usage::PRIMARY_2D_AXIS);
        let _ = b.add_feature_with_usage("a", FeatureType::Binary, usage::PRIMARY_BUTTON);
        let definition = Arc::new(b.finish());
        let mut state = DeviceState::new(&definition);
        {
            let mut w = state.writer(&definition);
            let _ = w.set_axis1d_value(FeatureIndex(0), trigger);
            let _ = w.set_axis2d_value(FeatureIndex(1), stick);
            let _ = w.set_binary_value(FeatureIndex(2), pressed);
        }
        DeviceSnapshot { definition, state }
    }

    fn snapshot() -> Snapshot {
        let mut map = BTreeMap::new();
        map.insert(
            DeviceId(1),
            controller(DeviceRole::LeftHanded, 0.05, Vector2::new(0.5, -0.25), false),
        );
        map.insert(
            DeviceId(2),
            controller(DeviceRole::RightHanded, 0.8, Vector2::ZERO, true),
        );
        Snapshot(map)
    }

    #[test]
    fn resolves_by_usage_and_role() {
        let profile = BindingProfile::from_toml_str(
            r#"
            name = "default"

            [[bindings]]
            usage = "Trigger"
            role = "RightHanded"
            action = "fire"

            [[bindings]]
            usage = "Trigger"
            role = "LeftHanded"
            action = "brake"
            deadzone = 0.1

            [[bindings]]
            usage = "Primary2DAxis"
            role = "LeftHanded"
            action = "move"
            invert = true

            [[bindings]]
            usage = "PrimaryButton"
            action = "jump"
            "#,
        );
        let profile = match profile {
            Ok(p) => p,
            Err(e) => panic!("{e}"),
        };
        let out = profile.resolve(&snapshot());
        assert!((out.axis("fire") - 0.8).abs() < f32::EPSILON);
        assert_eq!(out.axes.get("brake"), Some(&0.0));
        assert!((out.axis("move.x") + 0.5).abs() < f32::EPSILON);
        assert!((out.axis("move.y") - 0.25).abs() < f32::EPSILON);
        // Lowest id without a role filter is the left controller, which is released.
        assert!(!out.button("jump"));
    }

    #[test]
    fn unmatched_bindings_produce_nothing() {
        let profile = BindingProfile {
            name: "x".into(),
            description: None,
            bindings: vec![Binding {
                usage: usage::GRIP.into(),
                role: None,
                action: "grab".into(),
                invert: false,
                deadzone: 0.0,
            }],
        };
        let out = profile.resolve(&snapshot());
        assert!(out.axes.is_empty() && out.buttons.is_empty());
    }
}
