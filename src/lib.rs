//! # xrtether
//!
//! Host side of an XR plugin boundary: subsystem lifecycle, device topology,
//! device definitions, typed per-frame state and device events.
//!
//! A plugin implements [`LifecycleProvider`] and, from `initialize`, registers
//! an [`InputProvider`]. The [`Manager`] drives both: it applies connects and
//! disconnects reported through a [`DeviceNotifier`], asks the plugin to
//! describe each new device with a [`DeviceDefinitionBuilder`], and polls
//! state through a [`DeviceStateWriter`] once per [`UpdateType`].
//!
//! Plugins written against the C ABI plug in through [`ffi`].
//!
//! ## Quick start
//! ```no_run
//! # #[cfg(feature = "virtual")] {
//! use xrtether::{Manager, UpdateType, usage};
//! use xrtether::backends::virtual_input::VirtualRig;
//!
//! let mut host = Manager::new();
//! let (rig, _remote) = VirtualRig::standard();
//! let sub = host.register_lifecycle_provider("virtual", "input", rig)?;
//! host.initialize(sub)?;
//! host.start(sub)?;
//! host.update(UpdateType::Dynamic);
//!
//! for (id, dev) in host.snapshot(sub)?.iter() {
//!     if let Some(idx) = dev.definition.find_usage(usage::TRIGGER) {
//!         println!("{id}: trigger {:?}", dev.state.axis1d(idx));
//!     }
//! }
//! # }
//! # Ok::<(), xrtether::XrError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod backends;
pub mod binding;
pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod eventbus;
pub mod feature;
pub mod ffi;
pub mod filtered_listener;
pub mod handle;
pub mod lifecycle;
pub mod logger;
pub mod manager;
pub mod metadata;
pub mod provider;
pub mod snapshot;
pub mod state;
pub mod topology;
pub mod usage;

pub use config::HostConfig;
pub use device::{DefinitionLimits, DeviceDefinition, DeviceDefinitionBuilder, FeatureDesc};
pub use device::{MAX_CUSTOM_FEATURE_SIZE, XR_STRING_SIZE};
pub use error::{Result, Status, XrError};
pub use event::{InputEvent, InputEventType};
pub use eventbus::{EventFilter, HostEvent, HostListener, ListenerId};
pub use feature::{FeatureType, FeatureValue, Quaternion, TrackingState, UpdateType, Vector2, Vector3};
pub use handle::{DeviceId, FeatureIndex, SubsystemHandle};
pub use lifecycle::{LifecycleProvider, LifecycleState, SubsystemContext};
pub use manager::{Manager, ReregistrationPolicy};
pub use metadata::{DeviceMeta, DeviceRole};
pub use provider::InputProvider;
pub use snapshot::{DeviceSnapshot, Snapshot};
pub use state::{DeviceState, DeviceStateWriter};
pub use topology::{DeviceNotifier, TopologyEvent};
pub use usage::FeatureUsage;
