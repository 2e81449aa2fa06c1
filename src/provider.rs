//! Input provider trait.
//!
//! An input provider is the plugin's per-subsystem implementation of the input
//! half of the boundary. The host calls it from its update loop, never
//! concurrently for the same subsystem.

use crate::device::DeviceDefinitionBuilder;
use crate::error::Result;
use crate::event::InputEvent;
use crate::feature::UpdateType;
use crate::handle::{DeviceId, SubsystemHandle};
use crate::state::DeviceStateWriter;

pub trait InputProvider: Send {
    /// Called once at the start of each dynamic update, before any device is polled.
    fn on_new_input_frame(&mut self, _subsystem: SubsystemHandle) {}

    /// Describe a newly connected device. Called exactly once per connection,
    /// before the first `update_device_state` for that device.
    fn fill_device_definition(
        &mut self,
        subsystem: SubsystemHandle,
        device: DeviceId,
        definition: &mut DeviceDefinitionBuilder,
    );

    /// Write this poll's values for `device`.
    ///
    /// Returning an error discards every write made during the call.
    /// `UpdateType::BeforeRender` calls must return quickly and must not block.
    fn update_device_state(
        &mut self,
        subsystem: SubsystemHandle,
        device: DeviceId,
        update: UpdateType,
        state: &mut DeviceStateWriter<'_>,
    ) -> Result<()>;

    /// Handle an event aimed at `device`, or at every device when it is
    /// [`DeviceId::INVALID`].
    fn handle_event(
        &mut self,
        subsystem: SubsystemHandle,
        device: DeviceId,
        event: &InputEvent,
    ) -> Result<()>;
}
