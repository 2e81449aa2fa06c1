use crate::eventbus::{HostEvent, HostListener};

/// A simple listener that logs all host events through `tracing`.
#[derive(Debug, Default)]
pub struct TracingListener;

impl TracingListener {
    pub fn new() -> Self {
        TracingListener
    }
}

impl HostListener for TracingListener {
    fn on_event(&mut self, event: &HostEvent) {
        match event {
            HostEvent::LifecycleChanged { subsystem, state } => {
                tracing::info!(%subsystem, ?state, "lifecycle changed");
            }
            HostEvent::DeviceConnected {
                subsystem,
                device,
                definition,
            } => {
                tracing::info!(
                    %subsystem,
                    %device,
                    name = definition.name().unwrap_or("<unnamed>"),
                    role = ?definition.role(),
                    features = definition.features().len(),
                    "device connected"
                );
            }
            HostEvent::DeviceDisconnected { subsystem, device } => {
                tracing::info!(%subsystem, %device, "device disconnected");
            }
        }
    }
}
