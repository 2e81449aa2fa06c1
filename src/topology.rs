//! Device connect/disconnect notifications.
//!
//! Plugins usually learn about devices on a detection thread that has nothing
//! to do with the host's update loop. [`DeviceNotifier`] is the thread-safe
//! way in: it only enqueues, and the host drains the queue at the start of
//! each update of that subsystem. The poll path never waits on it.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use crate::handle::{DeviceId, SubsystemHandle};

/// One topology change announced by a plugin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TopologyEvent {
    Connected(DeviceId),
    Disconnected(DeviceId),
}

/// Plugin-facing sender of topology changes for one subsystem.
///
/// Cheap to clone, `Send + Sync`; usable from any thread at any time.
#[derive(Clone, Debug)]
pub struct DeviceNotifier {
    subsystem: SubsystemHandle,
    tx: Sender<TopologyEvent>,
}

impl DeviceNotifier {
    pub fn subsystem(&self) -> SubsystemHandle {
        self.subsystem
    }

    pub fn device_connected(&self, device: DeviceId) {
        self.send(TopologyEvent::Connected(device));
    }

    pub fn device_disconnected(&self, device: DeviceId) {
        self.send(TopologyEvent::Disconnected(device));
    }

    fn send(&self, event: TopologyEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!(subsystem = %self.subsystem, ?event, "host gone, topology event dropped");
        }
    }
}

/// Host-side end of the topology channel.
#[derive(Debug)]
pub(crate) struct TopologyQueue {
    rx: Receiver<TopologyEvent>,
}

impl TopologyQueue {
    /// Everything queued so far, in arrival order.
    pub(crate) fn drain(&self) -> Vec<TopologyEvent> {
        let mut out = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(ev) => out.push(ev),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        out
    }
}

/// Create a connected notifier/queue pair for `subsystem`.
pub(crate) fn channel(subsystem: SubsystemHandle) -> (DeviceNotifier, TopologyQueue) {
    let (tx, rx) = mpsc::channel();
    (DeviceNotifier { subsystem, tx }, TopologyQueue { rx })
}
