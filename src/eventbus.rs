use std::collections::HashMap;
use std::sync::Arc;

use crate::device::DeviceDefinition;
use crate::handle::{DeviceId, SubsystemHandle};
use crate::lifecycle::LifecycleState;

/// Something the host observed about a subsystem.
#[derive(Clone, Debug)]
pub enum HostEvent {
    LifecycleChanged {
        subsystem: SubsystemHandle,
        state: LifecycleState,
    },
    /// A device was connected and its definition filled.
    DeviceConnected {
        subsystem: SubsystemHandle,
        device: DeviceId,
        definition: Arc<DeviceDefinition>,
    },
    DeviceDisconnected {
        subsystem: SubsystemHandle,
        device: DeviceId,
    },
}

impl HostEvent {
    pub fn subsystem(&self) -> SubsystemHandle {
        match self {
            HostEvent::LifecycleChanged { subsystem, .. }
            | HostEvent::DeviceConnected { subsystem, .. }
            | HostEvent::DeviceDisconnected { subsystem, .. } => *subsystem,
        }
    }
}

/// Trait for reacting to host events.
pub trait HostListener: Send {
    fn on_event(&mut self, event: &HostEvent);
}

/// Determines which kinds of events a listener wants to receive.
#[derive(Debug, Clone, Copy)]
pub enum EventFilter {
    All,
    LifecycleOnly,
    TopologyOnly,
    Custom(fn(&HostEvent) -> bool),
}

impl EventFilter {
    fn passes(&self, event: &HostEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::LifecycleOnly => matches!(event, HostEvent::LifecycleChanged { .. }),
            EventFilter::TopologyOnly => matches!(
                event,
                HostEvent::DeviceConnected { .. } | HostEvent::DeviceDisconnected { .. }
            ),
            EventFilter::Custom(f) => f(event),
        }
    }
}

/// Id returned by [`HostEventBus::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Metadata-wrapped listener with filters and control flags.
struct ListenerEntry {
    listener: Box<dyn HostListener>,
    enabled: bool,
    filter: EventFilter,
    tag: Option<SubsystemHandle>,
}

#[derive(Default)]
pub struct HostEventBus {
    next_id: u64,
    listeners: HashMap<u64, ListenerEntry>,
}

impl HostEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener with a filter and an optional subsystem tag.
    pub fn add_listener(
        &mut self,
        listener: impl HostListener + 'static,
        filter: EventFilter,
        tag: Option<SubsystemHandle>,
    ) -> ListenerId {
        let id = self.next_id;
        self.listeners.insert(
            id,
            ListenerEntry {
                listener: Box::new(listener),
                enabled: true,
                filter,
                tag,
            },
        );
        self.next_id += 1;
        ListenerId(id)
    }

    pub fn enable(&mut self, id: ListenerId) {
        if let Some(entry) = self.listeners.get_mut(&id.0) {
            entry.enabled = true;
        }
    }

    /// Mutes a listener without removing it.
    pub fn disable(&mut self, id: ListenerId) {
        if let Some(entry) = self.listeners.get_mut(&id.0) {
            entry.enabled = false;
        }
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id.0).is_some()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Emits one event to all active and matching listeners.
    pub fn emit(&mut self, event: &HostEvent) {
        for entry in self.listeners.values_mut() {
            if !entry.enabled {
                continue;
            }
            if entry.tag.is_some_and(|wanted| wanted != event.subsystem()) {
                continue;
            }
            if entry.filter.passes(event) {
                entry.listener.on_event(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    struct Forward(mpsc::Sender<HostEvent>);

    impl HostListener for Forward {
        fn on_event(&mut self, event: &HostEvent) {
            let _ = self.0.send(event.clone());
        }
    }

    fn lifecycle(raw: u32) -> HostEvent {
        HostEvent::LifecycleChanged {
            subsystem: SubsystemHandle::from_raw(raw),
            state: LifecycleState::Started,
        }
    }

    fn disconnect(raw: u32) -> HostEvent {
        HostEvent::DeviceDisconnected {
            subsystem: SubsystemHandle::from_raw(raw),
            device: DeviceId(0),
        }
    }

    #[test]
    fn filters_and_tags_select_events() {
        let mut bus = HostEventBus::new();
        let (tx_all, rx_all) = mpsc::channel();
        let (tx_topo, rx_topo) = mpsc::channel();
        let (tx_tag, rx_tag) = mpsc::channel();
        bus.add_listener(Forward(tx_all), EventFilter::All, None);
        bus.add_listener(Forward(tx_topo), EventFilter::TopologyOnly, None);
        bus.add_listener(
            Forward(tx_tag),
            EventFilter::All,
            Some(SubsystemHandle::from_raw(2)),
        );

        bus.emit(&lifecycle(1));
        bus.emit(&disconnect(2));

        assert_eq!(rx_all.try_iter().count(), 2);
        assert_eq!(rx_topo.try_iter().count(), 1);
        let tagged: Vec<_> = rx_tag.try_iter().collect();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].subsystem(), SubsystemHandle::from_raw(2));
    }

    #[test]
    fn disabled_and_removed_listeners_are_silent() {
        let mut bus = HostEventBus::new();
        let (tx, rx) = mpsc::channel();
        let id = bus.add_listener(Forward(tx), EventFilter::LifecycleOnly, None);

        bus.disable(id);
        bus.emit(&lifecycle(1));
        assert_eq!(rx.try_iter().count(), 0);

        bus.enable(id);
        bus.emit(&lifecycle(1));
        bus.emit(&disconnect(1));
        assert_eq!(rx.try_iter().count(), 1);

        assert!(bus.remove_listener(id));
        assert!(!bus.remove_listener(id));
        assert!(bus.is_empty());
    }
}
