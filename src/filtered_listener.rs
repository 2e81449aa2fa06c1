use crate::eventbus::{HostEvent, HostListener};

/// Wraps a listener and filters events based on a user-supplied predicate.
pub struct FilteredListener {
    predicate: Box<dyn Fn(&HostEvent) -> bool + Send + Sync>,
    inner: Box<dyn HostListener>,
}

impl FilteredListener {
    pub fn new(
        predicate: impl Fn(&HostEvent) -> bool + Send + Sync + 'static,
        inner: Box<dyn HostListener>,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            inner,
        }
    }
}

impl HostListener for FilteredListener {
    fn on_event(&mut self, event: &HostEvent) {
        if (self.predicate)(event) {
            self.inner.on_event(event);
        }
    }
}
