/// Ordered queue of change notifications.
///
/// Producers `emit` while they mutate their state; consumers `drain` the
/// queue afterwards and react in emission order. Nothing is delivered
/// re-entrantly, so a consumer never observes a half-applied mutation.
#[derive(Debug)]
pub struct EventBus<E> {
    events: Vec<E>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: E) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[E] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> Vec<E> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;

    #[test]
    fn records_events_in_emission_order() {
        let mut bus = EventBus::new();
        bus.emit("a");
        bus.emit("b");
        assert_eq!(bus.events(), &["a", "b"]);
    }

    #[test]
    fn drain_clears_events() {
        let mut bus = EventBus::new();
        bus.emit(1u32);
        let drained = bus.drain();
        assert_eq!(drained, vec![1]);
        assert!(bus.is_empty());
    }
}
