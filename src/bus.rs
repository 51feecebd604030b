use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

/// Interpreted motion state of a device, as published on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupancyState {
    pub active: bool,
    pub last_set_at: DateTime<Utc>,
}

impl OccupancyState {
    #[must_use]
    pub fn idle() -> Self {
        Self {
            active: false,
            last_set_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Motion interpretation changed between active and idle
    Occupancy,
}

pub type Handler = Arc<dyn Fn(&OccupancyState) + Send + Sync>;

/// Per-device publish/subscribe channel.
///
/// Cloning the bus gives another handle to the same subscriber list, so a
/// device hands a clone to every cluster that needs one. Buses of different
/// devices never share subscribers.
#[derive(Clone, Default)]
pub struct OccupancyBus {
    subscribers: Arc<Mutex<Vec<(Topic, Handler)>>>,
}

impl OccupancyBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(Topic, Handler)>> {
        // handlers run outside the lock, so a poisoned list is still consistent
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self, topic: Topic, handler: impl Fn(&OccupancyState) + Send + Sync + 'static) {
        let handler: Handler = Arc::new(handler);
        self.lock().push((topic, handler));
    }

    /// Deliver `payload` to every subscriber of `topic`, in subscription order.
    ///
    /// Returns the number of handlers invoked. Publishing with no
    /// subscribers does nothing.
    pub fn publish(&self, topic: Topic, payload: &OccupancyState) -> usize {
        let handlers: Vec<Handler> = self
            .lock()
            .iter()
            .filter(|(t, _)| *t == topic)
            .map(|(_, handler)| handler.clone())
            .collect();

        log::trace!(
            "Publishing {topic:?} (active: {}) to {} subscribers",
            payload.active,
            handlers.len()
        );

        for handler in &handlers {
            handler(payload);
        }

        handlers.len()
    }

    #[must_use]
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.lock().iter().filter(|(t, _)| *t == topic).count()
    }
}

impl std::fmt::Debug for OccupancyBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OccupancyBus")
            .field("subscribers", &self.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::bus::{OccupancyBus, OccupancyState, Topic};

    fn active() -> OccupancyState {
        OccupancyState {
            active: true,
            ..OccupancyState::idle()
        }
    }

    #[test]
    fn publish_without_subscribers() {
        let bus = OccupancyBus::new();
        assert_eq!(bus.publish(Topic::Occupancy, &active()), 0);
    }

    #[test]
    fn delivered_in_subscription_order() {
        let bus = OccupancyBus::new();
        let log = Arc::new(Mutex::new(vec![]));

        for name in ["first", "second", "third"] {
            let log = log.clone();
            bus.subscribe(Topic::Occupancy, move |state| {
                log.lock().unwrap().push((name, state.active));
            });
        }

        assert_eq!(bus.publish(Topic::Occupancy, &active()), 3);
        assert_eq!(bus.publish(Topic::Occupancy, &OccupancyState::idle()), 3);

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                ("first", true),
                ("second", true),
                ("third", true),
                ("first", false),
                ("second", false),
                ("third", false),
            ]
        );
    }

    #[test]
    fn clones_share_subscribers() {
        let bus = OccupancyBus::new();
        let other = bus.clone();
        let seen = Arc::new(Mutex::new(0));

        let counter = seen.clone();
        other.subscribe(Topic::Occupancy, move |_| *counter.lock().unwrap() += 1);

        bus.publish(Topic::Occupancy, &active());
        assert_eq!(*seen.lock().unwrap(), 1);
        assert_eq!(bus.subscriber_count(Topic::Occupancy), 1);
    }

    #[test]
    fn separate_buses_are_isolated() {
        let bus_a = OccupancyBus::new();
        let bus_b = OccupancyBus::new();
        let seen = Arc::new(Mutex::new(0));

        let counter = seen.clone();
        bus_a.subscribe(Topic::Occupancy, move |_| *counter.lock().unwrap() += 1);

        assert_eq!(bus_b.publish(Topic::Occupancy, &active()), 0);
        assert_eq!(*seen.lock().unwrap(), 0);
    }

    #[test]
    fn handler_may_publish_again() {
        let bus = OccupancyBus::new();
        let inner = bus.clone();
        let seen = Arc::new(Mutex::new(vec![]));

        let log = seen.clone();
        bus.subscribe(Topic::Occupancy, move |state| {
            log.lock().unwrap().push(state.active);
            if state.active {
                inner.publish(Topic::Occupancy, &OccupancyState::idle());
            }
        });

        bus.publish(Topic::Occupancy, &active());
        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
    }
}
