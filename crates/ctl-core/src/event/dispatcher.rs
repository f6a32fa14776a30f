use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::event::{Event, EventId, EventResult};

type Listener = Arc<dyn Fn(&dyn Event) -> EventResult + Send + Sync>;

#[derive(Default)]
struct Listeners {
    by_name: HashMap<String, Vec<(EventId, Listener)>>,
    by_type: HashMap<TypeId, Vec<(EventId, Listener)>>,
    next_id: EventId,
}

/// Event dispatcher resolved from the container under `events`.
///
/// Name listeners run before type listeners; a listener returning
/// [`EventResult::Stop`] ends propagation. Listeners are invoked outside the
/// internal lock, so they may register further listeners.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: Mutex<Listeners>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen for events with the given name.
    pub fn listen<F>(&self, event_name: impl Into<String>, listener: F) -> EventId
    where
        F: Fn(&dyn Event) -> EventResult + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.lock();
        listeners.next_id += 1;
        let id = listeners.next_id;
        listeners
            .by_name
            .entry(event_name.into())
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Listen for every event of concrete type `E`.
    pub fn listen_for<E, F>(&self, listener: F) -> EventId
    where
        E: Event,
        F: Fn(&E) -> EventResult + Send + Sync + 'static,
    {
        let wrapped: Listener = Arc::new(move |event: &dyn Event| {
            match event.as_any().downcast_ref::<E>() {
                Some(event) => listener(event),
                None => EventResult::Continue,
            }
        });

        let mut listeners = self.listeners.lock();
        listeners.next_id += 1;
        let id = listeners.next_id;
        listeners
            .by_type
            .entry(TypeId::of::<E>())
            .or_default()
            .push((id, wrapped));
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn forget(&self, id: EventId) -> bool {
        let mut guard = self.listeners.lock();
        let listeners = &mut *guard;
        let mut found = false;
        for entries in listeners.by_name.values_mut().chain(listeners.by_type.values_mut()) {
            let before = entries.len();
            entries.retain(|(entry_id, _)| *entry_id != id);
            found |= entries.len() < before;
        }
        found
    }

    pub fn has_listeners(&self, event_name: &str) -> bool {
        self.listeners
            .lock()
            .by_name
            .get(event_name)
            .is_some_and(|entries| !entries.is_empty())
    }

    /// Deliver `event` to its listeners.
    pub fn dispatch(&self, event: &dyn Event) -> EventResult {
        let pending: Vec<Listener> = {
            let listeners = self.listeners.lock();
            let named = listeners.by_name.get(event.name()).into_iter().flatten();
            let typed = listeners
                .by_type
                .get(&event.as_any().type_id())
                .into_iter()
                .flatten();
            named.chain(typed).map(|(_, listener)| listener.clone()).collect()
        };

        log::trace!("Dispatching event '{}' to {} listener(s)", event.name(), pending.len());
        for listener in pending {
            if listener(event) == EventResult::Stop {
                return EventResult::Stop;
            }
        }
        EventResult::Continue
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.lock();
        let name_count: usize = listeners.by_name.values().map(|v| v.len()).sum();
        let type_count: usize = listeners.by_type.values().map(|v| v.len()).sum();
        f.debug_struct("EventDispatcher")
            .field("name_listeners", &name_count)
            .field("type_listeners", &type_count)
            .finish()
    }
}
