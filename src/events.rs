//! In-process event channel
//!
//! Components publish emotion changes and feedback strings here; presentation
//! consumers subscribe per event kind. Dispatch is synchronous, on the
//! publisher's thread, in subscription order, over a snapshot of the handler
//! list taken when `publish` is called.

use crate::emotion::EmotionState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Events emitted by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    EmotionStateChanged(EmotionState),
    FeedbackTextChanged(String),
}

/// Discriminant used as the subscription key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    EmotionStateChanged,
    FeedbackTextChanged,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::EmotionStateChanged(_) => EventKind::EmotionStateChanged,
            Event::FeedbackTextChanged(_) => EventKind::FeedbackTextChanged,
        }
    }
}

/// Token returned by [`EventChannel::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<EventKind, Vec<(SubscriptionId, Handler)>>,
}

/// Cloneable handle, all clones share the same registrations
#[derive(Clone, Default)]
pub struct EventChannel {
    registry: Arc<Mutex<Registry>>,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let mut registry = self.registry();
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        registry
            .handlers
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Subscribes to emotion state changes only
    pub fn on_emotion_state<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(EmotionState) + Send + Sync + 'static,
    {
        self.subscribe(EventKind::EmotionStateChanged, move |event| {
            if let Event::EmotionStateChanged(state) = event {
                handler(*state);
            }
        })
    }

    /// Subscribes to feedback text changes only
    pub fn on_feedback_text<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.subscribe(EventKind::FeedbackTextChanged, move |event| {
            if let Event::FeedbackTextChanged(text) = event {
                handler(text);
            }
        })
    }

    /// Removes one registration. Returns false if it was not registered.
    pub fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) -> bool {
        let mut registry = self.registry();
        let Some(handlers) = registry.handlers.get_mut(&kind) else {
            return false;
        };

        let Some(index) = handlers.iter().position(|(sid, _)| *sid == id) else {
            return false;
        };
        handlers.remove(index);

        if handlers.is_empty() {
            registry.handlers.remove(&kind);
        }
        true
    }

    pub fn publish(&self, event: Event) {
        // Snapshot, then dispatch without holding the lock so handlers can
        // subscribe, unsubscribe or publish themselves.
        let snapshot: Vec<Handler> = match self.registry().handlers.get(&event.kind()) {
            Some(handlers) => handlers.iter().map(|(_, h)| Arc::clone(h)).collect(),
            None => return,
        };

        for handler in snapshot {
            handler(&event);
        }
    }

    /// Logs a user-facing message and publishes it as feedback text
    pub fn publish_feedback(&self, text: impl Into<String>) {
        let text = text.into();
        tracing::info!("{}", text);
        self.publish(Event::FeedbackTextChanged(text));
    }

    pub fn publish_emotion(&self, state: EmotionState) {
        self.publish(Event::EmotionStateChanged(state));
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.registry().handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Whether the kind still holds a registration slot
    pub fn is_registered(&self, kind: EventKind) -> bool {
        self.registry().handlers.contains_key(&kind)
    }
}
