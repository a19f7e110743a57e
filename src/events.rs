//! Session notifications and the listener registry that fans them out.
//!
//! Listeners are either callbacks or unbounded channels. Dispatch is
//! synchronous and follows registration order, so every listener sees
//! events in the order the transitions happened.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

/// Notification emitted by the session state machine.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "event", content = "score")]
pub enum SessionEvent {
    /// The session left `Idle` and gameplay is running.
    Started,
    /// The session ended in failure.
    Failed,
    /// The session finished; the progress write has already completed.
    Finished,
    /// The score changed; carries the score after the increment.
    ScoreChanged(u32),
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&SessionEvent) + Send>;

enum Sink {
    Callback(Callback),
    Channel(mpsc::UnboundedSender<SessionEvent>),
}

/// Ordered list of registered listeners.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Sink)>,
}

impl EventBus {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked for every event.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&SessionEvent) + Send + 'static,
    {
        self.register(Sink::Callback(Box::new(listener)))
    }

    /// Register a channel listener and return its receiving half.
    ///
    /// The sender is dropped automatically once the receiver goes away.
    pub fn subscribe_channel(&mut self) -> (SubscriptionId, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.register(Sink::Channel(tx));
        (id, rx)
    }

    /// Remove a listener. Returns `false` if the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        before != self.listeners.len()
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver `event` to every listener in registration order.
    pub fn emit(&mut self, event: SessionEvent) {
        self.listeners.retain_mut(|(id, sink)| match sink {
            Sink::Callback(callback) => {
                callback(&event);
                true
            }
            Sink::Channel(tx) => {
                if tx.send(event).is_ok() {
                    true
                } else {
                    debug!(subscription = id.0, "dropping closed event channel");
                    false
                }
            }
        });
    }

    fn register(&mut self, sink: Sink) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, sink));
        id
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}
