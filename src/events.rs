//! Change notifications for models.
//!
//! A model owns one [`EventBus`]; listeners subscribe to an [`EventKind`] and
//! are called synchronously, in registration order, after a write succeeded.

use bson::{Bson, Document as BsonDocument};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    Insert,
    Update,
    Remove,
}

/// What a listener subscribes to. `Change` receives every action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Inserted,
    Updated,
    Removed,
    Change,
}

impl ChangeAction {
    #[must_use]
    pub const fn kind(self) -> EventKind {
        match self {
            Self::Insert => EventKind::Inserted,
            Self::Update => EventKind::Updated,
            Self::Remove => EventKind::Removed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub action: ChangeAction,
    /// Logical model name.
    pub collection: String,
    pub id: Bson,
    /// Record after the write; the removed record for `Remove`.
    pub data: Option<BsonDocument>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

struct Registration {
    id: ListenerId,
    kind: EventKind,
    once: bool,
    listener: Listener,
}

#[derive(Default)]
pub struct EventBus {
    next_id: AtomicU64,
    listeners: RwLock<Vec<Registration>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").field("listeners", &self.listeners.read().len()).finish()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, kind: EventKind, once: bool, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push(Registration { id, kind, once, listener });
        id
    }

    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.register(kind, false, Arc::new(listener))
    }

    /// Like [`on`](Self::on), but the listener is removed after its first call.
    pub fn once<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.register(kind, true, Arc::new(listener))
    }

    /// Returns whether a listener was removed.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|r| r.id != id);
        listeners.len() != before
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.read().iter().filter(|r| r.kind == kind).count()
    }

    /// Delivers `event` to listeners of its action and of `Change`. Listeners
    /// run without the registry lock held, so they may call `on`/`off`.
    pub fn emit(&self, event: &ChangeEvent) {
        let kind = event.action.kind();
        let targets: Vec<(ListenerId, bool, Listener)> = self
            .listeners
            .read()
            .iter()
            .filter(|r| r.kind == kind || r.kind == EventKind::Change)
            .map(|r| (r.id, r.once, r.listener.clone()))
            .collect();
        if targets.iter().any(|(_, once, _)| *once) {
            self.listeners.write().retain(|r| !(r.once && targets.iter().any(|(id, _, _)| *id == r.id)));
        }
        for (_, _, listener) in targets {
            listener(event);
        }
    }
}
