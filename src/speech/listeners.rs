//! Synchronous fan-out of session events to any number of subscribers.
//!
//! The controller is the only writer. Each `on_*` call returns a
//! [`Subscription`]; dropping it (or calling [`Subscription::unsubscribe`])
//! removes the listener, so repeated start/stop cycles cannot leak callbacks.

use super::types::{InterimResult, RecognitionResult, SessionError, StatusEvent};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Slot<T> {
    next_id: u64,
    listeners: Vec<(u64, Callback<T>)>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
        }
    }
}

type SharedSlot<T> = Arc<Mutex<Slot<T>>>;

fn lock<T>(slot: &Mutex<Slot<T>>) -> MutexGuard<'_, Slot<T>> {
    // Listener panics must not disable the channel for everyone else
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn subscribe<T: 'static>(slot: &SharedSlot<T>, callback: Callback<T>) -> Subscription {
    let id = {
        let mut guard = lock(slot);
        let id = guard.next_id;
        guard.next_id += 1;
        guard.listeners.push((id, callback));
        id
    };

    let weak: Weak<Mutex<Slot<T>>> = Arc::downgrade(slot);
    Subscription {
        detach: Some(Box::new(move || {
            if let Some(slot) = weak.upgrade() {
                lock(&slot).listeners.retain(|(existing, _)| *existing != id);
            }
        })),
    }
}

fn broadcast<T>(slot: &SharedSlot<T>, event: &T) {
    // Snapshot so listeners may subscribe or unsubscribe from inside a callback
    let snapshot: Vec<Callback<T>> = lock(slot)
        .listeners
        .iter()
        .map(|(_, cb)| Arc::clone(cb))
        .collect();

    for callback in snapshot {
        callback(event);
    }
}

/// Which event channel a listener is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    Result,
    Interim,
    Error,
    Status,
}

/// Typed pub/sub registry for the four session event kinds
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    results: SharedSlot<RecognitionResult>,
    interim: SharedSlot<InterimResult>,
    errors: SharedSlot<SessionError>,
    status: SharedSlot<StatusEvent>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_result<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&RecognitionResult) + Send + Sync + 'static,
    {
        subscribe(&self.results, Arc::new(callback))
    }

    pub fn on_interim<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&InterimResult) + Send + Sync + 'static,
    {
        subscribe(&self.interim, Arc::new(callback))
    }

    pub fn on_error<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&SessionError) + Send + Sync + 'static,
    {
        subscribe(&self.errors, Arc::new(callback))
    }

    pub fn on_status<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StatusEvent) + Send + Sync + 'static,
    {
        subscribe(&self.status, Arc::new(callback))
    }

    pub fn listener_count(&self, kind: ListenerKind) -> usize {
        match kind {
            ListenerKind::Result => lock(&self.results).listeners.len(),
            ListenerKind::Interim => lock(&self.interim).listeners.len(),
            ListenerKind::Error => lock(&self.errors).listeners.len(),
            ListenerKind::Status => lock(&self.status).listeners.len(),
        }
    }

    pub(crate) fn emit_result(&self, result: &RecognitionResult) {
        broadcast(&self.results, result);
    }

    pub(crate) fn emit_interim(&self, interim: &InterimResult) {
        broadcast(&self.interim, interim);
    }

    pub(crate) fn emit_error(&self, error: &SessionError) {
        broadcast(&self.errors, error);
    }

    pub(crate) fn emit_status(&self, status: &StatusEvent) {
        broadcast(&self.status, status);
    }
}

/// Handle for one registered listener; unsubscribes on drop
#[must_use = "dropping a Subscription immediately removes the listener"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.detach_now();
    }

    fn detach_now(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.detach.is_some())
            .finish()
    }
}
