//! One-slot reload handoff

use std::sync::{Mutex, PoisonError};

use tokio::sync::Notify;

use crate::event::Event;

/// Last-writer-wins handoff of a new event set into the scheduler loop.
///
/// A reload submitted while a previous one is still pending replaces it, so
/// only the most recent event set survives and the caller never blocks on
/// scheduling work.
#[derive(Debug, Default)]
pub(crate) struct ReloadSlot {
    slot: Mutex<Option<Vec<Event>>>,
    notify: Notify,
}

impl ReloadSlot {
    pub fn put(&self, events: Vec<Event>) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(events);
        self.notify.notify_one();
    }

    pub fn take(&self) -> Option<Vec<Event>> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Wait until a reload is pending. `Notify` stores the wakeup permit, so
    /// a put that lands between waits is not lost.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }
}
