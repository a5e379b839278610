//! Alarm delivery: subscriber registry and subscription handles

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};
use uuid::Uuid;

use super::alarm::Alarm;

/// Registry of live subscriber mailboxes.
///
/// Mutated by the subscribe/close API and iterated by the scheduler loop's
/// publish path, so the map sits behind a mutex; registration is safe
/// concurrently with ongoing publication.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    subs: Mutex<HashMap<Uuid, mpsc::Sender<Alarm>>>,
}

impl Registry {
    /// Attach a new subscriber with a bounded mailbox.
    pub fn subscribe(self: &Arc<Self>, capacity: usize) -> Subscription {
        let (tx, rx) = mpsc::channel(capacity);
        let id = Uuid::now_v7();
        self.lock().insert(id, tx);
        debug!(%id, capacity, "subscriber registered");
        Subscription {
            id,
            rx,
            registry: Arc::clone(self),
        }
    }

    /// Fan an alarm out to every live mailbox.
    ///
    /// Drop-on-saturation policy: a full mailbox forcibly closes its
    /// subscription so a slow consumer cannot stall the scheduler. The
    /// consumer observes the closed channel and must re-subscribe, losing
    /// alarms fired during the gap.
    pub fn publish(&self, alarm: &Alarm) {
        self.lock().retain(|id, tx| match tx.try_send(alarm.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(%id, event = %alarm.event, "subscriber mailbox full, dropping subscription");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(%id, "subscriber gone, dropping subscription");
                false
            }
        });
    }

    /// Close every live mailbox. Used on scheduler shutdown.
    pub fn close_all(&self) {
        let mut subs = self.lock();
        if !subs.is_empty() {
            debug!(closed = subs.len(), "closing all subscriptions");
        }
        subs.clear();
    }

    pub fn remove(&self, id: Uuid) {
        if self.lock().remove(&id).is_some() {
            debug!(%id, "subscriber deregistered");
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, mpsc::Sender<Alarm>>> {
        self.subs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One consumer's registration: the receiving half of a bounded mailbox.
///
/// [`Subscription::recv`] returning `None` means the mailbox was closed:
/// either the scheduler shut down or the mailbox saturated and the clock
/// dropped it. Re-subscribe to resume delivery; alarms fired during the gap
/// are lost.
#[derive(Debug)]
pub struct Subscription {
    id: Uuid,
    rx: mpsc::Receiver<Alarm>,
    registry: Arc<Registry>,
}

impl Subscription {
    /// Receive the next alarm, or `None` once the mailbox is closed and
    /// drained.
    pub async fn recv(&mut self) -> Option<Alarm> {
        self.rx.recv().await
    }

    /// Receive without waiting. `None` when the mailbox is empty or closed.
    pub fn try_recv(&mut self) -> Option<Alarm> {
        self.rx.try_recv().ok()
    }

    /// Close the subscription. Dropping the handle has the same effect.
    pub fn close(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}
