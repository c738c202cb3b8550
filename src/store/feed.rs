//! Snapshot channels for document subscriptions.

use std::collections::HashMap;
use std::sync::Mutex;

use log::{debug, warn};
use tokio::sync::watch;

use super::error::{StoreError, StoreResult};
use crate::exchange::EventCode;

/// Live view of one document.
///
/// Holds the latest snapshot pushed by the store. Snapshots of one document
/// arrive in write order; intermediate snapshots may be skipped when
/// writes land faster than the consumer reads. Dropping the subscription
/// detaches it.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: watch::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    pub(super) const fn new(rx: watch::Receiver<T>) -> Self {
        Self { rx }
    }

    /// Returns the latest snapshot.
    #[must_use]
    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Returns the latest snapshot and marks it as seen.
    pub fn take(&mut self) -> T {
        self.rx.borrow_and_update().clone()
    }

    /// Returns whether a snapshot arrived since the last [`take`](Self::take)
    /// or [`changed`](Self::changed).
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Waits for the next snapshot.
    ///
    /// Returns `false` once the store has dropped the feed.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

/// Per-event senders for one document kind.
pub(super) struct Feeds<T> {
    name: &'static str,
    senders: Mutex<HashMap<EventCode, watch::Sender<T>>>,
}

impl<T: Clone> Feeds<T> {
    pub(super) fn new(name: &'static str) -> Self {
        Self {
            name,
            senders: Mutex::new(HashMap::new()),
        }
    }

    /// Attaches a subscriber, loading the first snapshot if nobody is
    /// subscribed to this document yet.
    pub(super) fn subscribe(
        &self,
        code: &EventCode,
        load: impl FnOnce() -> StoreResult<T>,
    ) -> StoreResult<Subscription<T>> {
        let mut senders = self
            .senders
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("Failed to acquire feed lock: {e}")))?;
        self.prune(&mut senders);

        if let Some(tx) = senders.get(code) {
            return Ok(Subscription::new(tx.subscribe()));
        }

        let (tx, rx) = watch::channel(load()?);
        senders.insert(code.clone(), tx);
        debug!("event=feed_opened module=store doc={} code={code}", self.name);
        Ok(Subscription::new(rx))
    }

    /// Pushes a fresh snapshot to the subscribers of `code`.
    ///
    /// Feeds whose subscribers have all detached are dropped instead. A
    /// snapshot that cannot be loaded is skipped; subscribers keep the
    /// previous one.
    pub(super) fn publish(&self, code: &EventCode, snapshot: impl FnOnce() -> StoreResult<T>) {
        let Ok(mut senders) = self.senders.lock() else {
            warn!("event=feed_publish module=store status=error reason=poisoned_lock");
            return;
        };

        let Some(tx) = senders.get(code) else {
            return;
        };

        if tx.receiver_count() == 0 {
            senders.remove(code);
            debug!("event=feed_closed module=store doc={} code={code}", self.name);
            return;
        }

        match snapshot() {
            Ok(value) => {
                tx.send_replace(value);
            }
            Err(err) => warn!(
                "event=feed_publish module=store status=error doc={} code={code} error={err}",
                self.name
            ),
        }
    }

    /// Number of attached subscribers for `code`.
    pub(super) fn subscriber_count(&self, code: &EventCode) -> usize {
        let Ok(mut senders) = self.senders.lock() else {
            return 0;
        };
        self.prune(&mut senders);
        senders.get(code).map_or(0, watch::Sender::receiver_count)
    }

    /// Number of documents with an open feed.
    #[cfg(test)]
    fn open_feeds(&self) -> usize {
        self.senders.lock().map_or(0, |senders| senders.len())
    }

    /// Drops feeds whose subscribers have all detached.
    fn prune(&self, senders: &mut HashMap<EventCode, watch::Sender<T>>) {
        senders.retain(|code, tx| {
            let live = tx.receiver_count() > 0;
            if !live {
                debug!("event=feed_closed module=store doc={} code={code}", self.name);
            }
            live
        });
    }
}
