//! Publish/subscribe distribution of tour events.
//!
//! Every listener is isolated: an `Err` or a panic from one listener is
//! logged and delivery continues with the next one.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::{error, warn};

use tg_core::TourEvent;

pub type TourListener = Arc<dyn Fn(&TourEvent) -> anyhow::Result<()> + Send + Sync>;

struct ListenerEntry {
    id: u64,
    live: Arc<AtomicBool>,
    listener: TourListener,
}

type ListenerList = Mutex<Vec<ListenerEntry>>;

/// Handle returned by [`NotificationBus::subscribe`].
///
/// Dropping the handle keeps the listener subscribed; call
/// [`Subscription::unsubscribe`] to detach it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    live: Arc<AtomicBool>,
    listeners: Weak<ListenerList>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Detach the listener. Takes effect even mid-notification.
    pub fn unsubscribe(self) {
        self.live.store(false, Ordering::SeqCst);
        if let Some(listeners) = self.listeners.upgrade() {
            if let Ok(mut guard) = listeners.lock() {
                guard.retain(|entry| entry.id != self.id);
            }
        }
    }
}

#[derive(Default)]
pub struct NotificationBus {
    listeners: Arc<ListenerList>,
    next_id: AtomicU64,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&TourEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let live = Arc::new(AtomicBool::new(true));
        let entry = ListenerEntry {
            id,
            live: live.clone(),
            listener: Arc::new(listener),
        };

        match self.listeners.lock() {
            Ok(mut guard) => guard.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }

        Subscription {
            id,
            live,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Deliver `event` to every live listener in subscription order.
    pub fn notify(&self, event: &TourEvent) {
        // Snapshot so listeners may subscribe or unsubscribe while we deliver.
        let snapshot: Vec<(u64, Arc<AtomicBool>, TourListener)> = match self.listeners.lock() {
            Ok(guard) => guard
                .iter()
                .map(|entry| (entry.id, entry.live.clone(), entry.listener.clone()))
                .collect(),
            Err(poisoned) => poisoned
                .into_inner()
                .iter()
                .map(|entry| (entry.id, entry.live.clone(), entry.listener.clone()))
                .collect(),
        };

        for (id, live, listener) in snapshot {
            if !live.load(Ordering::SeqCst) {
                continue;
            }
            match panic::catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(listener_id = id, error = %err, "tour listener failed");
                }
                Err(payload) => {
                    error!(
                        listener_id = id,
                        panic = %panic_message(payload.as_ref()),
                        "tour listener panicked"
                    );
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every listener.
    pub fn clear(&self) {
        let mut guard = match self.listeners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for entry in guard.drain(..) {
            entry.live.store(false, Ordering::SeqCst);
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
