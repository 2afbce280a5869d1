// src/bot/shutdown.rs - Process-wide cooperative shutdown

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

/// Clone-able shutdown flag shared by every long-lived loop.
///
/// Loops either poll [`is_triggered`](Self::is_triggered) between units of
/// work or `select!` on [`wait`](Self::wait) while sleeping. Triggering is
/// idempotent and sticky: once set, every current and future waiter returns
/// immediately.
#[derive(Clone)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
    notify: broadcast::Sender<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(1);
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            notify,
        }
    }

    /// Request shutdown. Safe to call from any task, any number of times.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
        // No receivers just means nobody is parked in wait() right now.
        let _ = self.notify.send(());
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Resolve once shutdown has been requested.
    pub async fn wait(&self) {
        let mut receiver = self.notify.subscribe();
        if self.is_triggered() {
            return;
        }
        let _ = receiver.recv().await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
