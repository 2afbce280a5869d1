// src/bot/queue.rs - Ingestion queue between platform callbacks and the consumer

use std::time::Duration;

use log::warn;
use tokio::sync::mpsc;

use crate::types::ChatMessage;

/// Producer half of the ingestion queue. Platform callbacks clone this freely;
/// enqueueing never blocks them.
#[derive(Clone)]
pub struct MessageQueue {
    tx: mpsc::UnboundedSender<ChatMessage>,
}

/// Consumer half. There is exactly one, owned by the chat monitor.
pub struct MessageReceiver {
    rx: mpsc::UnboundedReceiver<ChatMessage>,
}

/// Create a connected producer/consumer pair.
pub fn message_queue() -> (MessageQueue, MessageReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MessageQueue { tx }, MessageReceiver { rx })
}

impl MessageQueue {
    pub fn enqueue(&self, message: ChatMessage) {
        if self.tx.send(message).is_err() {
            // Consumer gone; normal during shutdown.
            warn!("chat queue closed, dropping message");
        }
    }
}

impl MessageReceiver {
    /// Wait up to `timeout` for a message. `None` on timeout (or a closed
    /// queue) so the caller can check the shutdown flag and poll again.
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Option<ChatMessage> {
        tokio::time::timeout(timeout, self.rx.recv()).await.ok().flatten()
    }
}
