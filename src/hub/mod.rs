//! Broadcast Hub (§4.4): fans serialized JSON events out to every connected
//! UI subscriber. Each subscriber gets its own bounded `tokio::sync::mpsc`
//! queue so one slow client can't starve the others.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

const CHANNEL_BUFFER: usize = 256;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastKind {
    Message,
    ConversationUpdate,
    Qr,
    ConnectionStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct BroadcastEvent {
    #[serde(rename = "type")]
    pub kind: BroadcastKind,
    pub inbox_id: Uuid,
    pub data: serde_json::Value,
}

struct Subscriber {
    id: u64,
    tx: mpsc::Sender<BroadcastEvent>,
}

pub struct BroadcastHub {
    tx: mpsc::Sender<BroadcastEvent>,
    subscribers: RwLock<Vec<Subscriber>>,
    next_id: AtomicU64,
}

pub struct Subscription {
    pub id: u64,
    pub rx: mpsc::Receiver<BroadcastEvent>,
}

impl BroadcastHub {
    /// `buffer` is the hub's own enqueue channel (§4.4 "buffer 256"); each
    /// subscriber additionally gets its own bounded fan-out channel of the
    /// same size so one slow client can't starve the others.
    pub fn new(buffer: usize) -> std::sync::Arc<Self> {
        let buffer = if buffer == 0 { CHANNEL_BUFFER } else { buffer };
        let (tx, rx) = mpsc::channel(buffer);
        let hub = std::sync::Arc::new(Self {
            tx,
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        });
        tokio::spawn(Self::run(hub.clone(), rx));
        hub
    }

    async fn run(hub: std::sync::Arc<Self>, mut rx: mpsc::Receiver<BroadcastEvent>) {
        while let Some(event) = rx.recv().await {
            let subscribers = hub.subscribers.read().await;
            let mut dead = Vec::new();
            for sub in subscribers.iter() {
                if sub.tx.try_send(event.clone()).is_err() {
                    dead.push(sub.id);
                }
            }
            drop(subscribers);
            if !dead.is_empty() {
                let mut subscribers = hub.subscribers.write().await;
                subscribers.retain(|s| !dead.contains(&s.id));
            }
        }
    }

    /// Enqueues onto the bounded channel; drop-and-log on overflow (§4.4).
    pub fn broadcast(&self, event: BroadcastEvent) {
        if self.tx.try_send(event).is_err() {
            tracing::warn!("broadcast hub queue full, dropping event");
        }
    }

    pub async fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);
        self.subscribers.write().await.push(Subscriber { id, tx });
        Subscription { id, rx }
    }

    pub async fn unsubscribe(&self, id: u64) {
        self.subscribers.write().await.retain(|s| s.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_broadcast_events() {
        let hub = BroadcastHub::new(8);
        let mut sub = hub.subscribe().await;

        hub.broadcast(BroadcastEvent {
            kind: BroadcastKind::Message,
            inbox_id: Uuid::nil(),
            data: serde_json::json!({"hello": "world"}),
        });

        let event = tokio::time::timeout(std::time::Duration::from_secs(1), sub.rx.recv())
            .await
            .expect("did not time out")
            .expect("channel not closed");
        assert_eq!(event.inbox_id, Uuid::nil());
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let hub = BroadcastHub::new(8);
        let sub = hub.subscribe().await;
        hub.unsubscribe(sub.id).await;

        hub.broadcast(BroadcastEvent {
            kind: BroadcastKind::Qr,
            inbox_id: Uuid::nil(),
            data: serde_json::json!({}),
        });

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(hub.subscribers.read().await.len(), 0);
    }
}
