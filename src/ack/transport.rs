use crate::coordinator::ReplicaId;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// AckTransport carries encoded acks from one replica to another, outside the membership
/// exchange.
#[async_trait::async_trait]
pub trait AckTransport: Send + Sync + 'static {
    async fn send(&self, to: &ReplicaId, ack: Bytes) -> Result<(), AckTransportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AckTransportError {
    #[error("no route to replica {0}")]
    UnknownReplica(ReplicaId),
    #[error("replica {0} stopped receiving acks")]
    Disconnected(ReplicaId),
}

/// InMemoryAckNetwork delivers acks between replicas of one process. Each replica registers once
/// and drains its `AckInbox`.
pub struct InMemoryAckNetwork {
    inbox_capacity: usize,
    inboxes: Mutex<HashMap<ReplicaId, mpsc::Sender<Bytes>>>,
}

impl InMemoryAckNetwork {
    pub fn new(inbox_capacity: usize) -> Self {
        InMemoryAckNetwork {
            inbox_capacity,
            inboxes: Mutex::new(HashMap::new()),
        }
    }

    /// Registering again replaces the previous inbox, which then sees no more acks.
    pub fn register(&self, replica: ReplicaId) -> AckInbox {
        let (tx, rx) = mpsc::channel(self.inbox_capacity);
        self.inboxes
            .lock()
            .expect("InMemoryAckNetwork.register() mutex guard poison")
            .insert(replica, tx);

        AckInbox { rx }
    }
}

#[async_trait::async_trait]
impl AckTransport for InMemoryAckNetwork {
    async fn send(&self, to: &ReplicaId, ack: Bytes) -> Result<(), AckTransportError> {
        let inbox = self
            .inboxes
            .lock()
            .expect("InMemoryAckNetwork.send() mutex guard poison")
            .get(to)
            .cloned()
            .ok_or_else(|| AckTransportError::UnknownReplica(to.clone()))?;

        inbox
            .send(ack)
            .await
            .map_err(|_| AckTransportError::Disconnected(to.clone()))
    }
}

pub struct AckInbox {
    rx: mpsc::Receiver<Bytes>,
}

impl AckInbox {
    /// Returns `None` once this inbox has been replaced or the network dropped.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_to_registered_replicas_only() {
        let network = InMemoryAckNetwork::new(4);
        let mut inbox = network.register(ReplicaId::new("b"));

        network.send(&ReplicaId::new("b"), Bytes::from_static(b"ack")).await.unwrap();
        assert_eq!(inbox.recv().await, Some(Bytes::from_static(b"ack")));

        let result = network.send(&ReplicaId::new("c"), Bytes::new()).await;
        assert!(matches!(result, Err(AckTransportError::UnknownReplica(_))));

        drop(inbox);
        let result = network.send(&ReplicaId::new("b"), Bytes::new()).await;
        assert!(matches!(result, Err(AckTransportError::Disconnected(_))));
    }
}
