use crate::coordinator::ReplicaId;
use bytes::Bytes;
use std::collections::BTreeMap;
use tokio::sync::watch;

/// MembershipExchange is the coordination substrate replicas use to see each other's trackers: any
/// linearizable, watchable key/value store where each member of a partition owns one key under the
/// partition's root path.
///
/// Implementations only move opaque bytes. Encoding and interpreting snapshots is up to the caller.
#[async_trait::async_trait]
pub trait MembershipExchange: Send + Sync + 'static {
    /// Create or replace `member`'s snapshot under `root_path`.
    async fn publish(&self, root_path: &str, member: &ReplicaId, snapshot: Bytes) -> Result<(), ExchangeError>;

    /// Remove `member`'s snapshot. Removing an absent member is not an error.
    async fn withdraw(&self, root_path: &str, member: &ReplicaId) -> Result<(), ExchangeError>;

    /// Watch every member's snapshot under `root_path`.
    async fn subscribe(&self, root_path: &str) -> Result<MembershipUpdates, ExchangeError>;

    /// Read every member's snapshot under `root_path` once.
    async fn current_members(&self, root_path: &str) -> Result<MembershipView, ExchangeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    // Retry with backoff.
    #[error("coordination substrate unavailable: {0}")]
    Unavailable(String),
    #[error("coordination substrate has shut down")]
    Closed,
}

/// Every member's latest published snapshot under one root path, as of `version`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MembershipView {
    pub version: u64,
    pub members: BTreeMap<ReplicaId, Bytes>,
}

/// MembershipUpdates is a subscription to a root path. Intermediate views are not queued; a slow
/// reader only sees the latest one.
pub struct MembershipUpdates {
    receiver: watch::Receiver<MembershipView>,
    delivered_initial: bool,
}

impl MembershipUpdates {
    pub fn new(receiver: watch::Receiver<MembershipView>) -> Self {
        MembershipUpdates {
            receiver,
            delivered_initial: false,
        }
    }

    /// The first call returns the current view right away. Later calls wait for the next change.
    /// Returns `None` once the exchange has dropped the path.
    pub async fn next(&mut self) -> Option<MembershipView> {
        if !self.delivered_initial {
            self.delivered_initial = true;
            return Some(self.receiver.borrow_and_update().clone());
        }

        match self.receiver.changed().await {
            Ok(_) => Some(self.receiver.borrow_and_update().clone()),
            Err(_) => None,
        }
    }
}
