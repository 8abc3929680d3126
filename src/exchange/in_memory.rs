use crate::coordinator::ReplicaId;
use crate::exchange::api::{ExchangeError, MembershipExchange, MembershipUpdates, MembershipView};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;

/// InMemoryExchange is a single-process coordination substrate. Every coordinator of a test or a
/// demo shares one instance through an `Arc`.
///
/// It can be switched "unavailable" to exercise retry paths.
pub struct InMemoryExchange {
    paths: Mutex<HashMap<String, watch::Sender<MembershipView>>>,
    available: AtomicBool,
}

impl InMemoryExchange {
    pub fn new() -> Self {
        InMemoryExchange {
            paths: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// While unavailable, every call fails with `ExchangeError::Unavailable`. Existing
    /// subscriptions stay open but see no changes.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    fn check_available(&self) -> Result<(), ExchangeError> {
        if self.available.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(ExchangeError::Unavailable("in-memory exchange switched off".into()))
        }
    }

    fn with_path<T>(&self, root_path: &str, f: impl FnOnce(&watch::Sender<MembershipView>) -> T) -> T {
        let mut paths = self.paths.lock().expect("InMemoryExchange mutex guard poison");
        let sender = paths
            .entry(root_path.to_string())
            .or_insert_with(|| watch::channel(MembershipView::default()).0);
        f(sender)
    }
}

impl Default for InMemoryExchange {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MembershipExchange for InMemoryExchange {
    async fn publish(&self, root_path: &str, member: &ReplicaId, snapshot: Bytes) -> Result<(), ExchangeError> {
        self.check_available()?;
        self.with_path(root_path, |sender| {
            sender.send_modify(|view| {
                view.members.insert(member.clone(), snapshot);
                view.version += 1;
            })
        });
        Ok(())
    }

    async fn withdraw(&self, root_path: &str, member: &ReplicaId) -> Result<(), ExchangeError> {
        self.check_available()?;
        self.with_path(root_path, |sender| {
            sender.send_if_modified(|view| {
                let removed = view.members.remove(member).is_some();
                if removed {
                    view.version += 1;
                }
                removed
            })
        });
        Ok(())
    }

    async fn subscribe(&self, root_path: &str) -> Result<MembershipUpdates, ExchangeError> {
        self.check_available()?;
        Ok(self.with_path(root_path, |sender| MembershipUpdates::new(sender.subscribe())))
    }

    async fn current_members(&self, root_path: &str) -> Result<MembershipView, ExchangeError> {
        self.check_available()?;
        Ok(self.with_path(root_path, |sender| sender.borrow().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const ROOT: &str = "/export/partition-0/orders";

    async fn next_view(updates: &mut MembershipUpdates) -> MembershipView {
        tokio::time::timeout(Duration::from_secs(5), updates.next())
            .await
            .expect("Unexpected timeout")
            .expect("Exchange dropped the path")
    }

    #[tokio::test]
    async fn subscribers_see_publishes_and_withdrawals() {
        let exchange = InMemoryExchange::new();
        let (a, b) = (ReplicaId::new("a"), ReplicaId::new("b"));

        let mut updates = exchange.subscribe(ROOT).await.unwrap();
        assert!(next_view(&mut updates).await.members.is_empty());

        exchange.publish(ROOT, &a, Bytes::from_static(b"one")).await.unwrap();
        let view = next_view(&mut updates).await;
        assert_eq!(view.members.get(&a), Some(&Bytes::from_static(b"one")));

        exchange.publish(ROOT, &b, Bytes::from_static(b"two")).await.unwrap();
        exchange.publish(ROOT, &a, Bytes::from_static(b"three")).await.unwrap();
        let view = next_view(&mut updates).await;
        assert_eq!(view.members.len(), 2);
        assert_eq!(view.members.get(&a), Some(&Bytes::from_static(b"three")));
        assert_eq!(view.version, 3);

        exchange.withdraw(ROOT, &a).await.unwrap();
        let view = next_view(&mut updates).await;
        assert_eq!(view.members.keys().collect::<Vec<_>>(), vec![&b]);

        // Withdrawing twice changes nothing.
        exchange.withdraw(ROOT, &a).await.unwrap();
        assert_eq!(exchange.current_members(ROOT).await.unwrap().version, 4);
    }

    #[tokio::test]
    async fn root_paths_are_isolated() {
        let exchange = InMemoryExchange::new();
        exchange
            .publish(ROOT, &ReplicaId::new("a"), Bytes::from_static(b"x"))
            .await
            .unwrap();

        let other = exchange.current_members("/export/partition-1/orders").await.unwrap();
        assert!(other.members.is_empty());
        assert_eq!(exchange.current_members(ROOT).await.unwrap().members.len(), 1);
    }

    #[tokio::test]
    async fn unavailable_exchange_fails_calls() {
        let exchange = InMemoryExchange::new();
        exchange.set_available(false);

        let result = exchange.publish(ROOT, &ReplicaId::new("a"), Bytes::new()).await;
        assert!(matches!(result, Err(ExchangeError::Unavailable(_))));
        assert!(exchange.subscribe(ROOT).await.is_err());

        exchange.set_available(true);
        exchange.publish(ROOT, &ReplicaId::new("a"), Bytes::new()).await.unwrap();
    }
}
