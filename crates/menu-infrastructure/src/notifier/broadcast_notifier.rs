//! In-process change notifier over a tokio broadcast channel, for tests and
//! single-process deployments.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::warn;

use menu_core::error::DomainError;
use menu_core::notify::{ChangeNotifier, PermissionChangeEvent};

pub struct BroadcastChangeNotifier {
    tx: broadcast::Sender<PermissionChangeEvent>,
}

impl BroadcastChangeNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PermissionChangeEvent> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl ChangeNotifier for BroadcastChangeNotifier {
    async fn publish(&self, event: PermissionChangeEvent) -> Result<(), DomainError> {
        // A send error only means nobody is listening right now; that is not
        // a delivery failure worth surfacing.
        if let Err(e) = self.tx.send(event) {
            warn!("No subscribers for permission change event: {}", e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let notifier = BroadcastChangeNotifier::new(8);
        let mut rx = notifier.subscribe();

        notifier.publish(PermissionChangeEvent::full_refresh()).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event, PermissionChangeEvent::full_refresh());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let notifier = BroadcastChangeNotifier::new(8);
        assert!(notifier.publish(PermissionChangeEvent::for_user(3)).await.is_ok());
    }
}
