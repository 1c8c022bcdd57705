//! Permission-invalidation event and the outbound notifier port.
//!
//! Publication is best-effort: the menu service logs a failed publish and
//! keeps the preceding structural commit.

use async_trait::async_trait;
use menu_shared::UserId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionChangeEvent {
    pub affected_user_id: Option<UserId>,
    pub full_refresh: bool,
}

impl PermissionChangeEvent {
    /// Catalog-level structural change: every cached permission set is
    /// stale.
    pub fn full_refresh() -> Self {
        Self { affected_user_id: None, full_refresh: true }
    }

    /// Grant-level change affecting a single user.
    pub fn for_user(user_id: UserId) -> Self {
        Self { affected_user_id: Some(user_id), full_refresh: false }
    }
}

#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    async fn publish(&self, event: PermissionChangeEvent) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_refresh_shape() {
        let event = PermissionChangeEvent::full_refresh();
        assert_eq!(event.affected_user_id, None);
        assert!(event.full_refresh);
    }

    #[test]
    fn test_event_serializes() {
        let json = serde_json::to_string(&PermissionChangeEvent::for_user(9)).unwrap();
        assert!(json.contains("\"affected_user_id\":9"));
        assert!(json.contains("\"full_refresh\":false"));
    }
}
