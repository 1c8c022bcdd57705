//! Redis pub/sub change notifier. Downstream services subscribe to the
//! channel and drop their cached permission sets on every event.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::debug;

use menu_core::error::DomainError;
use menu_core::notify::{ChangeNotifier, PermissionChangeEvent};
use menu_shared::constants::PERMISSION_CHANGE_CHANNEL;

pub struct RedisChangeNotifier {
    conn: ConnectionManager,
    channel: String,
}

impl RedisChangeNotifier {
    pub async fn connect(url: &str, channel: impl Into<String>) -> Result<Self, redis::RedisError> {
        let client = Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn, channel: channel.into() })
    }

    pub async fn connect_default(url: &str) -> Result<Self, redis::RedisError> {
        Self::connect(url, PERMISSION_CHANGE_CHANNEL).await
    }
}

#[async_trait]
impl ChangeNotifier for RedisChangeNotifier {
    async fn publish(&self, event: PermissionChangeEvent) -> Result<(), DomainError> {
        let payload = serde_json::to_string(&event)
            .map_err(|e| DomainError::NotificationError(e.to_string()))?;

        let mut conn = self.conn.clone();
        let receivers: i64 = conn
            .publish(&self.channel, payload)
            .await
            .map_err(|e| DomainError::NotificationError(e.to_string()))?;

        debug!("Permission change published to {} subscribers", receivers);
        Ok(())
    }
}
