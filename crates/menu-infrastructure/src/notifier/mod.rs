//! Change-notifier adapters (permission-invalidation fan-out)

pub mod broadcast_notifier;
pub mod redis_notifier;

pub use broadcast_notifier::BroadcastChangeNotifier;
pub use redis_notifier::RedisChangeNotifier;
