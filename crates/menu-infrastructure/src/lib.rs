//! # Menu Infrastructure
//!
//! Database and messaging implementations (adapters) for the menu catalog
//! ports.

pub mod database;
pub mod notifier;

pub use database::{create_pool, run_migrations, PgMenuRepository, PgRoleGrantRepository};
pub use notifier::{BroadcastChangeNotifier, RedisChangeNotifier};
