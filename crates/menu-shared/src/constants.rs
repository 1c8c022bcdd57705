//! Application-wide constants

/// `parent_id` value marking a top-level node.
pub const ROOT_PARENT_ID: &str = "0";

/// Synthetic picker-root node; never persisted.
pub const SYNTHETIC_ROOT_ID: &str = "0";
pub const SYNTHETIC_ROOT_PARENT_ID: &str = "-1";
pub const SYNTHETIC_ROOT_TITLE: &str = "Root";

/// Redis channel for permission-invalidation events.
pub const PERMISSION_CHANGE_CHANNEL: &str = "menu:permission-change";
