//! Common identifier types

use uuid::Uuid;

/// Menu node identifier. Opaque string; the root-parent sentinel `"0"` and
/// the synthetic picker root reuse this type without being real node ids.
pub type MenuId = String;

/// User identifier, as issued by the acting-user collaborator.
pub type UserId = i64;

pub fn new_menu_id() -> MenuId {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_menu_id_is_dashless() {
        let id = new_menu_id();
        assert_eq!(id.len(), 32);
        assert!(!id.contains('-'));
    }
}
