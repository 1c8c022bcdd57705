//! Repository traits (ports)

pub mod menu_repository;
pub mod role_grant_repository;

pub use menu_repository::{DerivedUpdate, MenuFilter, MenuRepository};
pub use role_grant_repository::RoleGrantRepository;
