//! PostgreSQL repository implementations

pub mod menu_repo_impl;
pub mod role_grant_repo_impl;

pub use menu_repo_impl::PgMenuRepository;
pub use role_grant_repo_impl::PgRoleGrantRepository;
