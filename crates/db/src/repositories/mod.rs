//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Each repository has its own error enum that converts into
//! [`bastion_shared::AppError`].

pub mod module;
pub mod permission;
pub mod role;
pub mod role_permission;
pub mod session;
pub mod tenant;
pub mod user;

pub use module::{CreateModuleInput, ModuleError, ModuleFilter, ModuleRepository, UpdateModuleInput};
pub use permission::{
    CreatePermissionInput, PermissionRepoError, PermissionRepository, UpdatePermissionInput,
};
pub use role::{CreateRoleInput, RoleError, RoleRepository, UpdateRoleInput};
pub use role_permission::{RolePermissionError, RolePermissionRepository};
pub use session::{NewSession, SessionRepository};
pub use tenant::{CreateTenantInput, TenantError, TenantRepository, UpdateTenantInput};
pub use user::{CreateUserInput, UpdateUserInput, UserError, UserFilter, UserRepository};

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;

    use sea_orm::Value;

    /// Mock row answering a `PaginatorTrait::count` query.
    pub fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
    }
}
