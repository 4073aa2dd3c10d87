//! Entity re-exports.

pub use super::modules::Entity as Modules;
pub use super::permissions::Entity as Permissions;
pub use super::role_permissions::Entity as RolePermissions;
pub use super::roles::Entity as Roles;
pub use super::sessions::Entity as Sessions;
pub use super::tenants::Entity as Tenants;
pub use super::users::Entity as Users;
