//! Every permission code the API checks, grouped by module.
//!
//! Handlers reference the constants; the seeder installs [`MODULES`] so a
//! fresh database knows every code a route can ask for.

/// `tenants.read`
pub const TENANTS_READ: &str = "tenants.read";
/// `tenants.create`
pub const TENANTS_CREATE: &str = "tenants.create";
/// `tenants.update`
pub const TENANTS_UPDATE: &str = "tenants.update";
/// `tenants.delete`
pub const TENANTS_DELETE: &str = "tenants.delete";

/// `users.read`
pub const USERS_READ: &str = "users.read";
/// `users.create`
pub const USERS_CREATE: &str = "users.create";
/// `users.update`
pub const USERS_UPDATE: &str = "users.update";
/// `users.delete`
pub const USERS_DELETE: &str = "users.delete";

/// `roles.read`
pub const ROLES_READ: &str = "roles.read";
/// `roles.create`
pub const ROLES_CREATE: &str = "roles.create";
/// `roles.update`
pub const ROLES_UPDATE: &str = "roles.update";
/// `roles.delete`
pub const ROLES_DELETE: &str = "roles.delete";

/// `role_permissions.read`
pub const ROLE_PERMISSIONS_READ: &str = "role_permissions.read";
/// `role_permissions.update`
pub const ROLE_PERMISSIONS_UPDATE: &str = "role_permissions.update";

/// `modules.read`
pub const MODULES_READ: &str = "modules.read";
/// `modules.create`
pub const MODULES_CREATE: &str = "modules.create";
/// `modules.update`
pub const MODULES_UPDATE: &str = "modules.update";
/// `modules.delete`
pub const MODULES_DELETE: &str = "modules.delete";

/// `permissions.read`
pub const PERMISSIONS_READ: &str = "permissions.read";
/// `permissions.create`
pub const PERMISSIONS_CREATE: &str = "permissions.create";
/// `permissions.update`
pub const PERMISSIONS_UPDATE: &str = "permissions.update";
/// `permissions.delete`
pub const PERMISSIONS_DELETE: &str = "permissions.delete";

/// A permission shipped with the platform.
#[derive(Debug, Clone, Copy)]
pub struct CatalogPermission {
    /// Code.
    pub code: &'static str,
    /// Display name.
    pub name: &'static str,
}

/// A module shipped with the platform.
#[derive(Debug, Clone, Copy)]
pub struct CatalogModule {
    /// Module code, the prefix of every permission below.
    pub code: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Description.
    pub description: &'static str,
    /// Permissions of the module.
    pub permissions: &'static [CatalogPermission],
}

const fn perm(code: &'static str, name: &'static str) -> CatalogPermission {
    CatalogPermission { code, name }
}

/// The built-in modules in display order.
pub const MODULES: &[CatalogModule] = &[
    CatalogModule {
        code: "tenants",
        name: "Tenants",
        description: "Tenant administration",
        permissions: &[
            perm(TENANTS_READ, "View tenants"),
            perm(TENANTS_CREATE, "Create tenants"),
            perm(TENANTS_UPDATE, "Edit tenants"),
            perm(TENANTS_DELETE, "Delete tenants"),
        ],
    },
    CatalogModule {
        code: "users",
        name: "Users",
        description: "User accounts of a tenant",
        permissions: &[
            perm(USERS_READ, "View users"),
            perm(USERS_CREATE, "Create users"),
            perm(USERS_UPDATE, "Edit users"),
            perm(USERS_DELETE, "Delete users"),
        ],
    },
    CatalogModule {
        code: "roles",
        name: "Roles",
        description: "Roles of a tenant",
        permissions: &[
            perm(ROLES_READ, "View roles"),
            perm(ROLES_CREATE, "Create roles"),
            perm(ROLES_UPDATE, "Edit roles"),
            perm(ROLES_DELETE, "Delete roles"),
        ],
    },
    CatalogModule {
        code: "role_permissions",
        name: "Role permissions",
        description: "Permissions granted to roles",
        permissions: &[
            perm(ROLE_PERMISSIONS_READ, "View role permissions"),
            perm(ROLE_PERMISSIONS_UPDATE, "Grant and revoke role permissions"),
        ],
    },
    CatalogModule {
        code: "modules",
        name: "Modules",
        description: "Functional areas grouping permissions",
        permissions: &[
            perm(MODULES_READ, "View modules"),
            perm(MODULES_CREATE, "Create modules"),
            perm(MODULES_UPDATE, "Edit modules"),
            perm(MODULES_DELETE, "Delete modules"),
        ],
    },
    CatalogModule {
        code: "permissions",
        name: "Permissions",
        description: "Permission definitions",
        permissions: &[
            perm(PERMISSIONS_READ, "View permissions"),
            perm(PERMISSIONS_CREATE, "Create permissions"),
            perm(PERMISSIONS_UPDATE, "Edit permissions"),
            perm(PERMISSIONS_DELETE, "Delete permissions"),
        ],
    },
];

/// Iterates over every built-in permission code.
pub fn all_codes() -> impl Iterator<Item = &'static str> {
    MODULES
        .iter()
        .flat_map(|module| module.permissions.iter().map(|p| p.code))
}
