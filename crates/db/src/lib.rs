//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for every table
//! - Repository abstractions for data access
//! - Database migrations

pub mod entities;
pub mod error;
pub mod migration;
pub mod repositories;

pub use error::db_error;
pub use repositories::{
    CreateModuleInput, CreatePermissionInput, CreateRoleInput, CreateTenantInput,
    CreateUserInput, ModuleFilter, ModuleRepository, PermissionRepository,
    RolePermissionRepository, RoleRepository, SessionRepository, TenantRepository,
    UpdateModuleInput, UpdatePermissionInput, UpdateRoleInput, UpdateTenantInput,
    UpdateUserInput, UserFilter, UserRepository,
};

use std::time::Duration;

use bastion_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .sqlx_logging(false);

    Database::connect(options).await
}
