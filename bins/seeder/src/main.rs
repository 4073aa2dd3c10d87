//! Database seeder for Bastion.
//!
//! Installs the built-in module and permission catalog, then bootstraps a
//! root tenant with a system superuser role and one administrator. Every
//! step is idempotent, so the seeder can run after each migration.
//!
//! Environment:
//!   BASTION_SEED_TENANT_SLUG      - root tenant slug (default `root`)
//!   BASTION_SEED_TENANT_NAME      - root tenant name (default `Root`)
//!   BASTION_SEED_ADMIN_EMAIL      - administrator email (default `admin@bastion.local`)
//!   BASTION_SEED_ADMIN_PASSWORD   - administrator password (required)
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::{Context, bail};
use bastion_core::{auth::hash_password, permission::catalog};
use bastion_db::{
    CreateModuleInput, CreatePermissionInput, CreateRoleInput, CreateTenantInput,
    CreateUserInput, ModuleRepository, PermissionRepository, RoleRepository, TenantRepository,
    UserRepository, connect, entities::roles,
};
use bastion_shared::{
    AppConfig,
    contracts::{normalize_email, validation::validate_password_strength},
};
use sea_orm::DatabaseConnection;
use tracing::info;
use uuid::Uuid;

const SUPERUSER_ROLE: &str = "Super Admin";
const MIN_PASSWORD_LEN: usize = 8;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bastion=info,seeder=info".into()),
        )
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let db = Arc::new(
        connect(&config.database)
            .await
            .context("failed to connect to database")?,
    );

    seed_catalog(&db).await?;
    let tenant_id = seed_root_tenant(&db).await?;
    let role = seed_superuser_role(&db, tenant_id).await?;
    seed_admin(&db, tenant_id, role.id).await?;

    info!("Seeding complete");
    Ok(())
}

/// Creates every catalog module and permission that does not exist yet.
async fn seed_catalog(db: &Arc<DatabaseConnection>) -> anyhow::Result<()> {
    let modules = ModuleRepository::new(db.clone());
    let permissions = PermissionRepository::new(db.clone());
    let mut created = 0usize;

    for (position, entry) in catalog::MODULES.iter().enumerate() {
        let module = match modules.find_by_code(entry.code).await? {
            Some(existing) => existing,
            None => {
                let sort_order = i32::try_from(position * 10).unwrap_or(i32::MAX);
                modules
                    .create(CreateModuleInput {
                        code: entry.code.to_string(),
                        name: entry.name.to_string(),
                        description: Some(entry.description.to_string()),
                        sort_order,
                        is_active: true,
                    })
                    .await?
            }
        };

        for permission in entry.permissions {
            if permissions.find_by_code(permission.code).await?.is_some() {
                continue;
            }
            permissions
                .create(CreatePermissionInput {
                    module_id: module.id,
                    code: permission.code.to_string(),
                    name: permission.name.to_string(),
                    description: None,
                })
                .await?;
            created += 1;
        }
    }

    info!(
        modules = catalog::MODULES.len(),
        permissions_created = created,
        "Permission catalog seeded"
    );
    Ok(())
}

async fn seed_root_tenant(db: &Arc<DatabaseConnection>) -> anyhow::Result<Uuid> {
    let slug = env_or("BASTION_SEED_TENANT_SLUG", "root");
    let tenants = TenantRepository::new(db.clone());

    if let Some(existing) = tenants.find_by_slug(&slug).await? {
        info!(tenant_id = %existing.id, slug = %slug, "Root tenant already exists");
        return Ok(existing.id);
    }

    let tenant = tenants
        .create(CreateTenantInput {
            name: env_or("BASTION_SEED_TENANT_NAME", "Root"),
            slug,
            is_active: true,
        })
        .await?;
    info!(tenant_id = %tenant.id, slug = %tenant.slug, "Root tenant created");
    Ok(tenant.id)
}

async fn seed_superuser_role(
    db: &Arc<DatabaseConnection>,
    tenant_id: Uuid,
) -> anyhow::Result<roles::Model> {
    let roles = RoleRepository::new(db.clone());

    if let Some(existing) = roles
        .list(tenant_id)
        .await?
        .into_iter()
        .find(|r| r.name == SUPERUSER_ROLE)
    {
        if !existing.is_superuser {
            bail!("role {SUPERUSER_ROLE:?} exists but is not a superuser role");
        }
        return Ok(existing);
    }

    let role = roles
        .create(CreateRoleInput {
            tenant_id,
            name: SUPERUSER_ROLE.to_string(),
            description: Some("Built-in role holding every permission".to_string()),
            is_superuser: true,
            is_system: true,
            permission_ids: Vec::new(),
        })
        .await?;
    info!(role_id = %role.id, "Superuser role created");
    Ok(role)
}

async fn seed_admin(
    db: &Arc<DatabaseConnection>,
    tenant_id: Uuid,
    role_id: Uuid,
) -> anyhow::Result<()> {
    let email = normalize_email(&env_or("BASTION_SEED_ADMIN_EMAIL", "admin@bastion.local"));
    let users = UserRepository::new(db.clone());

    if let Some(existing) = users.find_by_email(tenant_id, &email).await? {
        info!(user_id = %existing.id, "Administrator already exists");
        return Ok(());
    }

    let password = std::env::var("BASTION_SEED_ADMIN_PASSWORD")
        .context("BASTION_SEED_ADMIN_PASSWORD must be set to create the administrator")?;
    if password.chars().count() < MIN_PASSWORD_LEN || validate_password_strength(&password).is_err()
    {
        bail!(
            "BASTION_SEED_ADMIN_PASSWORD needs at least {MIN_PASSWORD_LEN} characters with a letter and a digit"
        );
    }

    let user = users
        .create(CreateUserInput {
            tenant_id,
            email,
            password_hash: hash_password(&password)?,
            full_name: "Administrator".to_string(),
            role_id: Some(role_id),
            is_active: true,
        })
        .await?;
    info!(user_id = %user.id, email = %user.email, "Administrator created");
    Ok(())
}
