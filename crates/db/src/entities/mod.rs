//! `SeaORM` entity definitions.
//!
//! One module per table. Conversions into the API response contracts live
//! next to each entity so that secrets such as password hashes never leave
//! this crate.

pub mod prelude;

pub mod modules;
pub mod permissions;
pub mod role_permissions;
pub mod roles;
pub mod sessions;
pub mod tenants;
pub mod users;
