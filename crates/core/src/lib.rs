//! Core authorization logic for Bastion.
//!
//! This crate contains pure logic with ZERO web or database dependencies.
//!
//! # Modules
//!
//! - `auth` - Password hashing and verification
//! - `permission` - Permission codes, permission sets and the authorization decision

pub mod auth;
pub mod permission;
