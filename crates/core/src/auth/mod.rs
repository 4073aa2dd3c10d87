//! Authentication primitives.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - Password verification, including a constant-cost path for unknown accounts

mod password;

pub use password::{PasswordError, hash_password, verify_dummy, verify_password};
