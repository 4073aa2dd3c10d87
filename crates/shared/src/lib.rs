//! Shared contracts, errors, and configuration for Bastion.
//!
//! This crate provides common types used across all other crates:
//! - Request/response contracts with their validation rules
//! - JWT claims and the token service
//! - Application-wide error types
//! - Configuration management

pub mod auth;
pub mod config;
pub mod contracts;
pub mod error;
pub mod jwt;

mod jwt_tests;

pub use auth::{Claims, TokenKind, TokenPair};
pub use self::config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{IssuedToken, JwtConfig, JwtError, JwtService};
