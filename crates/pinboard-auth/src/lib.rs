//! Pinboard Authentication and Authorization
//!
//! This crate provides password hashing, JWT-based authentication and
//! resource-ownership authorization for Pinboard.

pub mod error;
pub mod jwt;
pub mod ownership;
pub mod password;

pub use error::AuthError;
pub use jwt::{Claims, TokenService};
pub use ownership::ensure_owner;
pub use password::{hash_password, verify_password};
