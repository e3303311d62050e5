//! Cryptographic utilities
//!
//! - **Password hashing**: Argon2id with a random salt, constant-time verification

pub mod password_hash;

pub use password_hash::{PasswordHashError, PasswordHasher};
