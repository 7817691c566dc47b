//! # Userbase Security
//!
//! Argon2id password hashing behind the [`PasswordEncoder`] seam defined in
//! `userbase-core`.
//!
//! [`PasswordEncoder`]: userbase_core::PasswordEncoder

pub mod password;

pub use password::*;
