//! Common test infrastructure for database integration tests.

#![allow(dead_code)]

use userbase_core::{Email, HashedPassword, NewUser};
use userbase_repository::DatabasePool;

pub const HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA";

/// Creates a migrated in-memory database.
///
/// The pool holds a single connection, so a test must not issue unbound
/// queries while a transaction on the same pool is open.
pub async fn test_pool() -> DatabasePool {
    let pool = DatabasePool::in_memory()
        .await
        .expect("Failed to open in-memory database");
    pool.run_migrations()
        .await
        .expect("Failed to run migrations");
    pool
}

/// A new user with a fixed password hash.
pub fn new_user(first_name: &str, last_name: &str, email: &str) -> NewUser {
    NewUser::new(
        first_name,
        last_name,
        Email::new(email).expect("valid email"),
        HashedPassword::from_hash(HASH).expect("valid hash"),
    )
}
