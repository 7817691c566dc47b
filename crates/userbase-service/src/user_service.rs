//! User service trait definition.

use crate::dto::{RegisterRequest, Registration, UserListQuery, UserListResponse, UserResponse};
use async_trait::async_trait;
use userbase_core::{UserId, UserbaseResult};

/// User service trait.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Registers a new user, or reports that the email is taken.
    async fn register(&self, request: RegisterRequest) -> UserbaseResult<Registration>;

    /// Gets a user by ID.
    async fn get_user(&self, id: UserId) -> UserbaseResult<UserResponse>;

    /// Lists users matching the query.
    async fn list_users(&self, query: UserListQuery) -> UserbaseResult<UserListResponse>;
}
