//! Repository trait definitions.

use crate::Filter;
use async_trait::async_trait;
use userbase_core::{Email, Fetched, NewUser, PageRequest, User, UserId, UserbaseResult};

/// User persistence as seen by the service layer.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Checks whether a non-deleted user holds `email`.
    async fn email_exists(&self, email: &Email) -> UserbaseResult<bool>;

    /// Persists a new user and returns it without the password hash.
    async fn create(&self, user: &NewUser) -> UserbaseResult<User>;

    /// Finds a non-deleted user by ID.
    async fn find_by_id(&self, id: UserId) -> UserbaseResult<Option<User>>;

    /// Lists users matching `filter`, one page at a time.
    async fn find_all(&self, filter: Filter, page: PageRequest) -> UserbaseResult<Fetched<User>>;
}
