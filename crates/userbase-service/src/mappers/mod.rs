//! Entity-DTO mappers.

use crate::dto::{UserListResponse, UserResponse};
use userbase_core::{Fetched, User};

impl From<Fetched<User>> for UserListResponse {
    fn from(fetched: Fetched<User>) -> Self {
        let fetched = fetched.map(UserResponse::from);
        Self {
            data: fetched.data,
            pagination: fetched.pagination,
        }
    }
}
