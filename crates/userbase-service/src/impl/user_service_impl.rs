//! User service implementations.

use crate::dto::{
    RegisterRequest, Registration, UserListQuery, UserListResponse, UserResponse,
    PHONE_ALREADY_EXISTS,
};
use crate::user_service::UserService;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};
use userbase_core::{
    Email, HashedPassword, PageRequest, PasswordEncoder, UserId, UserbaseError, UserbaseResult,
    ValidateExt,
};
use userbase_repository::{Filter, UserRepository};

/// Default minimum password length.
pub const DEFAULT_PASSWORD_MIN_LENGTH: u64 = 8;

/// User service backed by a [`UserRepository`].
pub struct UserServiceImpl<R: UserRepository + ?Sized> {
    user_repository: Arc<R>,
    password_encoder: Arc<dyn PasswordEncoder>,
    password_min_length: u64,
}

impl<R: UserRepository + ?Sized> UserServiceImpl<R> {
    /// Creates a new user service.
    pub fn new(user_repository: Arc<R>, password_encoder: Arc<dyn PasswordEncoder>) -> Self {
        Self {
            user_repository,
            password_encoder,
            password_min_length: DEFAULT_PASSWORD_MIN_LENGTH,
        }
    }

    /// Sets the minimum accepted password length.
    #[must_use]
    pub const fn with_password_min_length(mut self, min_length: u64) -> Self {
        self.password_min_length = min_length;
        self
    }

    fn check_password(&self, password: &str) -> UserbaseResult<()> {
        if (password.chars().count() as u64) < self.password_min_length {
            return Err(UserbaseError::validation(format!(
                "password: must be at least {} characters",
                self.password_min_length
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<R: UserRepository + ?Sized + 'static> UserService for UserServiceImpl<R> {
    async fn register(&self, request: RegisterRequest) -> UserbaseResult<Registration> {
        debug!("Registering user: {}", request.masked_email());

        request.reject_computed_fields()?;
        request.validate_request()?;
        self.check_password(&request.password)?;

        let email = Email::new(&request.email)?;

        if self.user_repository.email_exists(&email).await? {
            info!(email = %email.masked(), "Registration skipped, email already exists");
            return Ok(Registration::already_exists());
        }

        let password = HashedPassword::from_plain(&request.password, self.password_encoder.as_ref())?;
        let new_user = request.into_new_user(email, password);

        match self.user_repository.create(&new_user).await {
            Ok(user) => {
                info!("User registered: {}", user.id);
                Ok(Registration::Created(Box::new(UserResponse::from(user))))
            }
            // Lost the race against a concurrent registration of the same email.
            Err(err) if err.is_unique_violation_on("email") => {
                info!(
                    email = %new_user.email.masked(),
                    "Registration hit the email unique index"
                );
                Ok(Registration::already_exists())
            }
            Err(err) if err.is_unique_violation_on("phone") => {
                info!("Registration rejected, phone number already registered");
                Err(UserbaseError::conflict(PHONE_ALREADY_EXISTS))
            }
            Err(err) => {
                warn!(error = %err, "Registration failed");
                Err(err)
            }
        }
    }

    async fn get_user(&self, id: UserId) -> UserbaseResult<UserResponse> {
        debug!("Getting user: {}", id);

        let user = self
            .user_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| UserbaseError::not_found("User", id))?;

        Ok(UserResponse::from(user))
    }

    async fn list_users(&self, query: UserListQuery) -> UserbaseResult<UserListResponse> {
        let page = PageRequest::new(
            query.page.unwrap_or(1),
            query.limit.unwrap_or(PageRequest::DEFAULT_LIMIT),
        );
        debug!("Listing users, page: {}, limit: {}", page.page, page.limit);

        let mut filter = Filter::new();
        if let Some(email) = query.email {
            filter.insert("email", email.trim().to_lowercase());
        }
        if let Some(status) = query.status {
            filter.insert("status", status);
        }

        let users = self.user_repository.find_all(filter, page).await?;
        Ok(UserListResponse::from(users))
    }
}

impl<R: UserRepository + ?Sized> std::fmt::Debug for UserServiceImpl<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserServiceImpl")
            .field("password_min_length", &self.password_min_length)
            .finish_non_exhaustive()
    }
}
