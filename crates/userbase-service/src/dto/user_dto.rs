//! User-related DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use userbase_core::{
    rules, Email, HashedPassword, NewUser, Pagination, User, UserId, UserStatus,
    UserbaseResult,
};
use validator::Validate;

/// Message returned when the email is already registered.
pub const EMAIL_ALREADY_EXISTS: &str = "Email already exist";

/// Conflict message for a phone number held by another active user.
pub const PHONE_ALREADY_EXISTS: &str = "Phone number already registered";

/// Request to register a new user.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(
        custom(function = "rules::not_blank"),
        length(max = 64, message = "First name cannot exceed 64 characters")
    )]
    pub first_name: String,

    #[validate(
        custom(function = "rules::not_blank"),
        length(max = 64, message = "Last name cannot exceed 64 characters")
    )]
    pub last_name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(custom(function = "rules::phone_number"))]
    pub phone: Option<String>,

    pub dob: Option<NaiveDate>,

    #[validate(length(max = 32))]
    pub gender: Option<String>,

    #[validate(length(max = 2048))]
    pub photo: Option<String>,

    #[validate(length(max = 64))]
    pub referrer_code: Option<String>,

    pub referrer_id: Option<UserId>,

    /// Keys the request does not know about.
    #[serde(flatten)]
    pub extra: HashMap<String, JsonValue>,
}

impl RegisterRequest {
    /// Creates a request with the required fields only.
    #[must_use]
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            password: password.into(),
            phone: None,
            dob: None,
            gender: None,
            photo: None,
            referrer_code: None,
            referrer_id: None,
            extra: HashMap::new(),
        }
    }

    /// Rejects any attempt to assign a computed field.
    ///
    /// Keys are checked in sorted order so the reported field is stable.
    pub fn reject_computed_fields(&self) -> UserbaseResult<()> {
        let mut keys: Vec<&String> = self.extra.keys().collect();
        keys.sort();
        keys.into_iter().try_for_each(|key| User::guard_assignment(key))
    }

    /// The requested email with its local part masked, for logging.
    #[must_use]
    pub fn masked_email(&self) -> String {
        Email::new_unchecked(self.email.as_str()).masked()
    }

    /// Builds the record to persist from the validated request.
    #[must_use]
    pub fn into_new_user(self, email: Email, password: HashedPassword) -> NewUser {
        let mut user = NewUser::new(self.first_name.trim(), self.last_name.trim(), email, password);
        user.phone = self.phone.as_deref().map(rules::canonical_phone);
        user.dob = self.dob;
        user.gender = self.gender;
        user.photo = self.photo;
        user.referrer_code = self.referrer_code;
        user.referrer_id = self.referrer_id;
        user
    }
}

/// User response DTO.
///
/// Carries the computed fields and never the password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub short_name: String,
    pub email: String,
    pub protected_email: String,
    pub phone: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub photo: Option<String>,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub is_customer: bool,
    pub is_provider: bool,
    pub is_admin: bool,
    pub referrer_code: Option<String>,
    pub referrer_id: Option<UserId>,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            display_name: user.display_name(),
            short_name: user.short_name(),
            protected_email: user.protected_email(),
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email.as_str().to_string(),
            phone: user.phone,
            dob: user.dob,
            gender: user.gender,
            photo: user.photo,
            email_verified: user.email_verified,
            phone_verified: user.phone_verified,
            is_customer: user.is_customer,
            is_provider: user.is_provider,
            is_admin: user.is_admin,
            referrer_code: user.referrer_code,
            referrer_id: user.referrer_id,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// A plain message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outcome of a registration.
///
/// A duplicate email is an expected outcome rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Registration {
    /// The user was created.
    Created(Box<UserResponse>),
    /// The email belongs to an existing user.
    AlreadyExists(MessageResponse),
}

impl Registration {
    pub(crate) fn already_exists() -> Self {
        Self::AlreadyExists(MessageResponse::new(EMAIL_ALREADY_EXISTS))
    }

    /// Returns true if a new user was created.
    #[must_use]
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Query parameters for listing users.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub email: Option<String>,
    pub status: Option<UserStatus>,
}

/// User list response with pagination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserListResponse {
    pub data: Vec<UserResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}
