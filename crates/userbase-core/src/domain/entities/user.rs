//! User entity.

use super::super::value_objects::{Email, HashedPassword, UserStatus};
use crate::{UserId, UserbaseError, UserbaseResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Derived fields as `(camelCase, snake_case)` names.
///
/// They are computed from stored columns on read and can never be assigned.
pub const COMPUTED_FIELDS: [(&str, &str); 3] = [
    ("displayName", "display_name"),
    ("shortName", "short_name"),
    ("protectedEmail", "protected_email"),
];

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user.
    pub id: UserId,

    pub first_name: String,
    pub last_name: String,

    /// User's email address, unique among non-deleted users.
    pub email: Email,

    /// Only loaded by scopes that ask for it. Never serialized.
    #[serde(skip)]
    pub password: Option<HashedPassword>,

    /// Optional phone number, unique among non-deleted users.
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
    /// The user who referred this one.
    pub referrer_id: Option<UserId>,

    pub status: UserStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the user was soft-deleted.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Returns `"first last"`.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Returns the first name followed by the last initial, e.g. `"Ada L."`.
    ///
    /// Falls back to the first name alone when there is no last name.
    #[must_use]
    pub fn short_name(&self) -> String {
        match self.last_name.trim().chars().next() {
            Some(initial) => format!("{} {}.", self.first_name, initial),
            None => self.first_name.clone(),
        }
    }

    /// Returns the email with most of its local part hidden.
    #[must_use]
    pub fn protected_email(&self) -> String {
        self.email.masked()
    }

    /// Checks if the user has been soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Checks if the user is active and not deleted.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active() && !self.is_deleted()
    }

    /// Checks whether `field` names a computed field, in either naming style.
    #[must_use]
    pub fn is_computed_field(field: &str) -> bool {
        COMPUTED_FIELDS
            .iter()
            .any(|(camel, snake)| field == *camel || field == *snake)
    }

    /// Rejects assignment to a computed field.
    pub fn guard_assignment(field: &str) -> UserbaseResult<()> {
        if Self::is_computed_field(field) {
            return Err(UserbaseError::immutable_field(field));
        }
        Ok(())
    }
}

/// A user that has not been persisted yet.
///
/// The password is already hashed; the database assigns the id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub password: HashedPassword,
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
}

impl NewUser {
    /// Creates a customer account with every optional field empty.
    #[must_use]
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: Email,
        password: HashedPassword,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email,
            password,
            phone: None,
            dob: None,
            gender: None,
            photo: None,
            email_verified: false,
            phone_verified: false,
            is_customer: true,
            is_provider: false,
            is_admin: false,
            referrer_code: None,
            referrer_id: None,
            status: UserStatus::Active,
        }
    }

    /// Sets the phone number.
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Sets the referring user.
    #[must_use]
    pub fn referred_by(mut self, referrer_id: UserId) -> Self {
        self.referrer_id = Some(referrer_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashed() -> HashedPassword {
        HashedPassword::from_hash("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA").unwrap()
    }

    fn user(first: &str, last: &str, email: &str) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(1),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: Email::new(email).unwrap(),
            password: None,
            phone: None,
            dob: None,
            gender: None,
            photo: None,
            email_verified: false,
            phone_verified: false,
            is_customer: true,
            is_provider: false,
            is_admin: false,
            referrer_code: None,
            referrer_id: None,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(user("Ada", "Lovelace", "ada@example.com").display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_short_name() {
        assert_eq!(user("Ada", "Lovelace", "ada@example.com").short_name(), "Ada L.");
        assert_eq!(user("Ada", "", "ada@example.com").short_name(), "Ada");
    }

    #[test]
    fn test_protected_email() {
        let u = user("Ada", "Lovelace", "lovelace@example.com");
        assert_eq!(u.protected_email(), "lov****@example.com");
    }

    #[test]
    fn test_soft_deleted_user_is_not_active() {
        let mut u = user("Ada", "Lovelace", "ada@example.com");
        assert!(u.is_active());
        u.deleted_at = Some(Utc::now());
        assert!(u.is_deleted());
        assert!(!u.is_active());
    }

    #[test]
    fn test_guard_assignment_rejects_computed_fields() {
        for field in ["displayName", "short_name", "protectedEmail"] {
            let err = User::guard_assignment(field).unwrap_err();
            assert!(matches!(err, UserbaseError::ImmutableField { field: f } if f == field));
        }
        assert!(User::guard_assignment("first_name").is_ok());
    }

    #[test]
    fn test_serialization_omits_password() {
        let mut u = user("Ada", "Lovelace", "ada@example.com");
        u.password = Some(hashed());
        let json = serde_json::to_value(&u).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["status"], "ACTIVE");
    }

    #[test]
    fn test_new_user_defaults() {
        let new_user = NewUser::new("Ada", "Lovelace", Email::new("ada@example.com").unwrap(), hashed())
            .with_phone("+44 20 7946 0958")
            .referred_by(UserId::new(9));
        assert!(new_user.is_customer);
        assert!(!new_user.is_admin);
        assert!(!new_user.email_verified);
        assert_eq!(new_user.status, UserStatus::Active);
        assert_eq!(new_user.phone.as_deref(), Some("+44 20 7946 0958"));
        assert_eq!(new_user.referrer_id, Some(UserId::new(9)));
    }
}
