//! `users` table mapping.

use crate::model::{Association, Insertable, Model, Scope};
use crate::Value;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use userbase_core::{
    is_phc_string, rules, Email, HashedPassword, NewUser, User, UserId, UserStatus, UserbaseError,
    UserbaseResult,
};

const ALL_COLUMNS: &[&str] = &[
    "id",
    "first_name",
    "last_name",
    "email",
    "password",
    "phone",
    "dob",
    "gender",
    "photo",
    "email_verified",
    "phone_verified",
    "is_customer",
    "is_provider",
    "is_admin",
    "referrer_code",
    "referrer_id",
    "status",
    "created_at",
    "updated_at",
    "deleted_at",
];

/// Every column except `password`.
const PUBLIC_COLUMNS: &[&str] = &[
    "id",
    "first_name",
    "last_name",
    "email",
    "phone",
    "dob",
    "gender",
    "photo",
    "email_verified",
    "phone_verified",
    "is_customer",
    "is_provider",
    "is_admin",
    "referrer_code",
    "referrer_id",
    "status",
    "created_at",
    "updated_at",
    "deleted_at",
];

/// The user who referred this one.
pub const REFERRER: Association = Association {
    name: "referrer",
    table: "users",
    local_key: "referrer_id",
    target_key: "id",
    columns: PUBLIC_COLUMNS,
    deleted_at: Some("deleted_at"),
};

/// Database row for a user.
#[derive(Debug, FromRow)]
pub struct UserRow {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    /// Absent unless the scope selects it.
    #[sqlx(default)]
    password: Option<String>,
    phone: Option<String>,
    dob: Option<NaiveDate>,
    gender: Option<String>,
    photo: Option<String>,
    email_verified: bool,
    phone_verified: bool,
    is_customer: bool,
    is_provider: bool,
    is_admin: bool,
    referrer_code: Option<String>,
    referrer_id: Option<i64>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

/// Named projections over `users`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserScope {
    /// Every column but the password hash.
    #[default]
    Default,
    /// Includes the password hash, for credential checks.
    WithPassword,
    /// Default projection restricted to `ACTIVE` accounts.
    Active,
}

impl Scope for UserScope {
    fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::WithPassword => "withPassword",
            Self::Active => "active",
        }
    }

    fn attributes(&self) -> &'static [&'static str] {
        match self {
            Self::Default | Self::Active => PUBLIC_COLUMNS,
            Self::WithPassword => ALL_COLUMNS,
        }
    }

    fn constraints(&self) -> Vec<(&'static str, Value)> {
        match self {
            Self::Active => vec![("status", UserStatus::Active.into())],
            Self::Default | Self::WithPassword => Vec::new(),
        }
    }
}

impl Model for User {
    type Row = UserRow;
    type Create = NewUser;
    type Scope = UserScope;

    const NAME: &'static str = "User";
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = ALL_COLUMNS;
    const PARANOID: bool = true;
    const ASSOCIATIONS: &'static [Association] = &[REFERRER];

    fn from_row(row: UserRow) -> UserbaseResult<Self> {
        let status = row.status.parse::<UserStatus>().map_err(|_| {
            UserbaseError::internal(format!(
                "user {} has unknown status '{}'",
                row.id, row.status
            ))
        })?;
        let password = row.password.map(HashedPassword::from_hash).transpose()?;

        Ok(Self {
            id: UserId::new(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            email: Email::new_unchecked(row.email),
            password,
            phone: row.phone,
            dob: row.dob,
            gender: row.gender,
            photo: row.photo,
            email_verified: row.email_verified,
            phone_verified: row.phone_verified,
            is_customer: row.is_customer,
            is_provider: row.is_provider,
            is_admin: row.is_admin,
            referrer_code: row.referrer_code,
            referrer_id: row.referrer_id.map(UserId::new),
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }

    fn key(&self) -> i64 {
        self.id.into_inner()
    }

    /// Computed fields are never writable and the password column only
    /// accepts an encoded hash. Email and phone are stored in canonical form.
    fn guard_write(column: &str, value: Value) -> UserbaseResult<Value> {
        User::guard_assignment(column)?;

        match column {
            "password" if value.as_text().is_some_and(is_phc_string) => Ok(value),
            "password" => Err(UserbaseError::validation(
                "password must be hashed before it is stored",
            )),
            "email" => match value.as_text() {
                Some(email) => Ok(Email::new(email)?.into()),
                None => Err(UserbaseError::validation("email is required")),
            },
            "phone" => match value.as_text() {
                Some(phone) => {
                    rules::phone_number(phone)
                        .map_err(|_| UserbaseError::validation(format!("invalid phone number '{phone}'")))?;
                    Ok(Value::Text(rules::canonical_phone(phone)))
                }
                None if value.is_null() => Ok(value),
                None => Err(UserbaseError::validation("phone must be text")),
            },
            "status" => match value.as_text() {
                Some(status) => {
                    status.parse::<UserStatus>()?;
                    Ok(value)
                }
                None => Err(UserbaseError::validation("status is required")),
            },
            _ => Ok(value),
        }
    }
}

impl Insertable for NewUser {
    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("first_name", self.first_name.as_str().into()),
            ("last_name", self.last_name.as_str().into()),
            ("email", (&self.email).into()),
            ("password", (&self.password).into()),
            ("phone", self.phone.clone().into()),
            ("dob", self.dob.into()),
            ("gender", self.gender.clone().into()),
            ("photo", self.photo.clone().into()),
            ("email_verified", self.email_verified.into()),
            ("phone_verified", self.phone_verified.into()),
            ("is_customer", self.is_customer.into()),
            ("is_provider", self.is_provider.into()),
            ("is_admin", self.is_admin.into()),
            ("referrer_code", self.referrer_code.clone().into()),
            ("referrer_id", self.referrer_id.into()),
            ("status", self.status.into()),
        ]
    }
}
