//! Column values carried by filters and writes.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite};
use userbase_core::{Email, HashedPassword, UserId, UserStatus, UserbaseError, UserbaseResult};

/// A single bindable column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Returns true for SQL `NULL`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text payload, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Converts a JSON scalar. Arrays and objects are rejected.
    pub fn from_json(value: &serde_json::Value) -> UserbaseResult<Self> {
        match value {
            serde_json::Value::Null => Ok(Self::Null),
            serde_json::Value::Bool(b) => Ok(Self::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .ok_or_else(|| UserbaseError::invalid_filter(format!("unsupported number {n}"))),
            serde_json::Value::String(s) => Ok(Self::Text(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err(
                UserbaseError::invalid_filter("only scalar values can be matched by equality"),
            ),
        }
    }

    pub(crate) fn push_bind(self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            Self::Null => qb.push_bind(None::<String>),
            Self::Bool(v) => qb.push_bind(v),
            Self::Int(v) => qb.push_bind(v),
            Self::Float(v) => qb.push_bind(v),
            Self::Text(v) => qb.push_bind(v),
            Self::Date(v) => qb.push_bind(v),
            Self::Timestamp(v) => qb.push_bind(v),
        };
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<UserId> for Value {
    fn from(v: UserId) -> Self {
        Self::Int(v.into_inner())
    }
}

impl From<&Email> for Value {
    fn from(v: &Email) -> Self {
        Self::Text(v.as_str().to_string())
    }
}

impl From<Email> for Value {
    fn from(v: Email) -> Self {
        Self::Text(v.into())
    }
}

impl From<UserStatus> for Value {
    fn from(v: UserStatus) -> Self {
        Self::Text(v.as_str().to_string())
    }
}

impl From<&HashedPassword> for Value {
    fn from(v: &HashedPassword) -> Self {
        Self::Text(v.as_str().to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(Value::from_json(&json!(null)).unwrap(), Value::Null);
        assert_eq!(Value::from_json(&json!(true)).unwrap(), Value::Bool(true));
        assert_eq!(Value::from_json(&json!(42)).unwrap(), Value::Int(42));
        assert_eq!(Value::from_json(&json!(2.5)).unwrap(), Value::Float(2.5));
        assert_eq!(Value::from_json(&json!("x")).unwrap(), Value::Text("x".into()));
    }

    #[test]
    fn test_from_json_rejects_nested() {
        let err = Value::from_json(&json!({"gt": 3})).unwrap_err();
        assert!(matches!(err, UserbaseError::InvalidFilter(_)));
        assert!(Value::from_json(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_option_maps_to_null() {
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(Value::from(Some(UserId::new(3))), Value::Int(3));
        assert_eq!(Value::from(UserStatus::Locked).as_text(), Some("LOCKED"));
    }
}
