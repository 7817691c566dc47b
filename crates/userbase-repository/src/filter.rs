//! Equality filters and column changes.
//!
//! Keys are either a column of the model (`email`) or an association
//! followed by one of its columns (`referrer.email`). Every key becomes an
//! equality predicate; a null value becomes `IS NULL`.

use crate::model::{Association, Model};
use crate::Value;
use sqlx::{QueryBuilder, Sqlite};
use userbase_core::{UserbaseError, UserbaseResult};

pub(crate) fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Quotes an identifier that already passed [`is_identifier`] or comes from
/// a model constant.
pub(crate) fn quote(ident: &str) -> String {
    format!("\"{ident}\"")
}

/// A resolved reference to a column, possibly through an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldRef {
    Column {
        table: &'static str,
        column: &'static str,
    },
    Associated {
        association: &'static Association,
        column: &'static str,
    },
}

impl FieldRef {
    pub(crate) fn parse<M: Model>(key: &str) -> UserbaseResult<Self> {
        let segments: Vec<&str> = key.split('.').collect();
        if !segments.iter().all(|s| is_identifier(s)) {
            return Err(UserbaseError::invalid_filter(format!(
                "'{key}' is not a valid field reference"
            )));
        }

        match segments.as_slice() {
            [column] => M::COLUMNS
                .iter()
                .copied()
                .find(|c| c == column)
                .map(|column| Self::Column {
                    table: M::TABLE,
                    column,
                })
                .ok_or_else(|| {
                    UserbaseError::invalid_filter(format!(
                        "unknown column '{column}' on {}",
                        M::NAME
                    ))
                }),
            [association, column] => {
                let association = M::association(association).ok_or_else(|| {
                    UserbaseError::invalid_filter(format!(
                        "unknown association '{association}' on {}",
                        M::NAME
                    ))
                })?;
                let column = association.column(column).ok_or_else(|| {
                    UserbaseError::invalid_filter(format!(
                        "unknown column '{column}' on association '{}'",
                        association.name
                    ))
                })?;
                Ok(Self::Associated {
                    association,
                    column,
                })
            }
            _ => Err(UserbaseError::invalid_filter(format!(
                "'{key}' nests more than one association"
            ))),
        }
    }

    /// Renders `"table"."column"` or `"association"."column"`.
    pub(crate) fn qualified(&self) -> String {
        match self {
            Self::Column { table, column } => format!("{}.{}", quote(table), quote(column)),
            Self::Associated {
                association,
                column,
            } => format!("{}.{}", quote(association.name), quote(column)),
        }
    }

    pub(crate) const fn association(&self) -> Option<&'static Association> {
        match self {
            Self::Column { .. } => None,
            Self::Associated { association, .. } => Some(association),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Predicate {
    pub(crate) field: FieldRef,
    pub(crate) value: Value,
}

impl Predicate {
    pub(crate) fn push_to(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(self.field.qualified());
        if self.value.is_null() {
            qb.push(" IS NULL");
        } else {
            qb.push(" = ");
            self.value.clone().push_bind(qb);
        }
    }
}

/// An ordered set of equality conditions.
///
/// Inserting a key twice keeps the first position and the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    entries: Vec<(String, Value)>,
}

impl Filter {
    /// Creates an empty filter, which matches every row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key = value` and returns the filter.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut filter = Self::new();
        for (key, value) in pairs {
            filter.insert(key, value);
        }
        filter
    }

    /// Builds a filter from a JSON object of scalars.
    pub fn from_json(value: &serde_json::Value) -> UserbaseResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| UserbaseError::invalid_filter("filter must be a JSON object"))?;

        let mut filter = Self::new();
        for (key, value) in object {
            filter.insert(key.clone(), Value::from_json(value)?);
        }
        Ok(filter)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn resolve<M: Model>(&self) -> UserbaseResult<Vec<Predicate>> {
        self.entries
            .iter()
            .map(|(key, value)| {
                Ok(Predicate {
                    field: FieldRef::parse::<M>(key)?,
                    value: value.clone(),
                })
            })
            .collect()
    }
}

/// Column assignments for an update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes {
    entries: Vec<(String, Value)>,
}

impl Changes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `column = value` and returns the changes.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    /// Builds changes from a JSON object of scalars.
    pub fn from_json(value: &serde_json::Value) -> UserbaseResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| UserbaseError::validation("changes must be a JSON object"))?;

        let mut changes = Self::new();
        for (key, value) in object {
            changes.insert(key.clone(), Value::from_json(value)?);
        }
        Ok(changes)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks every assignment against the model. Write guards run first so
    /// computed fields are reported as such rather than as unknown columns.
    pub(crate) fn resolve<M: Model>(&self) -> UserbaseResult<Vec<(&'static str, Value)>> {
        if self.entries.is_empty() {
            return Err(UserbaseError::validation("no changes to apply"));
        }

        self.entries
            .iter()
            .map(|(key, value)| {
                let value = M::guard_write(key, value.clone())?;
                let column = M::COLUMNS
                    .iter()
                    .copied()
                    .find(|c| *c == key.as_str())
                    .ok_or_else(|| {
                        UserbaseError::validation(format!("unknown column '{key}' on {}", M::NAME))
                    })?;
                if column == M::PRIMARY_KEY {
                    return Err(UserbaseError::validation("the primary key cannot be changed"));
                }
                Ok((column, value))
            })
            .collect()
    }
}
