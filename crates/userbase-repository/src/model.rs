//! Mapping between domain entities and tables.
//!
//! A [`Model`] describes everything [`BaseDao`](crate::BaseDao) needs to
//! build statements for an entity: its table, columns, soft-delete and
//! timestamp columns, to-one associations and named scopes.

use crate::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;
use std::fmt::Debug;
use userbase_core::UserbaseResult;

/// A persisted entity.
pub trait Model: Sized + Send + Sync + Unpin + 'static {
    /// Raw row as read from the database.
    type Row: for<'r> FromRow<'r, SqliteRow> + Send + Unpin;
    /// Payload accepted by `create` and `bulk_create`.
    type Create: Insertable + Send + Sync;
    /// Named projections the model can be read through.
    type Scope: Scope;

    /// Name used in logs and errors.
    const NAME: &'static str;
    const TABLE: &'static str;
    const PRIMARY_KEY: &'static str = "id";
    /// Every stored column, primary key included.
    const COLUMNS: &'static [&'static str];
    /// Deletes stamp [`Self::DELETED_AT`] instead of removing rows.
    const PARANOID: bool = false;
    /// The DAO maintains [`Self::CREATED_AT`] and [`Self::UPDATED_AT`].
    const TIMESTAMPS: bool = true;
    const CREATED_AT: &'static str = "created_at";
    const UPDATED_AT: &'static str = "updated_at";
    const DELETED_AT: &'static str = "deleted_at";
    const ASSOCIATIONS: &'static [Association] = &[];

    /// Converts a row into the entity.
    fn from_row(row: Self::Row) -> UserbaseResult<Self>;

    /// Primary key value.
    fn key(&self) -> i64;

    /// Checks a single column write before it reaches the database and
    /// returns the value to store.
    fn guard_write(_column: &str, value: Value) -> UserbaseResult<Value> {
        Ok(value)
    }

    fn has_column(column: &str) -> bool {
        Self::COLUMNS.contains(&column)
    }

    fn association(name: &str) -> Option<&'static Association> {
        Self::ASSOCIATIONS.iter().find(|a| a.name == name)
    }
}

/// A named projection with optional fixed predicates.
pub trait Scope: Copy + Send + Sync + Default + Debug + 'static {
    fn name(&self) -> &'static str;

    /// Columns selected by this scope.
    fn attributes(&self) -> &'static [&'static str];

    /// Equality predicates every query in this scope carries.
    fn constraints(&self) -> Vec<(&'static str, Value)> {
        Vec::new()
    }
}

/// A value that can be written as a new row.
pub trait Insertable {
    /// Column/value pairs to insert, excluding the primary key and timestamps.
    fn values(&self) -> Vec<(&'static str, Value)>;
}

/// A to-one association joined through `local_key = target.target_key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Association {
    /// Alias used in filter keys and SQL, e.g. `referrer` in `referrer.email`.
    pub name: &'static str,
    pub table: &'static str,
    pub local_key: &'static str,
    pub target_key: &'static str,
    /// Columns of the associated table that filters may reference.
    pub columns: &'static [&'static str],
    /// Soft-delete column of the target, if it has one.
    pub deleted_at: Option<&'static str>,
}

impl Association {
    pub(crate) fn column(&self, name: &str) -> Option<&'static str> {
        self.columns.iter().copied().find(|c| *c == name)
    }
}
