//! Read options and SQL assembly for [`BaseDao`](crate::BaseDao).

use crate::filter::{quote, FieldRef, Filter, Predicate};
use crate::model::{Association, Model, Scope};
use sqlx::{QueryBuilder, Sqlite};
use std::marker::PhantomData;
use userbase_core::{PageRequest, UserbaseError, UserbaseResult};

/// Direction of an order key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Options for `fetch_one` and `fetch_all`.
///
/// Pagination applies only when both `page` and `limit` are set; `limit`
/// alone caps the result without a pagination summary.
#[derive(Debug, Clone)]
pub struct FetchOptions<S> {
    /// Projection to read through. The model's default scope when unset.
    pub scope: Option<S>,
    /// 1-based page number.
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Order keys, applied before the primary key.
    pub order: Vec<(String, SortOrder)>,
    /// Include soft-deleted rows.
    pub with_deleted: bool,
}

impl<S> Default for FetchOptions<S> {
    fn default() -> Self {
        Self {
            scope: None,
            page: None,
            limit: None,
            order: Vec::new(),
            with_deleted: false,
        }
    }
}

impl<S: Scope> FetchOptions<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn scope(mut self, scope: S) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Sets both page and limit from a page request.
    #[must_use]
    pub fn paginate(mut self, request: PageRequest) -> Self {
        self.page = Some(request.page);
        self.limit = Some(request.limit);
        self
    }

    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn order_by(mut self, key: impl Into<String>, order: SortOrder) -> Self {
        self.order.push((key.into(), order));
        self
    }

    #[must_use]
    pub fn with_deleted(mut self) -> Self {
        self.with_deleted = true;
        self
    }

    /// Returns the page request when both parts are present.
    pub(crate) fn page_request(&self) -> UserbaseResult<Option<PageRequest>> {
        if self.page == Some(0) {
            return Err(UserbaseError::validation("page must be at least 1"));
        }
        if self.limit == Some(0) {
            return Err(UserbaseError::validation("limit must be at least 1"));
        }
        Ok(match (self.page, self.limit) {
            (Some(page), Some(limit)) => Some(PageRequest { page, limit }),
            _ => None,
        })
    }
}

/// A resolved read: predicates, joins, order and projection.
pub(crate) struct Plan<M: Model> {
    predicates: Vec<Predicate>,
    order: Vec<(FieldRef, SortOrder)>,
    joins: Vec<&'static Association>,
    scope: M::Scope,
    include_deleted: bool,
    model: PhantomData<fn() -> M>,
}

impl<M: Model> Plan<M> {
    pub(crate) fn new(filter: &Filter, options: &FetchOptions<M::Scope>) -> UserbaseResult<Self> {
        let scope = options.scope.unwrap_or_default();

        let mut predicates = filter.resolve::<M>()?;
        for (column, value) in scope.constraints() {
            predicates.push(Predicate {
                field: FieldRef::parse::<M>(column)?,
                value,
            });
        }

        let order = options
            .order
            .iter()
            .map(|(key, direction)| Ok((FieldRef::parse::<M>(key)?, *direction)))
            .collect::<UserbaseResult<Vec<_>>>()?;

        let mut joins: Vec<&'static Association> = Vec::new();
        let referenced = predicates
            .iter()
            .map(|p| p.field)
            .chain(order.iter().map(|(field, _)| *field))
            .filter_map(|field| field.association());
        for association in referenced {
            if !joins.iter().any(|j| j.name == association.name) {
                joins.push(association);
            }
        }

        Ok(Self {
            predicates,
            order,
            joins,
            scope,
            include_deleted: options.with_deleted || !M::PARANOID,
            model: PhantomData,
        })
    }

    /// Plan over the default scope, for statements that do not project rows.
    pub(crate) fn for_filter(filter: &Filter) -> UserbaseResult<Self> {
        Self::new(filter, &FetchOptions::default())
    }

    pub(crate) fn scope(&self) -> M::Scope {
        self.scope
    }

    /// `SELECT <projection> FROM ... WHERE ... ORDER BY ...`
    pub(crate) fn select(&self) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(projection(M::TABLE, self.scope.attributes()));
        self.push_from(&mut qb);
        self.push_where(&mut qb);
        self.push_order(&mut qb);
        qb
    }

    /// `SELECT COUNT(DISTINCT <column>) FROM ... WHERE ...`
    ///
    /// Counts the primary key when no column is given, so joins never
    /// inflate the total.
    pub(crate) fn count(&self, column: Option<FieldRef>) -> QueryBuilder<'static, Sqlite> {
        let column = column.unwrap_or(FieldRef::Column {
            table: M::TABLE,
            column: M::PRIMARY_KEY,
        });
        let mut qb = QueryBuilder::new("SELECT COUNT(DISTINCT ");
        qb.push(column.qualified());
        qb.push(")");
        self.push_from(&mut qb);
        self.push_where(&mut qb);
        qb
    }

    /// `SELECT CAST(COALESCE(SUM(<column>), 0) AS REAL) FROM ... WHERE ...`
    pub(crate) fn sum(&self, column: FieldRef) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new("SELECT CAST(COALESCE(SUM(");
        qb.push(column.qualified());
        qb.push("), 0) AS REAL)");
        self.push_from(&mut qb);
        self.push_where(&mut qb);
        qb
    }

    /// `SELECT 1 FROM ... WHERE ... LIMIT 1`
    pub(crate) fn exists(&self) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new("SELECT 1");
        self.push_from(&mut qb);
        self.push_where(&mut qb);
        qb.push(" LIMIT 1");
        qb
    }

    /// Appends `"table"."pk" IN (SELECT ... )` selecting the matching keys.
    pub(crate) fn push_key_match(&self, qb: &mut QueryBuilder<'static, Sqlite>) {
        let pk = quote(M::PRIMARY_KEY);
        qb.push(format!("{pk} IN (SELECT {}.{pk}", quote(M::TABLE)));
        self.push_from(qb);
        self.push_where(qb);
        qb.push(")");
    }

    fn push_from(&self, qb: &mut QueryBuilder<'static, Sqlite>) {
        let table = quote(M::TABLE);
        qb.push(format!(" FROM {table}"));
        for association in &self.joins {
            let alias = quote(association.name);
            qb.push(format!(
                " LEFT JOIN {} AS {alias} ON {alias}.{} = {table}.{}",
                quote(association.table),
                quote(association.target_key),
                quote(association.local_key),
            ));
            if let Some(deleted_at) = association.deleted_at {
                qb.push(format!(" AND {alias}.{} IS NULL", quote(deleted_at)));
            }
        }
    }

    fn push_where(&self, qb: &mut QueryBuilder<'static, Sqlite>) {
        let mut first = true;
        for predicate in &self.predicates {
            qb.push(if first { " WHERE " } else { " AND " });
            first = false;
            predicate.push_to(qb);
        }
        if !self.include_deleted {
            qb.push(if first { " WHERE " } else { " AND " });
            qb.push(format!(
                "{}.{} IS NULL",
                quote(M::TABLE),
                quote(M::DELETED_AT)
            ));
        }
    }

    fn push_order(&self, qb: &mut QueryBuilder<'static, Sqlite>) {
        qb.push(" ORDER BY ");
        for (field, direction) in &self.order {
            qb.push(format!("{} {}, ", field.qualified(), direction.keyword()));
        }
        qb.push(format!(
            "{}.{} ASC",
            quote(M::TABLE),
            quote(M::PRIMARY_KEY)
        ));
    }
}

/// `"table"."col" AS "col", ...`
pub(crate) fn projection(table: &str, attributes: &[&str]) -> String {
    let table = quote(table);
    attributes
        .iter()
        .map(|column| {
            let column = quote(column);
            format!("{table}.{column} AS {column}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// `"col", ...` for `RETURNING`, where columns cannot be qualified.
pub(crate) fn returning(attributes: &[&str]) -> String {
    attributes
        .iter()
        .map(|column| quote(column))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn push_limit(qb: &mut QueryBuilder<'static, Sqlite>, limit: u32, offset: u64) {
    qb.push(" LIMIT ");
    qb.push_bind(i64::from(limit));
    if offset > 0 {
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(offset).unwrap_or(i64::MAX));
    }
}
