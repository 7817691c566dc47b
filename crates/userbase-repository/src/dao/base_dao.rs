//! Generic data access object.
//!
//! [`BaseDao`] turns a [`Filter`] and [`FetchOptions`] into SQL for any
//! [`Model`]. A DAO is either unbound, taking a pooled connection per call,
//! or bound to a [`DaoTransaction`] with [`BaseDao::use_transaction`], in
//! which case every statement runs on that transaction.

use crate::filter::{quote, Changes, FieldRef, Filter};
use crate::model::{Insertable, Model, Scope};
use crate::query::{self, FetchOptions, Plan};
use crate::transaction::{finalized, DaoTransaction, TxSlot};
use crate::Value;
use chrono::Utc;
use sqlx::pool::PoolConnection;
use sqlx::{Connection, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::fmt;
use std::marker::PhantomData;
use tokio::sync::MutexGuard;
use tracing::{debug, info, warn};
use userbase_core::{Fetched, Pagination, UserbaseError, UserbaseResult};

/// SQLite's historical default limit on bound parameters per statement.
const MAX_BIND_PARAMS: usize = 999;

type Row = Vec<(&'static str, Value)>;

/// Connection a single DAO call runs on.
enum Conn<'a> {
    Pooled(PoolConnection<Sqlite>),
    Bound(MutexGuard<'a, TxSlot>),
}

impl Conn<'_> {
    fn get(&mut self, operation: &str) -> UserbaseResult<&mut SqliteConnection> {
        match self {
            Self::Pooled(conn) => Ok(&mut **conn),
            Self::Bound(slot) => match &mut **slot {
                Some(tx) => Ok(&mut **tx),
                None => Err(finalized(operation)),
            },
        }
    }
}

fn db_err(operation: &'static str) -> impl FnOnce(sqlx::Error) -> UserbaseError {
    move |err| {
        warn!(operation, error = %err, "Database operation failed");
        UserbaseError::from_sqlx(operation, err)
    }
}

/// Data access for one model.
pub struct BaseDao<M: Model> {
    pool: SqlitePool,
    transaction: Option<DaoTransaction>,
    returning: bool,
    model: PhantomData<fn() -> M>,
}

impl<M: Model> Clone for BaseDao<M> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            transaction: self.transaction.clone(),
            returning: self.returning,
            model: PhantomData,
        }
    }
}

impl<M: Model> fmt::Debug for BaseDao<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseDao")
            .field("model", &M::NAME)
            .field("bound", &self.transaction.is_some())
            .field("returning", &self.returning)
            .finish()
    }
}

impl<M: Model> BaseDao<M> {
    /// Creates an unbound DAO over `pool`.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            transaction: None,
            returning: true,
            model: PhantomData,
        }
    }

    /// Reads written rows back with a follow-up query instead of `RETURNING`.
    #[must_use]
    pub fn without_returning(mut self) -> Self {
        self.returning = false;
        self
    }

    /// Returns a DAO whose statements run on `transaction`.
    #[must_use]
    pub fn use_transaction(&self, transaction: &DaoTransaction) -> Self {
        Self {
            transaction: Some(transaction.clone()),
            ..self.clone()
        }
    }

    /// Returns the bound transaction, or begins a new one.
    pub async fn get_transaction(&self) -> UserbaseResult<DaoTransaction> {
        match &self.transaction {
            Some(tx) => Ok(tx.clone()),
            None => DaoTransaction::begin(&self.pool).await,
        }
    }

    /// Commits the bound transaction. Does nothing on an unbound DAO.
    pub async fn commit_transaction(&self) -> UserbaseResult<()> {
        match &self.transaction {
            Some(tx) => tx.commit().await,
            None => Ok(()),
        }
    }

    /// Rolls back the bound transaction. Does nothing on an unbound DAO.
    pub async fn rollback_transaction(&self) -> UserbaseResult<()> {
        match &self.transaction {
            Some(tx) => tx.rollback().await,
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn transaction(&self) -> Option<&DaoTransaction> {
        self.transaction.as_ref()
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn conn(&self, operation: &'static str) -> UserbaseResult<Conn<'_>> {
        match &self.transaction {
            Some(tx) => Ok(Conn::Bound(tx.lock().await)),
            None => self
                .pool
                .acquire()
                .await
                .map(Conn::Pooled)
                .map_err(db_err(operation)),
        }
    }

    /// Returns the first matching record, or `None`.
    pub async fn fetch_one(
        &self,
        filter: &Filter,
        options: &FetchOptions<M::Scope>,
    ) -> UserbaseResult<Option<M>> {
        let plan = Plan::<M>::new(filter, options)?;
        debug!(model = M::NAME, scope = plan.scope().name(), "fetch_one");

        let mut conn = self.conn("fetch_one").await?;
        Self::fetch_one_on(conn.get("fetch_one")?, &plan, "fetch_one").await
    }

    /// Returns every matching record.
    ///
    /// With both `page` and `limit` set the result carries a pagination
    /// summary built from a distinct count of the primary key.
    pub async fn fetch_all(
        &self,
        filter: &Filter,
        options: &FetchOptions<M::Scope>,
    ) -> UserbaseResult<Fetched<M>> {
        let paging = options.page_request()?;
        let plan = Plan::<M>::new(filter, options)?;
        debug!(
            model = M::NAME,
            scope = plan.scope().name(),
            page = ?options.page,
            limit = ?options.limit,
            "fetch_all"
        );

        let mut guard = self.conn("fetch_all").await?;
        let conn = guard.get("fetch_all")?;

        let mut qb = plan.select();
        let mut pagination = None;
        if let Some(request) = paging {
            let rows = Self::count_on(&mut *conn, &plan, None, "fetch_all").await?;
            pagination = Some(Pagination::new(request, rows));
            query::push_limit(&mut qb, request.limit, request.offset());
        } else if let Some(limit) = options.limit {
            query::push_limit(&mut qb, limit, 0);
        }

        let rows = qb
            .build_query_as::<M::Row>()
            .fetch_all(&mut *conn)
            .await
            .map_err(db_err("fetch_all"))?;
        let data = rows
            .into_iter()
            .map(M::from_row)
            .collect::<UserbaseResult<Vec<_>>>()?;

        Ok(Fetched { data, pagination })
    }

    /// Counts matching records.
    pub async fn count(&self, filter: &Filter) -> UserbaseResult<u64> {
        let plan = Plan::<M>::for_filter(filter)?;
        debug!(model = M::NAME, "count");

        let mut conn = self.conn("count").await?;
        Self::count_on(conn.get("count")?, &plan, None, "count").await
    }

    /// Counts distinct values of `column` among matching records.
    pub async fn count_col(&self, column: &str, filter: &Filter) -> UserbaseResult<u64> {
        let field = FieldRef::parse::<M>(column)?;
        let plan = Plan::<M>::for_filter(filter)?;
        debug!(model = M::NAME, column, "count_col");

        let mut conn = self.conn("count_col").await?;
        Self::count_on(conn.get("count_col")?, &plan, Some(field), "count_col").await
    }

    /// Sums `field` over matching records. Returns 0 when nothing matches.
    pub async fn sum(&self, field: &str, filter: &Filter) -> UserbaseResult<f64> {
        let field = FieldRef::parse::<M>(field)?;
        let plan = Plan::<M>::for_filter(filter)?;
        debug!(model = M::NAME, field = %field.qualified(), "sum");

        let mut conn = self.conn("sum").await?;
        let mut qb = plan.sum(field);
        qb.build_query_scalar::<f64>()
            .fetch_one(conn.get("sum")?)
            .await
            .map_err(db_err("sum"))
    }

    /// Returns true when at least one record matches.
    pub async fn exist(&self, filter: &Filter) -> UserbaseResult<bool> {
        let plan = Plan::<M>::for_filter(filter)?;
        debug!(model = M::NAME, "exist");

        let mut conn = self.conn("exist").await?;
        let mut qb = plan.exists();
        let found = qb
            .build_query_scalar::<i64>()
            .fetch_optional(conn.get("exist")?)
            .await
            .map_err(db_err("exist"))?;
        Ok(found.is_some())
    }

    /// Inserts one record and returns it in the default scope.
    pub async fn create(&self, data: &M::Create) -> UserbaseResult<M> {
        let values = Self::insert_values(data)?;
        debug!(model = M::NAME, "create");

        let mut conn = self.conn("create").await?;
        let created = self.insert_on(conn.get("create")?, values).await?;
        info!(model = M::NAME, key = created.key(), "Record created");
        Ok(created)
    }

    /// Inserts every record atomically and returns them ordered by key.
    ///
    /// Runs in its own transaction, or a savepoint when the DAO is bound.
    pub async fn bulk_create(&self, data: &[M::Create]) -> UserbaseResult<Vec<M>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }
        let rows = data
            .iter()
            .map(Self::insert_values)
            .collect::<UserbaseResult<Vec<_>>>()?;
        debug!(model = M::NAME, records = rows.len(), "bulk_create");

        let mut guard = self.conn("bulk_create").await?;
        let mut tx = guard
            .get("bulk_create")?
            .begin()
            .await
            .map_err(db_err("bulk_create"))?;

        let mut created = Vec::with_capacity(rows.len());
        if self.returning {
            let per_statement = (MAX_BIND_PARAMS / rows[0].len().max(1)).max(1);
            for chunk in rows.chunks(per_statement) {
                let mut qb = insert_head::<M>(&chunk[0]);
                qb.push(" VALUES ");
                for (i, row) in chunk.iter().enumerate() {
                    if i > 0 {
                        qb.push(", ");
                    }
                    push_tuple(&mut qb, row.clone());
                }
                qb.push(" RETURNING ");
                qb.push(query::returning(M::Scope::default().attributes()));

                let fetched = qb
                    .build_query_as::<M::Row>()
                    .fetch_all(&mut *tx)
                    .await
                    .map_err(db_err("bulk_create"))?;
                for row in fetched {
                    created.push(M::from_row(row)?);
                }
            }
        } else {
            for row in rows {
                created.push(self.insert_on(&mut *tx, row).await?);
            }
        }

        tx.commit().await.map_err(db_err("bulk_create"))?;
        created.sort_by_key(M::key);
        info!(model = M::NAME, records = created.len(), "Records created");
        Ok(created)
    }

    /// Applies `changes` to every matching record and returns the first one.
    ///
    /// When the statement returns no rows, or the DAO was built
    /// [`without_returning`](Self::without_returning), the record is read
    /// back with the same filter.
    pub async fn update(&self, changes: &Changes, filter: &Filter) -> UserbaseResult<Option<M>> {
        let mut assignments = changes.resolve::<M>()?;
        if M::TIMESTAMPS && !assignments.iter().any(|(c, _)| *c == M::UPDATED_AT) {
            assignments.push((M::UPDATED_AT, Utc::now().into()));
        }
        let plan = Plan::<M>::for_filter(filter)?;
        debug!(model = M::NAME, columns = assignments.len(), "update");

        let mut guard = self.conn("update").await?;
        let conn = guard.get("update")?;

        let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", quote(M::TABLE)));
        for (i, (column, value)) in assignments.into_iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(quote(column));
            qb.push(" = ");
            value.push_bind(&mut qb);
        }
        qb.push(" WHERE ");
        plan.push_key_match(&mut qb);

        if self.returning {
            qb.push(" RETURNING ");
            qb.push(query::returning(plan.scope().attributes()));
            let rows = qb
                .build_query_as::<M::Row>()
                .fetch_all(&mut *conn)
                .await
                .map_err(db_err("update"))?;
            let updated = rows
                .into_iter()
                .map(M::from_row)
                .collect::<UserbaseResult<Vec<_>>>()?;
            if !updated.is_empty() {
                info!(model = M::NAME, records = updated.len(), "Records updated");
                return Ok(updated.into_iter().min_by_key(M::key));
            }
        } else {
            let result = qb
                .build()
                .execute(&mut *conn)
                .await
                .map_err(db_err("update"))?;
            info!(model = M::NAME, records = result.rows_affected(), "Records updated");
        }

        Self::fetch_one_on(conn, &plan, "update").await
    }

    /// Removes matching records and returns how many were removed.
    ///
    /// Paranoid models are soft-deleted; rows already marked deleted are not
    /// counted again.
    pub async fn delete(&self, filter: &Filter) -> UserbaseResult<u64> {
        let plan = Plan::<M>::for_filter(filter)?;
        debug!(model = M::NAME, soft = M::PARANOID, "delete");

        let mut qb = if M::PARANOID {
            let now = Utc::now();
            let mut qb = QueryBuilder::new(format!(
                "UPDATE {} SET {} = ",
                quote(M::TABLE),
                quote(M::DELETED_AT)
            ));
            qb.push_bind(now);
            if M::TIMESTAMPS {
                qb.push(format!(", {} = ", quote(M::UPDATED_AT)));
                qb.push_bind(now);
            }
            qb.push(" WHERE ");
            qb
        } else {
            QueryBuilder::new(format!("DELETE FROM {} WHERE ", quote(M::TABLE)))
        };
        plan.push_key_match(&mut qb);

        let mut conn = self.conn("delete").await?;
        let result = qb
            .build()
            .execute(conn.get("delete")?)
            .await
            .map_err(db_err("delete"))?;

        let removed = result.rows_affected();
        info!(model = M::NAME, records = removed, "Records deleted");
        Ok(removed)
    }

    async fn fetch_one_on(
        conn: &mut SqliteConnection,
        plan: &Plan<M>,
        operation: &'static str,
    ) -> UserbaseResult<Option<M>> {
        let mut qb = plan.select();
        query::push_limit(&mut qb, 1, 0);
        let row = qb
            .build_query_as::<M::Row>()
            .fetch_optional(conn)
            .await
            .map_err(db_err(operation))?;
        row.map(M::from_row).transpose()
    }

    async fn count_on(
        conn: &mut SqliteConnection,
        plan: &Plan<M>,
        column: Option<FieldRef>,
        operation: &'static str,
    ) -> UserbaseResult<u64> {
        let mut qb = plan.count(column);
        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(conn)
            .await
            .map_err(db_err(operation))?;
        Ok(u64::try_from(total).unwrap_or_default())
    }

    async fn insert_on(&self, conn: &mut SqliteConnection, row: Row) -> UserbaseResult<M> {
        let mut qb = insert_head::<M>(&row);
        qb.push(" VALUES ");
        push_tuple(&mut qb, row);

        if self.returning {
            qb.push(" RETURNING ");
            qb.push(query::returning(M::Scope::default().attributes()));
            let row = qb
                .build_query_as::<M::Row>()
                .fetch_one(&mut *conn)
                .await
                .map_err(db_err("create"))?;
            return M::from_row(row);
        }

        let result = qb
            .build()
            .execute(&mut *conn)
            .await
            .map_err(db_err("create"))?;
        let key = result.last_insert_rowid();

        let plan = Plan::<M>::new(
            &Filter::new().with(M::PRIMARY_KEY, key),
            &FetchOptions::new().with_deleted(),
        )?;
        Self::fetch_one_on(conn, &plan, "create")
            .await?
            .ok_or_else(|| {
                UserbaseError::internal(format!("{} {key} was inserted but cannot be read", M::NAME))
            })
    }

    /// Insert payload plus timestamps, with every column write-guarded.
    fn insert_values(data: &M::Create) -> UserbaseResult<Row> {
        let mut values = data
            .values()
            .into_iter()
            .map(|(column, value)| Ok((column, M::guard_write(column, value)?)))
            .collect::<UserbaseResult<Row>>()?;
        if M::TIMESTAMPS {
            let now = Utc::now();
            values.push((M::CREATED_AT, now.into()));
            values.push((M::UPDATED_AT, now.into()));
        }
        Ok(values)
    }
}

/// `INSERT INTO "table" ("a", "b")`
fn insert_head<M: Model>(row: &Row) -> QueryBuilder<'static, Sqlite> {
    let columns = row
        .iter()
        .map(|(column, _)| quote(column))
        .collect::<Vec<_>>()
        .join(", ");
    QueryBuilder::new(format!("INSERT INTO {} ({columns})", quote(M::TABLE)))
}

/// `(?, ?, ...)`
fn push_tuple(qb: &mut QueryBuilder<'static, Sqlite>, row: Row) {
    qb.push("(");
    for (i, (_, value)) in row.into_iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        value.push_bind(qb);
    }
    qb.push(")");
}
