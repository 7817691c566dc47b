//! Shared transaction handle.

use sqlx::{Sqlite, SqlitePool, Transaction};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};
use userbase_core::{UserbaseError, UserbaseResult};

pub(crate) type TxSlot = Option<Transaction<'static, Sqlite>>;

/// A cloneable handle to one open transaction.
///
/// Every DAO bound to the handle runs its statements on the same
/// transaction. Calls on the same handle are serialized. Once committed or
/// rolled back the handle is finalized and any further use fails.
#[derive(Clone)]
pub struct DaoTransaction {
    inner: Arc<Mutex<TxSlot>>,
}

impl DaoTransaction {
    /// Begins a new transaction on `pool`.
    pub async fn begin(pool: &SqlitePool) -> UserbaseResult<Self> {
        let tx = pool
            .begin()
            .await
            .map_err(|e| UserbaseError::from_sqlx("begin_transaction", e))?;
        debug!("Transaction started");
        Ok(Self {
            inner: Arc::new(Mutex::new(Some(tx))),
        })
    }

    pub async fn commit(&self) -> UserbaseResult<()> {
        let tx = self.take("commit_transaction").await?;
        tx.commit()
            .await
            .map_err(|e| UserbaseError::from_sqlx("commit_transaction", e))?;
        debug!("Transaction committed");
        Ok(())
    }

    pub async fn rollback(&self) -> UserbaseResult<()> {
        let tx = self.take("rollback_transaction").await?;
        tx.rollback().await.map_err(|e| {
            warn!("Rollback failed: {}", e);
            UserbaseError::from_sqlx("rollback_transaction", e)
        })?;
        debug!("Transaction rolled back");
        Ok(())
    }

    /// Returns false once the transaction has been finalized.
    pub async fn is_active(&self) -> bool {
        self.inner.lock().await.is_some()
    }

    /// Returns true when both handles refer to the same transaction.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, TxSlot> {
        self.inner.lock().await
    }

    async fn take(&self, operation: &str) -> UserbaseResult<Transaction<'static, Sqlite>> {
        self.inner
            .lock()
            .await
            .take()
            .ok_or_else(|| finalized(operation))
    }
}

pub(crate) fn finalized(operation: &str) -> UserbaseError {
    UserbaseError::internal(format!(
        "{operation} failed: transaction was already committed or rolled back"
    ))
}

impl fmt::Debug for DaoTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DaoTransaction")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish()
    }
}
