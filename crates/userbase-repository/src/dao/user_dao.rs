//! `UserDao`: the generic DAO bound to [`User`].

use crate::traits::UserRepository;
use crate::{BaseDao, DaoTransaction, FetchOptions, Filter};
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::ops::Deref;
use tracing::debug;
use userbase_core::{Email, Fetched, NewUser, PageRequest, User, UserId, UserbaseResult};

/// User data access object.
///
/// Every query operation comes from [`BaseDao`] through `Deref`.
#[derive(Debug, Clone)]
pub struct UserDao(BaseDao<User>);

impl UserDao {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self(BaseDao::new(pool))
    }

    /// Returns a DAO whose statements run on `transaction`.
    #[must_use]
    pub fn use_transaction(&self, transaction: &DaoTransaction) -> Self {
        Self(self.0.use_transaction(transaction))
    }

    #[must_use]
    pub fn without_returning(self) -> Self {
        Self(self.0.without_returning())
    }
}

impl Deref for UserDao {
    type Target = BaseDao<User>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<BaseDao<User>> for UserDao {
    fn from(dao: BaseDao<User>) -> Self {
        Self(dao)
    }
}

#[async_trait]
impl UserRepository for UserDao {
    async fn email_exists(&self, email: &Email) -> UserbaseResult<bool> {
        debug!("Checking whether email is registered: {}", email.masked());
        self.0.exist(&Filter::new().with("email", email)).await
    }

    async fn create(&self, user: &NewUser) -> UserbaseResult<User> {
        debug!("Creating user: {}", user.email.masked());
        self.0.create(user).await
    }

    async fn find_by_id(&self, id: UserId) -> UserbaseResult<Option<User>> {
        debug!("Finding user by id: {}", id);
        self.0
            .fetch_one(&Filter::new().with("id", id), &FetchOptions::new())
            .await
    }

    async fn find_all(&self, filter: Filter, page: PageRequest) -> UserbaseResult<Fetched<User>> {
        debug!("Finding users, page: {}, limit: {}", page.page, page.limit);
        self.0
            .fetch_all(&filter, &FetchOptions::new().paginate(page))
            .await
    }
}
