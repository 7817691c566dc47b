//! # Userbase Repository
//!
//! Data access over SQLx:
//!
//! ```text
//! Service
//!   ↓  Arc<dyn UserRepository>  (domain interface)
//! UserDao                       (BaseDao<User> + repository impl)
//!   ↓
//! BaseDao<M: Model>             (filters, scopes, paging, transactions)
//!   ↓
//! SQLite
//! ```
//!
//! A [`Model`] maps an entity onto its table; [`BaseDao`] builds every
//! statement from that mapping, so an entity DAO adds no SQL of its own.

pub mod dao;
mod filter;
mod model;
pub mod models;
pub mod pool;
mod query;
pub mod traits;
mod transaction;
mod value;

pub use dao::{BaseDao, UserDao};
pub use filter::{Changes, Filter};
pub use model::{Association, Insertable, Model, Scope};
pub use models::{UserRow, UserScope};
pub use pool::*;
pub use query::{FetchOptions, SortOrder};
pub use traits::*;
pub use transaction::DaoTransaction;
pub use value::Value;
