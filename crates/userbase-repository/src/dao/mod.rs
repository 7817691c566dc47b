//! Data access objects.
//!
//! [`BaseDao`] holds every query shape; entity DAOs such as [`UserDao`]
//! bind it to one model and implement the repository traits services
//! depend on.

mod base_dao;
pub mod user_dao;

pub use base_dao::BaseDao;
pub use user_dao::UserDao;
