//! Table mappings for domain entities.

mod user;

pub use user::*;
