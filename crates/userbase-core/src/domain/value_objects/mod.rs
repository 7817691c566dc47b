//! Value objects.

mod email;
mod password;
mod status;

pub use email::*;
pub use password::*;
pub use status::*;
