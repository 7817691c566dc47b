//! # Userbase Service
//!
//! Business logic service layer for Userbase.
//! Registration rules sit here, between the REST controllers and the
//! repository traits.

pub mod dto;
mod r#impl;
pub mod mappers;
pub mod user_service;

pub use dto::*;
pub use r#impl::*;
pub use user_service::*;
