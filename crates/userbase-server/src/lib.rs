//! # Userbase Server Library
//!
//! Wires configuration, the database pool and every layer into a runnable
//! [`Application`], plus the startup and shutdown helpers the binary uses.

pub mod app;
pub mod startup;

pub use app::Application;
