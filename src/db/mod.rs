//! Database module for the Meteo server
//!
//! This module handles database connections, migrations,
//! and data access layer operations.

pub mod models;
pub mod operations;

pub use models::{Account, Favorite, SubscriptionStatus};
pub use operations::DbOperations;
