//! Database layer for khojney
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - Repository pattern for queries
//! - Derived views for question and category statistics

pub mod repo;
pub mod schema;

pub use repo::{AttemptFilter, AttemptOrder, Database};
