//! # altdir Common Library
//!
//! Shared code for the altdir catalog tooling:
//! - Error type and result alias
//! - Configuration loading and root folder resolution
//! - Database initialization, schema and entity models

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
