//! # CCA Common Library
//!
//! Shared code for the call-center compliance analysis workspace:
//! - Error and result types
//! - Bootstrap configuration (TOML file, data folder resolution)
//! - SQLite initialization and table definitions

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
