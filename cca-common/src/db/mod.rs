//! Database initialization and table definitions

pub mod init;

pub use init::*;
