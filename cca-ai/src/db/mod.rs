//! Database access for cca-ai

pub mod calls;
pub mod findings;
pub mod settings;

use cca_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Open (or create) the analysis database and apply the schema
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    tracing::debug!("Connecting to database: {}", db_path.display());
    cca_common::db::init_database(db_path).await
}
