//! Local store connection and table creation.
//!
//! The device keeps its durable fallback in a small `SQLite` database accessed
//! through `SeaORM`. Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust structs.

use crate::entities::LocalState;
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;
use tracing::debug;

/// Connects to the local store at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to local store at {database_url}");
    ensure_parent_dir(database_url)?;
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates the directory holding a file-backed `SQLite` database.
fn ensure_parent_dir(database_url: &str) -> Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or_default();
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Creates the local state table if it does not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut local_state_table = schema.create_table_from_entity(LocalState);
    local_state_table.if_not_exists();

    db.execute(builder.build(&local_state_table)).await?;

    Ok(())
}
