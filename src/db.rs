use std::fs;
use std::path::Path;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::info;

use crate::data::import::error::ImportError;

const SCHEMA: &str = include_str!("../sql/create_addresses.sql");

/// Discards whatever store exists at `path` and creates an empty one with
/// the `addresses` table and its lookup indexes.
pub fn create_store(path: &Path) -> Result<SqliteConnection, ImportError> {
    info!("Creating address store at {}", path.display());

    if path.exists() {
        fs::remove_file(path).map_err(|err| ImportError::Store(path.to_owned(), err))?;
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| ImportError::Store(parent.to_owned(), err))?;
    }

    let conn = SqliteConnection::establish(&path.to_string_lossy())?;
    conn.batch_execute(SCHEMA)?;

    Ok(conn)
}
