use crate::db::error::StoreError;

use log::error;
use rusqlite::{params, Connection, OptionalExtension};

use rust_i18n::t;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use super::{sql::migrations::manager, types::Config};

/// Manages the local data store: settings, the user profile and the
/// categories, flows, prompts, voice channels and agents tables.
///
/// The store is constructed explicitly and shared by the caller, usually as
/// `Arc<RwLock<MainStore>>`. Every write goes through `&mut self`, so a single
/// logical operation is in flight at a time.
pub struct MainStore {
    pub(crate) conn: Connection,
    pub(crate) config: Config,
}

impl MainStore {
    /// Opens (or creates) the database at `db_path`, runs pending migrations
    /// and loads the settings.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the database connection or initialization fails.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path).map_err(|e| {
            let err = t!("db.failed_to_open_db_connection", error = e.to_string()).to_string();
            error!("{}", err);
            StoreError::DatabaseError(err)
        })?;
        log::debug!("Opened database at {:?}", db_path);

        Self::from_connection(conn)
    }

    /// Opens a private in-memory store. Every call yields an independent database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            let err = t!("db.failed_to_open_db_connection", error = e.to_string()).to_string();
            error!("{}", err);
            StoreError::DatabaseError(err)
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self, StoreError> {
        Self::init_db(&mut conn).map_err(|e| {
            let err = t!("db.failed_to_initialize_database", error = e.to_string()).to_string();
            error!("{}", err);
            StoreError::DatabaseError(err)
        })?;

        let config = Self::load_config(&conn)?;
        Ok(Self { conn, config })
    }

    /// Closes the underlying connection.
    ///
    /// Dropping the store also closes it; this variant reports close failures.
    pub fn close(self) -> Result<(), StoreError> {
        self.conn.close().map_err(|(_, e)| {
            error!("Failed to close database: {}", e);
            StoreError::from(e)
        })
    }

    /// Initializes the database by running the schema migrations.
    fn init_db(conn: &mut Connection) -> Result<(), StoreError> {
        manager::run_migrations(conn).map_err(|e| {
            error!("Failed to initialize database: {}", e);
            e
        })
    }

    /// Current schema version of the open database.
    pub fn schema_version(&self) -> Result<i32, StoreError> {
        manager::get_db_version(&self.conn)
    }

    fn load_config(conn: &Connection) -> Result<Config, StoreError> {
        let settings = Self::get_all_config(conn)?;
        Ok(Config { settings })
    }

    /// Reloads the configuration from the database.
    pub fn reload_config(&mut self) -> Result<(), StoreError> {
        self.config = Self::load_config(&self.conn)?;
        Ok(())
    }

    /// Retrieves all configuration items from the database.
    pub(crate) fn get_all_config(conn: &Connection) -> Result<HashMap<String, Value>, StoreError> {
        let mut stmt = conn.prepare("SELECT key, value FROM config").map_err(|e| {
            error!("Failed to prepare statement for getting all config: {}", e);
            StoreError::from(e)
        })?;
        let rows = stmt.query_map([], |row| {
            let key: String = row.get("key")?;
            let value_str: String = row.get("value")?;
            let value: Value = serde_json::from_str(&value_str).unwrap_or(Value::Null);
            Ok((key, value))
        })?;

        let mut config_map = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(config_map)
    }

    /// Returns `true` when a row with `id` exists in `table`.
    ///
    /// `table` must be one of the constants in `sql::schema`.
    pub(crate) fn row_exists(conn: &Connection, table: &str, id: i64) -> Result<bool, StoreError> {
        let found = conn
            .query_row(
                &format!("SELECT 1 FROM {} WHERE id = ?1", table),
                params![id],
                |_| Ok(true),
            )
            .optional()?;
        Ok(found.unwrap_or(false))
    }

    /// Counts the rows of `table`.
    pub(crate) fn count_rows(conn: &Connection, table: &str) -> Result<usize, StoreError> {
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })?;
        Ok(count as usize)
    }
}
