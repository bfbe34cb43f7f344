use crate::db::sql::migrations::{v1, v2};
use crate::db::StoreError;
use rusqlite::Connection;

// Define the migration structure to hold SQL statements directly.
struct Migration {
    version: i32,
    description: &'static str,
    sql: &'static [(&'static str, &'static str)],
}

// Register all migrations with their corresponding SQL.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 2,
    description: "v2 migration: Add voice channels, agents and flow prompts",
    sql: v2::MIGRATION_SQL,
}];

/// Executes a given set of SQL statements within a transaction and updates the db version.
fn execute_migration_sql(
    conn: &mut Connection,
    sql_statements: &[(&str, &str)],
    version: i32,
) -> Result<(), StoreError> {
    if sql_statements.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (name, sql) in sql_statements {
        tx.execute(sql, []).map_err(|e| {
            log::error!("Migration v{} failed at '{}': {}", version, name, e);
            StoreError::from(e)
        })?;
    }

    tx.execute(
        "INSERT OR REPLACE INTO db_version (version) VALUES (?1)",
        [version],
    )?;

    tx.commit()?;
    Ok(())
}

/// Gets the current database version
pub fn get_db_version(conn: &Connection) -> Result<i32, StoreError> {
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM db_version",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);
    Ok(version)
}

/// Latest schema version known to this build.
pub fn latest_version() -> i32 {
    MIGRATIONS.last().map_or(1, |m| m.version)
}

/// Runs all necessary migrations to update the database to the latest version
pub fn run_migrations(conn: &mut Connection) -> Result<(), StoreError> {
    let mut current_version = get_db_version(conn)?;

    if current_version < 1 {
        log::info!("Database not initialized. Running initial migration (v1)...");
        execute_migration_sql(conn, v1::INIT_SQL, 1)?;
        current_version = get_db_version(conn)?;
        log::info!("Initial migration to v{} complete.", current_version);
    }

    let latest_migration_version = latest_version();
    if current_version >= latest_migration_version {
        log::debug!(
            "Database is already up to date at version {}.",
            current_version
        );
        return Ok(());
    }

    let mut pending_migrations: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|m| m.version > current_version)
        .collect();
    pending_migrations.sort_by_key(|m| m.version);

    for migration in pending_migrations {
        log::info!(
            "Applying migration version {}... ({})",
            migration.version,
            migration.description
        );
        execute_migration_sql(conn, migration.sql, migration.version)?;
    }

    log::info!(
        "All migrations applied. Database is now at version {}.",
        get_db_version(conn)?
    );

    Ok(())
}
