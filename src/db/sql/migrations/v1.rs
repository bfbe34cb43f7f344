use crate::db::sql::schema::*;

/// Initial database schema creation SQL statements
pub const INIT_SQL: &[(&str, &str)] = &[
    (
        "db_version",
        "CREATE TABLE IF NOT EXISTS db_version (
            version INTEGER PRIMARY KEY,
            applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    ),
    (
        CONFIG_TABLE,
        "CREATE TABLE IF NOT EXISTS config (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
    ),
    (
        USERS_TABLE,
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            url TEXT,
            mission_statement TEXT
        )",
    ),
    // Flows reference categories by id without an SQL foreign key: the store
    // cascades deletes itself and imports may keep unresolved ids.
    (
        CATEGORIES_TABLE,
        "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
    ),
    (
        "idx_categories_uuid",
        "CREATE INDEX IF NOT EXISTS idx_categories_uuid ON categories (uuid)",
    ),
    (
        "idx_categories_name",
        "CREATE INDEX IF NOT EXISTS idx_categories_name ON categories (name)",
    ),
    (
        FLOWS_TABLE,
        "CREATE TABLE IF NOT EXISTS flows (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            webhook_url TEXT NOT NULL,
            category_id INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
    ),
    (
        "idx_flows_uuid",
        "CREATE INDEX IF NOT EXISTS idx_flows_uuid ON flows (uuid)",
    ),
    (
        "idx_flows_category_id",
        "CREATE INDEX IF NOT EXISTS idx_flows_category_id ON flows (category_id)",
    ),
    (
        PROMPTS_TABLE,
        "CREATE TABLE IF NOT EXISTS prompts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            system_prompt TEXT NOT NULL,
            user_prompt TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
    ),
    (
        "idx_prompts_name",
        "CREATE INDEX IF NOT EXISTS idx_prompts_name ON prompts (name)",
    ),
];
