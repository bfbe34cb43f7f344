use crate::db::sql::schema::*;

/// Version 2 migration SQL statements
/// Adds voice channels, agents and the optional prompt link on flows.
pub const MIGRATION_SQL: &[(&str, &str)] = &[
    (
        VOICE_CHANNELS_TABLE,
        "CREATE TABLE IF NOT EXISTS voice_channels (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            webhook_url TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
    ),
    (
        "idx_voice_channels_name",
        "CREATE INDEX IF NOT EXISTS idx_voice_channels_name ON voice_channels (name)",
    ),
    (
        AGENTS_TABLE,
        "CREATE TABLE IF NOT EXISTS agents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            webhook_url TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
    ),
    (
        "idx_agents_name",
        "CREATE INDEX IF NOT EXISTS idx_agents_name ON agents (name)",
    ),
    (
        "flows_prompt_id",
        "ALTER TABLE flows ADD COLUMN prompt_id INTEGER",
    ),
    (
        "idx_flows_prompt_id",
        "CREATE INDEX IF NOT EXISTS idx_flows_prompt_id ON flows (prompt_id)",
    ),
];
