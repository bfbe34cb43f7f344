//! User profile operations
//!
//! The profile is a singleton: saving a profile replaces whatever was stored
//! before, so at most one row exists in the `users` table.

use rusqlite::{params, OptionalExtension, Row};
use rust_i18n::t;
use serde::{Deserialize, Serialize};

use crate::db::error::StoreError;
use crate::db::main_store::MainStore;

/// The user profile attached to every outbound webhook payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(
        rename = "missionStatement",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mission_statement: Option<String>,
}

impl User {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            url: row.get("url")?,
            mission_statement: row.get("mission_statement")?,
        })
    }
}

impl MainStore {
    /// Returns the saved profile, if any.
    pub fn get_user(&self) -> Result<Option<User>, StoreError> {
        let user = self
            .conn
            .query_row("SELECT * FROM users ORDER BY id LIMIT 1", [], |row| {
                User::from_row(row)
            })
            .optional()?;
        Ok(user)
    }

    /// Saves `user` as the one and only profile.
    ///
    /// Any existing row is removed first; the new row gets a fresh id which is returned.
    pub fn save_user(&mut self, user: &User) -> Result<i64, StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM users", [])?;
        tx.execute(
            "INSERT INTO users (name, email, url, mission_statement) VALUES (?1, ?2, ?3, ?4)",
            params![user.name, user.email, user.url, user.mission_statement],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit().map_err(|e| {
            log::error!("Failed to save user profile: {}", e);
            StoreError::from(e)
        })?;
        Ok(id)
    }

    /// Updates the stored profile in place. `user.id` must name the existing row.
    pub fn update_user(&mut self, user: &User) -> Result<(), StoreError> {
        let id = user.id.ok_or_else(|| {
            StoreError::InvalidData(t!("db.user_id_required").to_string())
        })?;

        let changed = self.conn.execute(
            "UPDATE users SET name = ?1, email = ?2, url = ?3, mission_statement = ?4 WHERE id = ?5",
            params![user.name, user.email, user.url, user.mission_statement, id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(
                t!("db.row_not_found", entity = "user", id = id).to_string(),
            ));
        }
        Ok(())
    }
}
