//! Category database operations
//!
//! Categories own flows: deleting a category deletes every flow whose
//! `category_id` points at it, inside the same transaction.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use rust_i18n::t;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::error::StoreError;
use crate::db::main_store::MainStore;
use crate::libs::timestamp;

/// A named group of flows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    /// Portable identity, stable across export and import.
    pub uuid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "createdAt", with = "timestamp::iso")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "timestamp::iso")]
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update for a category; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

impl Category {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            uuid: row.get("uuid")?,
            name: row.get("name")?,
            description: row.get("description")?,
            created_at: timestamp::from_millis(row.get("created_at")?),
            updated_at: timestamp::from_millis(row.get("updated_at")?),
        })
    }
}

impl MainStore {
    /// Gets all categories ordered by id.
    pub fn get_categories(&self) -> Result<Vec<Category>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT * FROM categories ORDER BY id")?;
        let categories = stmt
            .query_map([], Category::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    /// Gets a category by id.
    pub fn get_category_by_id(&self, id: i64) -> Result<Option<Category>, StoreError> {
        let category = self
            .conn
            .query_row(
                "SELECT * FROM categories WHERE id = ?1",
                params![id],
                Category::from_row,
            )
            .optional()?;
        Ok(category)
    }

    /// Creates a category with a fresh uuid and timestamps, returning its id.
    pub fn create_category(&mut self, category: NewCategory) -> Result<i64, StoreError> {
        let now = timestamp::to_millis(&timestamp::now());
        self.conn
            .execute(
                "INSERT INTO categories (uuid, name, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![
                    Uuid::new_v4().to_string(),
                    category.name,
                    category.description,
                    now
                ],
            )
            .map_err(|e| {
                log::error!("Failed to create category: {}", e);
                StoreError::from(e)
            })?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Merges `patch` into the category and bumps `updated_at`.
    pub fn update_category(&mut self, id: i64, patch: CategoryPatch) -> Result<(), StoreError> {
        let mut category = self.get_category_by_id(id)?.ok_or_else(|| {
            StoreError::NotFound(t!("db.row_not_found", entity = "category", id = id).to_string())
        })?;

        if let Some(name) = patch.name {
            category.name = name;
        }
        if let Some(description) = patch.description {
            category.description = description;
        }

        self.conn.execute(
            "UPDATE categories SET name = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                category.name,
                category.description,
                timestamp::to_millis(&timestamp::now()),
                id
            ],
        )?;
        Ok(())
    }

    /// Deletes a category together with all of its flows.
    pub fn delete_category(&mut self, id: i64) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;

        if !Self::row_exists(&tx, crate::db::sql::schema::CATEGORIES_TABLE, id)? {
            return Err(StoreError::NotFound(
                t!("db.row_not_found", entity = "category", id = id).to_string(),
            ));
        }

        let flows = tx.execute("DELETE FROM flows WHERE category_id = ?1", params![id])?;
        tx.execute("DELETE FROM categories WHERE id = ?1", params![id])?;

        tx.commit().map_err(|e| {
            log::error!("Failed to delete category {}: {}", id, e);
            StoreError::from(e)
        })?;
        log::debug!("Deleted category {} and {} flow(s)", id, flows);
        Ok(())
    }
}
