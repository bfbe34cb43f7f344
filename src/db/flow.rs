//! Flow database operations
//!
//! A flow is a webhook bound to a category, optionally carrying a prompt.
//! `prompt_id` is a weak reference: deleting a prompt leaves it in place.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_i18n::t;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::error::StoreError;
use crate::db::main_store::MainStore;
use crate::db::sql::schema::CATEGORIES_TABLE;
use crate::libs::timestamp;

/// A webhook endpoint grouped under a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub id: i64,
    pub uuid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "webhookUrl")]
    pub webhook_url: String,
    #[serde(rename = "categoryId")]
    pub category_id: i64,
    #[serde(rename = "promptId", default)]
    pub prompt_id: Option<i64>,
    #[serde(rename = "createdAt", with = "timestamp::iso")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "timestamp::iso")]
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a flow.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewFlow {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "webhookUrl")]
    pub webhook_url: String,
    #[serde(rename = "categoryId")]
    pub category_id: i64,
    #[serde(rename = "promptId", default)]
    pub prompt_id: Option<i64>,
}

/// Partial update for a flow; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct FlowPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub webhook_url: Option<String>,
    pub category_id: Option<i64>,
    pub prompt_id: Option<Option<i64>>,
}

impl Flow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            uuid: row.get("uuid")?,
            name: row.get("name")?,
            description: row.get("description")?,
            webhook_url: row.get("webhook_url")?,
            category_id: row.get("category_id")?,
            prompt_id: row.get("prompt_id")?,
            created_at: timestamp::from_millis(row.get("created_at")?),
            updated_at: timestamp::from_millis(row.get("updated_at")?),
        })
    }
}

/// A flow must always belong to an existing category.
fn ensure_category(conn: &Connection, category_id: i64) -> Result<(), StoreError> {
    if MainStore::row_exists(conn, CATEGORIES_TABLE, category_id)? {
        Ok(())
    } else {
        Err(StoreError::NotFound(
            t!("db.row_not_found", entity = "category", id = category_id).to_string(),
        ))
    }
}

impl MainStore {
    /// Gets all flows ordered by id.
    pub fn get_flows(&self) -> Result<Vec<Flow>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT * FROM flows ORDER BY id")?;
        let flows = stmt
            .query_map([], Flow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(flows)
    }

    /// Gets the flows of one category ordered by id.
    pub fn get_flows_by_category(&self, category_id: i64) -> Result<Vec<Flow>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM flows WHERE category_id = ?1 ORDER BY id")?;
        let flows = stmt
            .query_map(params![category_id], Flow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(flows)
    }

    /// Gets a flow by id.
    pub fn get_flow_by_id(&self, id: i64) -> Result<Option<Flow>, StoreError> {
        let flow = self
            .conn
            .query_row(
                "SELECT * FROM flows WHERE id = ?1",
                params![id],
                Flow::from_row,
            )
            .optional()?;
        Ok(flow)
    }

    /// Creates a flow in an existing category, returning its id.
    pub fn create_flow(&mut self, flow: NewFlow) -> Result<i64, StoreError> {
        ensure_category(&self.conn, flow.category_id)?;

        let now = timestamp::to_millis(&timestamp::now());
        self.conn
            .execute(
                "INSERT INTO flows (uuid, name, description, webhook_url, category_id, prompt_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    Uuid::new_v4().to_string(),
                    flow.name,
                    flow.description,
                    flow.webhook_url,
                    flow.category_id,
                    flow.prompt_id,
                    now
                ],
            )
            .map_err(|e| {
                log::error!("Failed to create flow: {}", e);
                StoreError::from(e)
            })?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Merges `patch` into the flow and bumps `updated_at`.
    pub fn update_flow(&mut self, id: i64, patch: FlowPatch) -> Result<(), StoreError> {
        let mut flow = self.get_flow_by_id(id)?.ok_or_else(|| {
            StoreError::NotFound(t!("db.row_not_found", entity = "flow", id = id).to_string())
        })?;

        if let Some(category_id) = patch.category_id {
            ensure_category(&self.conn, category_id)?;
            flow.category_id = category_id;
        }
        if let Some(name) = patch.name {
            flow.name = name;
        }
        if let Some(description) = patch.description {
            flow.description = description;
        }
        if let Some(webhook_url) = patch.webhook_url {
            flow.webhook_url = webhook_url;
        }
        if let Some(prompt_id) = patch.prompt_id {
            flow.prompt_id = prompt_id;
        }

        self.conn.execute(
            "UPDATE flows SET name = ?1, description = ?2, webhook_url = ?3, category_id = ?4,
             prompt_id = ?5, updated_at = ?6 WHERE id = ?7",
            params![
                flow.name,
                flow.description,
                flow.webhook_url,
                flow.category_id,
                flow.prompt_id,
                timestamp::to_millis(&timestamp::now()),
                id
            ],
        )?;
        Ok(())
    }

    /// Deletes a flow.
    pub fn delete_flow(&mut self, id: i64) -> Result<(), StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM flows WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(
                t!("db.row_not_found", entity = "flow", id = id).to_string(),
            ));
        }
        Ok(())
    }
}
