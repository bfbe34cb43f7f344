//! Agent database operations
//!
//! This module provides database operations for managing chat agents.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use rust_i18n::t;
use serde::{Deserialize, Serialize};

use crate::db::{MainStore, StoreError};
use crate::libs::timestamp;

/// Represents a chat agent reachable through a webhook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique identifier for the agent
    pub id: i64,
    /// Name of the agent
    pub name: String,
    /// Description of the agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Endpoint receiving chat messages
    #[serde(rename = "webhookUrl")]
    pub webhook_url: String,
    /// Creation timestamp
    #[serde(rename = "createdAt", with = "timestamp::iso")]
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    #[serde(rename = "updatedAt", with = "timestamp::iso")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAgent {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "webhookUrl")]
    pub webhook_url: String,
}

#[derive(Debug, Clone, Default)]
pub struct AgentPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub webhook_url: Option<String>,
}

impl Agent {
    /// Converts a database row to an Agent instance
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            webhook_url: row.get("webhook_url")?,
            created_at: timestamp::from_millis(row.get("created_at")?),
            updated_at: timestamp::from_millis(row.get("updated_at")?),
        })
    }
}

impl MainStore {
    /// Adds a new agent to the database
    pub fn create_agent(&mut self, agent: NewAgent) -> Result<i64, StoreError> {
        let now = timestamp::to_millis(&timestamp::now());
        self.conn
            .execute(
                "INSERT INTO agents (name, description, webhook_url, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![agent.name, agent.description, agent.webhook_url, now],
            )
            .map_err(|e| {
                log::error!("Failed to create agent: {}", e);
                StoreError::from(e)
            })?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Updates an existing agent in the database
    pub fn update_agent(&mut self, id: i64, patch: AgentPatch) -> Result<(), StoreError> {
        let mut agent = self.get_agent_by_id(id)?.ok_or_else(|| {
            StoreError::NotFound(t!("db.row_not_found", entity = "agent", id = id).to_string())
        })?;

        if let Some(name) = patch.name {
            agent.name = name;
        }
        if let Some(description) = patch.description {
            agent.description = description;
        }
        if let Some(webhook_url) = patch.webhook_url {
            agent.webhook_url = webhook_url;
        }

        self.conn.execute(
            "UPDATE agents SET name = ?1, description = ?2, webhook_url = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                agent.name,
                agent.description,
                agent.webhook_url,
                timestamp::to_millis(&timestamp::now()),
                id
            ],
        )?;
        Ok(())
    }

    /// Deletes an agent from the database
    pub fn delete_agent(&mut self, id: i64) -> Result<(), StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM agents WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(
                t!("db.row_not_found", entity = "agent", id = id).to_string(),
            ));
        }
        Ok(())
    }

    /// Gets an agent by ID
    pub fn get_agent_by_id(&self, id: i64) -> Result<Option<Agent>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT * FROM agents WHERE id = ?1")?;
        let agent = stmt.query_row(params![id], Agent::from_row).optional()?;
        Ok(agent)
    }

    /// Gets all agents
    pub fn get_agents(&self) -> Result<Vec<Agent>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT * FROM agents ORDER BY id")?;
        let agents = stmt
            .query_map(params![], Agent::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(agents)
    }
}
