use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use rust_i18n::t;
use serde::{Deserialize, Serialize};

use crate::db::error::StoreError;
use crate::db::main_store::MainStore;
use crate::libs::timestamp;

/// A reusable system/user prompt pair that flows can attach to their payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: i64,
    pub name: String,
    #[serde(rename = "systemPrompt")]
    pub system_prompt: String,
    #[serde(rename = "userPrompt")]
    pub user_prompt: String,
    #[serde(rename = "createdAt", with = "timestamp::iso")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "timestamp::iso")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPrompt {
    pub name: String,
    #[serde(rename = "systemPrompt")]
    pub system_prompt: String,
    #[serde(rename = "userPrompt")]
    pub user_prompt: String,
}

#[derive(Debug, Clone, Default)]
pub struct PromptPatch {
    pub name: Option<String>,
    pub system_prompt: Option<String>,
    pub user_prompt: Option<String>,
}

impl Prompt {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            system_prompt: row.get("system_prompt")?,
            user_prompt: row.get("user_prompt")?,
            created_at: timestamp::from_millis(row.get("created_at")?),
            updated_at: timestamp::from_millis(row.get("updated_at")?),
        })
    }
}

impl MainStore {
    pub fn get_prompts(&self) -> Result<Vec<Prompt>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT * FROM prompts ORDER BY id")?;
        let prompts = stmt
            .query_map([], Prompt::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(prompts)
    }

    pub fn get_prompt_by_id(&self, id: i64) -> Result<Option<Prompt>, StoreError> {
        let prompt = self
            .conn
            .query_row(
                "SELECT * FROM prompts WHERE id = ?1",
                params![id],
                Prompt::from_row,
            )
            .optional()?;
        Ok(prompt)
    }

    pub fn create_prompt(&mut self, prompt: NewPrompt) -> Result<i64, StoreError> {
        let now = timestamp::to_millis(&timestamp::now());
        self.conn
            .execute(
                "INSERT INTO prompts (name, system_prompt, user_prompt, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![prompt.name, prompt.system_prompt, prompt.user_prompt, now],
            )
            .map_err(|e| {
                log::error!("Failed to create prompt: {}", e);
                StoreError::from(e)
            })?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_prompt(&mut self, id: i64, patch: PromptPatch) -> Result<(), StoreError> {
        let mut prompt = self.get_prompt_by_id(id)?.ok_or_else(|| {
            StoreError::NotFound(t!("db.row_not_found", entity = "prompt", id = id).to_string())
        })?;

        if let Some(name) = patch.name {
            prompt.name = name;
        }
        if let Some(system_prompt) = patch.system_prompt {
            prompt.system_prompt = system_prompt;
        }
        if let Some(user_prompt) = patch.user_prompt {
            prompt.user_prompt = user_prompt;
        }

        self.conn.execute(
            "UPDATE prompts SET name = ?1, system_prompt = ?2, user_prompt = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                prompt.name,
                prompt.system_prompt,
                prompt.user_prompt,
                timestamp::to_millis(&timestamp::now()),
                id
            ],
        )?;
        Ok(())
    }

    /// Deletes a prompt. Flows referring to it keep their `prompt_id`.
    pub fn delete_prompt(&mut self, id: i64) -> Result<(), StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM prompts WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(
                t!("db.row_not_found", entity = "prompt", id = id).to_string(),
            ));
        }
        Ok(())
    }
}
