use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use rust_i18n::t;
use serde::{Deserialize, Serialize};

use crate::db::error::StoreError;
use crate::db::main_store::MainStore;
use crate::libs::timestamp;

/// A webhook that receives recorded voice messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceChannel {
    pub id: i64,
    pub name: String,
    #[serde(rename = "webhookUrl")]
    pub webhook_url: String,
    #[serde(rename = "createdAt", with = "timestamp::iso")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "timestamp::iso")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewVoiceChannel {
    pub name: String,
    #[serde(rename = "webhookUrl")]
    pub webhook_url: String,
}

#[derive(Debug, Clone, Default)]
pub struct VoiceChannelPatch {
    pub name: Option<String>,
    pub webhook_url: Option<String>,
}

impl VoiceChannel {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            webhook_url: row.get("webhook_url")?,
            created_at: timestamp::from_millis(row.get("created_at")?),
            updated_at: timestamp::from_millis(row.get("updated_at")?),
        })
    }
}

impl MainStore {
    pub fn get_voice_channels(&self) -> Result<Vec<VoiceChannel>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT * FROM voice_channels ORDER BY id")?;
        let channels = stmt
            .query_map([], VoiceChannel::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(channels)
    }

    pub fn get_voice_channel_by_id(&self, id: i64) -> Result<Option<VoiceChannel>, StoreError> {
        let channel = self
            .conn
            .query_row(
                "SELECT * FROM voice_channels WHERE id = ?1",
                params![id],
                VoiceChannel::from_row,
            )
            .optional()?;
        Ok(channel)
    }

    pub fn create_voice_channel(&mut self, channel: NewVoiceChannel) -> Result<i64, StoreError> {
        let now = timestamp::to_millis(&timestamp::now());
        self.conn
            .execute(
                "INSERT INTO voice_channels (name, webhook_url, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)",
                params![channel.name, channel.webhook_url, now],
            )
            .map_err(|e| {
                log::error!("Failed to create voice channel: {}", e);
                StoreError::from(e)
            })?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_voice_channel(
        &mut self,
        id: i64,
        patch: VoiceChannelPatch,
    ) -> Result<(), StoreError> {
        let mut channel = self.get_voice_channel_by_id(id)?.ok_or_else(|| {
            StoreError::NotFound(
                t!("db.row_not_found", entity = "voice channel", id = id).to_string(),
            )
        })?;

        if let Some(name) = patch.name {
            channel.name = name;
        }
        if let Some(webhook_url) = patch.webhook_url {
            channel.webhook_url = webhook_url;
        }

        self.conn.execute(
            "UPDATE voice_channels SET name = ?1, webhook_url = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                channel.name,
                channel.webhook_url,
                timestamp::to_millis(&timestamp::now()),
                id
            ],
        )?;
        Ok(())
    }

    pub fn delete_voice_channel(&mut self, id: i64) -> Result<(), StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM voice_channels WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(
                t!("db.row_not_found", entity = "voice channel", id = id).to_string(),
            ));
        }
        Ok(())
    }
}
