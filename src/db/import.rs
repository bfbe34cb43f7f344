//! Transactional import of export documents.
//!
//! Collections are processed in [`Collection::all`] order inside a single
//! transaction. Categories are imported first so that every flow's
//! `categoryId` can be rewritten through the id mapping they produce.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Transaction};
use rust_i18n::t;
use serde::{de, Deserialize, Deserializer};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::db::error::StoreError;
use crate::db::main_store::MainStore;
use crate::db::snapshot::{Collection, ImportOptions, ImportReport};
use crate::db::sql::schema::CATEGORIES_TABLE;
use crate::libs::timestamp;

/// Accepts a number, a numeric string, or a falsy value (`null`, `false`, `""`).
fn loose_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(id) => Ok(Some(id)),
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 => Ok(Some(f as i64)),
                _ => Err(de::Error::custom(format!("invalid id: {}", n))),
            },
        },
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<i64>()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid id: {:?}", s)))
        }
        Some(other) => Err(de::Error::custom(format!("invalid id: {}", other))),
    }
}

/// Accepts an ISO-8601 string or epoch milliseconds.
fn loose_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => timestamp::parse_iso(&s)
            .map(Some)
            .map_err(|e| de::Error::custom(format!("invalid timestamp {:?}: {}", s, e))),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(|ms| Some(timestamp::from_millis(ms)))
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", n))),
        Some(other) => Err(de::Error::custom(format!("invalid timestamp: {}", other))),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryRow {
    #[serde(default, deserialize_with = "loose_id")]
    id: Option<i64>,
    #[serde(default)]
    uuid: Option<String>,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, deserialize_with = "loose_timestamp")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "loose_timestamp")]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlowRow {
    #[serde(default, deserialize_with = "loose_id")]
    id: Option<i64>,
    #[serde(default)]
    uuid: Option<String>,
    name: String,
    #[serde(default)]
    description: Option<String>,
    webhook_url: String,
    #[serde(default, deserialize_with = "loose_id")]
    category_id: Option<i64>,
    #[serde(default, deserialize_with = "loose_id")]
    prompt_id: Option<i64>,
    #[serde(default, deserialize_with = "loose_timestamp")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "loose_timestamp")]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptRow {
    #[serde(default, deserialize_with = "loose_id")]
    id: Option<i64>,
    name: String,
    system_prompt: String,
    user_prompt: String,
    #[serde(default, deserialize_with = "loose_timestamp")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "loose_timestamp")]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoiceChannelRow {
    #[serde(default, deserialize_with = "loose_id")]
    id: Option<i64>,
    name: String,
    webhook_url: String,
    #[serde(default, deserialize_with = "loose_timestamp")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "loose_timestamp")]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgentRow {
    #[serde(default, deserialize_with = "loose_id")]
    id: Option<i64>,
    name: String,
    #[serde(default)]
    description: Option<String>,
    webhook_url: String,
    #[serde(default, deserialize_with = "loose_timestamp")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "loose_timestamp")]
    updated_at: Option<DateTime<Utc>>,
}

/// State shared by the per-collection import steps.
struct ImportContext<'a> {
    tx: &'a Connection,
    replace: bool,
    now: i64,
    report: ImportReport,
}

impl ImportContext<'_> {
    /// The id to insert: the document's id when replacing, otherwise none.
    fn row_id(&self, original: Option<i64>) -> Option<i64> {
        if self.replace {
            original
        } else {
            None
        }
    }

    fn millis(&self, ts: Option<DateTime<Utc>>) -> i64 {
        ts.map(|t| timestamp::to_millis(&t)).unwrap_or(self.now)
    }

    fn clear(&mut self, collection: Collection) -> Result<(), StoreError> {
        let cleared = self.tx.execute(&format!("DELETE FROM {}", collection.table()), [])?;
        log::debug!("Cleared {} row(s) from {}", cleared, collection.key());
        self.report
            .cleared
            .insert(collection.key().to_string(), cleared);
        Ok(())
    }

    fn import_categories(&mut self, rows: Vec<CategoryRow>) -> Result<usize, StoreError> {
        let tx = self.tx;
        let mut stmt = tx.prepare(
            "INSERT INTO categories (id, uuid, name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        let count = rows.len();
        for row in rows {
            let new_id = stmt.insert(params![
                self.row_id(row.id),
                fresh_uuid(row.uuid),
                row.name,
                row.description,
                self.millis(row.created_at),
                self.millis(row.updated_at),
            ])?;
            if let Some(original) = row.id {
                self.report.category_id_map.insert(original, new_id);
            }
        }
        Ok(count)
    }

    fn import_flows(&mut self, rows: Vec<FlowRow>) -> Result<usize, StoreError> {
        let tx = self.tx;
        let mut stmt = tx.prepare(
            "INSERT INTO flows
             (id, uuid, name, description, webhook_url, category_id, prompt_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        let count = rows.len();
        for row in rows {
            let original = row.category_id.ok_or_else(|| {
                StoreError::InvalidData(t!("db.flow_category_required", name = row.name).to_string())
            })?;
            let category_id = match self.report.category_id_map.get(&original).copied() {
                Some(mapped) => mapped,
                None => {
                    // not part of this import, keep the document's id as is
                    let warning = if MainStore::row_exists(self.tx, CATEGORIES_TABLE, original)? {
                        t!("db.flow_category_kept", name = row.name, id = original)
                    } else {
                        t!("db.flow_category_unresolved", name = row.name, id = original)
                    }
                    .to_string();
                    log::warn!("{}", warning);
                    self.report.warnings.push(warning);
                    original
                }
            };
            let prompt_id = row.prompt_id.filter(|id| *id != 0);

            stmt.insert(params![
                self.row_id(row.id),
                fresh_uuid(row.uuid),
                row.name,
                row.description,
                row.webhook_url,
                category_id,
                prompt_id,
                self.millis(row.created_at),
                self.millis(row.updated_at),
            ])?;
        }
        Ok(count)
    }

    fn import_prompts(&mut self, rows: Vec<PromptRow>) -> Result<usize, StoreError> {
        let tx = self.tx;
        let mut stmt = tx.prepare(
            "INSERT INTO prompts (id, name, system_prompt, user_prompt, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        let count = rows.len();
        for row in rows {
            stmt.insert(params![
                self.row_id(row.id),
                row.name,
                row.system_prompt,
                row.user_prompt,
                self.millis(row.created_at),
                self.millis(row.updated_at),
            ])?;
        }
        Ok(count)
    }

    fn import_voice_channels(&mut self, rows: Vec<VoiceChannelRow>) -> Result<usize, StoreError> {
        let tx = self.tx;
        let mut stmt = tx.prepare(
            "INSERT INTO voice_channels (id, name, webhook_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        let count = rows.len();
        for row in rows {
            stmt.insert(params![
                self.row_id(row.id),
                row.name,
                row.webhook_url,
                self.millis(row.created_at),
                self.millis(row.updated_at),
            ])?;
        }
        Ok(count)
    }

    fn import_agents(&mut self, rows: Vec<AgentRow>) -> Result<usize, StoreError> {
        let tx = self.tx;
        let mut stmt = tx.prepare(
            "INSERT INTO agents (id, name, description, webhook_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        let count = rows.len();
        for row in rows {
            stmt.insert(params![
                self.row_id(row.id),
                row.name,
                row.description,
                row.webhook_url,
                self.millis(row.created_at),
                self.millis(row.updated_at),
            ])?;
        }
        Ok(count)
    }
}

fn fresh_uuid(uuid: Option<String>) -> String {
    uuid.filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Deserializes the rows of one collection, reporting the offending index on failure.
fn parse_rows<T: for<'de> Deserialize<'de>>(
    collection: Collection,
    rows: Vec<Value>,
) -> Result<Vec<T>, StoreError> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            serde_json::from_value(row).map_err(|e| {
                StoreError::InvalidData(
                    t!(
                        "db.invalid_import_row",
                        collection = collection.key(),
                        index = index,
                        error = e.to_string()
                    )
                    .to_string(),
                )
            })
        })
        .collect()
}

/// Checks the document envelope and returns its `data` object.
fn document_data(json: &str) -> Result<Map<String, Value>, StoreError> {
    let document: Value =
        serde_json::from_str(json).map_err(|e| StoreError::InvalidFormat(e.to_string()))?;

    let Value::Object(mut document) = document else {
        return Err(StoreError::InvalidFormat(
            t!("db.import_not_an_object").to_string(),
        ));
    };

    let version = match document.get("version") {
        Some(Value::String(v)) if !v.trim().is_empty() => v.clone(),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
        None | Some(Value::Null) => {
            return Err(StoreError::InvalidFormat(
                t!("db.import_missing_version").to_string(),
            ))
        }
        Some(other) => {
            return Err(StoreError::InvalidFormat(
                t!("db.import_invalid_version", version = other.to_string()).to_string(),
            ))
        }
    };
    log::debug!("Importing document version {}", version);

    match document.remove("data") {
        Some(Value::Object(data)) => Ok(data),
        _ => Err(StoreError::InvalidFormat(
            t!("db.import_missing_data").to_string(),
        )),
    }
}

impl MainStore {
    /// Imports an export document.
    ///
    /// A collection is touched only when it is selected in `options` and
    /// present in the document. The import is all-or-nothing: any failure
    /// rolls back every collection and is reported as
    /// [`StoreError::ImportFailed`]. An unreadable document is rejected with
    /// [`StoreError::InvalidFormat`] before the transaction opens.
    pub fn import_data(
        &mut self,
        json: &str,
        options: &ImportOptions,
    ) -> Result<ImportReport, StoreError> {
        let mut data = document_data(json)?;

        let tx = self
            .conn
            .transaction()
            .map_err(|e| StoreError::from(e).into_import_failure())?;

        match Self::apply_import(&tx, &mut data, options) {
            Ok(report) => {
                tx.commit()
                    .map_err(|e| StoreError::from(e).into_import_failure())?;
                log::info!(
                    "Import finished: {} row(s), {} warning(s)",
                    report.total_imported(),
                    report.warnings.len()
                );
                Ok(report)
            }
            Err(e) => {
                // dropping the transaction rolls it back
                drop(tx);
                log::error!("Import rolled back: {}", e);
                Err(e.into_import_failure())
            }
        }
    }

    fn apply_import(
        tx: &Transaction<'_>,
        data: &mut Map<String, Value>,
        options: &ImportOptions,
    ) -> Result<ImportReport, StoreError> {
        let mut ctx = ImportContext {
            tx,
            replace: options.replace_existing,
            now: timestamp::to_millis(&timestamp::now()),
            report: ImportReport {
                imported: BTreeMap::new(),
                cleared: BTreeMap::new(),
                category_id_map: BTreeMap::new(),
                warnings: Vec::new(),
            },
        };

        for collection in Collection::all() {
            if !options.collections.includes(collection) {
                continue;
            }
            let rows = match data.remove(collection.key()) {
                None | Some(Value::Null) => continue,
                Some(Value::Array(rows)) => rows,
                Some(_) => {
                    return Err(StoreError::InvalidData(
                        t!("db.import_collection_not_array", collection = collection.key())
                            .to_string(),
                    ))
                }
            };

            if ctx.replace {
                ctx.clear(collection)?;
            }

            let count = match collection {
                Collection::Categories => ctx.import_categories(parse_rows(collection, rows)?)?,
                Collection::Flows => ctx.import_flows(parse_rows(collection, rows)?)?,
                Collection::Prompts => ctx.import_prompts(parse_rows(collection, rows)?)?,
                Collection::VoiceChannels => {
                    ctx.import_voice_channels(parse_rows(collection, rows)?)?
                }
                Collection::Agents => ctx.import_agents(parse_rows(collection, rows)?)?,
            };
            log::debug!("Imported {} row(s) into {}", count, collection.key());
            ctx.report
                .imported
                .insert(collection.key().to_string(), count);
        }

        Ok(ctx.report)
    }
}
