use std::collections::HashSet;

use crate::constants::EXPORT_VERSION;
use crate::db::error::StoreError;
use crate::db::main_store::MainStore;
use crate::db::snapshot::{CollectionSelection, ExportData, ExportDocument};
use crate::libs::timestamp;

impl MainStore {
    /// Builds an export document for the selected collections.
    ///
    /// Flows whose category no longer exists are left out. Unselected
    /// collections are absent from `data`.
    pub fn export_document(
        &self,
        selection: &CollectionSelection,
    ) -> Result<ExportDocument, StoreError> {
        let mut data = ExportData::default();

        if selection.categories {
            data.categories = Some(self.get_categories()?);
        }

        if selection.flows {
            let category_ids: HashSet<i64> =
                self.get_categories()?.into_iter().map(|c| c.id).collect();
            let flows = self.get_flows()?;
            let total = flows.len();
            let valid: Vec<_> = flows
                .into_iter()
                .filter(|flow| category_ids.contains(&flow.category_id))
                .collect();
            if valid.len() < total {
                log::warn!(
                    "Skipping {} orphaned flow(s) during export",
                    total - valid.len()
                );
            }
            data.flows = Some(valid);
        }

        if selection.prompts {
            data.prompts = Some(self.get_prompts()?);
        }

        if selection.voice_channels {
            data.voice_channels = Some(self.get_voice_channels()?);
        }

        if selection.agents {
            data.agents = Some(self.get_agents()?);
        }

        Ok(ExportDocument {
            version: EXPORT_VERSION.to_string(),
            timestamp: timestamp::to_iso(&timestamp::now()),
            data,
        })
    }

    /// Exports the selected collections as a pretty-printed JSON document.
    pub fn export_data(&self, selection: &CollectionSelection) -> Result<String, StoreError> {
        let document = self.export_document(selection)?;
        let json = serde_json::to_string_pretty(&document)?;
        log::info!(
            "Exported store snapshot ({} bytes, version {})",
            json.len(),
            document.version
        );
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::snapshot::Collection;
    use crate::test::{memory_store, seed_store};
    use serde_json::Value;

    #[test]
    fn test_export_contains_version_timestamp_and_all_collections() {
        let mut store = memory_store();
        seed_store(&mut store);

        let json = store.export_data(&CollectionSelection::default()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["version"], EXPORT_VERSION);
        assert!(timestamp::parse_iso(value["timestamp"].as_str().unwrap()).is_ok());
        for collection in Collection::all() {
            assert!(
                value["data"][collection.key()].is_array(),
                "missing {}",
                collection.key()
            );
        }
    }

    #[test]
    fn test_unselected_collections_are_omitted() {
        let mut store = memory_store();
        seed_store(&mut store);

        let selection = CollectionSelection::only(&[Collection::Categories, Collection::Agents]);
        let value: Value = serde_json::from_str(&store.export_data(&selection).unwrap()).unwrap();
        let data = value["data"].as_object().unwrap();

        assert!(data.contains_key("categories"));
        assert!(data.contains_key("agents"));
        assert!(!data.contains_key("flows"));
        assert!(!data.contains_key("prompts"));
        assert!(!data.contains_key("voiceChannels"));
    }

    #[test]
    fn test_dates_are_iso_strings() {
        let mut store = memory_store();
        seed_store(&mut store);

        let value: Value = serde_json::from_str(
            &store
                .export_data(&CollectionSelection::default())
                .unwrap(),
        )
        .unwrap();

        for collection in Collection::all() {
            for row in value["data"][collection.key()].as_array().unwrap() {
                for field in ["createdAt", "updatedAt"] {
                    let text = row[field].as_str().unwrap();
                    assert!(text.ends_with('Z'), "{} in {}", text, collection.key());
                    assert!(timestamp::parse_iso(text).is_ok());
                }
            }
        }

        let category = &value["data"]["categories"][0];
        assert_eq!(category["name"], "Work");
        assert!(category["uuid"].is_string());
    }

    #[test]
    fn test_orphaned_flows_are_excluded() {
        let mut store = memory_store();
        let ids = seed_store(&mut store);

        // simulate a straggler left behind by an earlier import
        store
            .conn
            .execute(
                "INSERT INTO flows (uuid, name, webhook_url, category_id, created_at, updated_at)
                 VALUES ('orphan', 'orphan', 'https://example.com', 999, 0, 0)",
                [],
            )
            .unwrap();

        let document = store
            .export_document(&CollectionSelection::default())
            .unwrap();
        let flows = document.data.flows.unwrap();
        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].id, ids.flow);
        assert!(flows.iter().all(|f| f.uuid != "orphan"));
    }

    #[test]
    fn test_flow_filter_applies_without_exporting_categories() {
        let mut store = memory_store();
        seed_store(&mut store);

        let document = store
            .export_document(&CollectionSelection::only(&[Collection::Flows]))
            .unwrap();
        assert!(document.data.categories.is_none());
        assert_eq!(document.data.flows.unwrap().len(), 1);
    }
}
