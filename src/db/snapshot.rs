//! Types shared by export and import.
//!
//! An export document looks like:
//!
//! ```json
//! {
//!   "version": "1.0.0",
//!   "timestamp": "2024-05-01T10:00:00.000Z",
//!   "data": {
//!     "categories": [...],
//!     "flows": [...]
//!   }
//! }
//! ```
//!
//! Only selected collections appear under `data`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use super::sql::schema::*;
use super::{Agent, Category, Flow, Prompt, VoiceChannel};

/// The exportable collections, in the order an import must process them.
///
/// Flows come right after categories because their `categoryId` is rewritten
/// through the category id mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, IntoStaticStr)]
pub enum Collection {
    #[strum(serialize = "categories")]
    Categories,
    #[strum(serialize = "flows")]
    Flows,
    #[strum(serialize = "prompts")]
    Prompts,
    #[strum(serialize = "voiceChannels")]
    VoiceChannels,
    #[strum(serialize = "agents")]
    Agents,
}

impl Collection {
    /// Key of the collection under the document's `data` object.
    pub fn key(self) -> &'static str {
        self.into()
    }

    pub(crate) fn table(self) -> &'static str {
        match self {
            Collection::Categories => CATEGORIES_TABLE,
            Collection::Flows => FLOWS_TABLE,
            Collection::Prompts => PROMPTS_TABLE,
            Collection::VoiceChannels => VOICE_CHANNELS_TABLE,
            Collection::Agents => AGENTS_TABLE,
        }
    }

    pub fn all() -> impl Iterator<Item = Collection> {
        Collection::iter()
    }
}

fn included() -> bool {
    true
}

/// Which collections to export or import. Every collection is included by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelection {
    #[serde(default = "included")]
    pub categories: bool,
    #[serde(default = "included")]
    pub flows: bool,
    #[serde(default = "included")]
    pub prompts: bool,
    #[serde(default = "included")]
    pub voice_channels: bool,
    #[serde(default = "included")]
    pub agents: bool,
}

impl Default for CollectionSelection {
    fn default() -> Self {
        Self {
            categories: true,
            flows: true,
            prompts: true,
            voice_channels: true,
            agents: true,
        }
    }
}

impl CollectionSelection {
    /// A selection with nothing included.
    pub fn none() -> Self {
        Self {
            categories: false,
            flows: false,
            prompts: false,
            voice_channels: false,
            agents: false,
        }
    }

    /// A selection containing only `collections`.
    pub fn only(collections: &[Collection]) -> Self {
        let mut selection = Self::none();
        for collection in collections {
            selection.set(*collection, true);
        }
        selection
    }

    pub fn includes(&self, collection: Collection) -> bool {
        match collection {
            Collection::Categories => self.categories,
            Collection::Flows => self.flows,
            Collection::Prompts => self.prompts,
            Collection::VoiceChannels => self.voice_channels,
            Collection::Agents => self.agents,
        }
    }

    pub fn set(&mut self, collection: Collection, include: bool) {
        match collection {
            Collection::Categories => self.categories = include,
            Collection::Flows => self.flows = include,
            Collection::Prompts => self.prompts = include,
            Collection::VoiceChannels => self.voice_channels = include,
            Collection::Agents => self.agents = include,
        }
    }
}

/// A complete export document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    pub version: String,
    pub timestamp: String,
    pub data: ExportData,
}

/// Exported collections; unselected ones are omitted rather than empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flows: Option<Vec<Flow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<Vec<Prompt>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_channels: Option<Vec<VoiceChannel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agents: Option<Vec<Agent>>,
}

/// Options for importing a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOptions {
    /// Clear each imported collection first and keep the document's ids.
    #[serde(default)]
    pub replace_existing: bool,
    #[serde(flatten)]
    pub collections: CollectionSelection,
}

/// What an import did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Rows inserted per collection key.
    pub imported: BTreeMap<String, usize>,
    /// Rows removed per collection key when replacing.
    pub cleared: BTreeMap<String, usize>,
    /// Document category id -> id assigned by the store.
    pub category_id_map: BTreeMap<i64, i64>,
    /// Recoverable problems, e.g. flows whose category could not be resolved.
    pub warnings: Vec<String>,
}

impl ImportReport {
    pub fn imported_count(&self, collection: Collection) -> usize {
        self.imported.get(collection.key()).copied().unwrap_or(0)
    }

    pub fn total_imported(&self) -> usize {
        self.imported.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collections_iterate_in_import_order() {
        let keys: Vec<&str> = Collection::all().map(Collection::key).collect();
        assert_eq!(
            keys,
            vec!["categories", "flows", "prompts", "voiceChannels", "agents"]
        );
    }

    #[test]
    fn test_import_options_default_to_everything_without_replace() {
        let options: ImportOptions = serde_json::from_str("{}").unwrap();
        assert!(!options.replace_existing);
        assert!(Collection::all().all(|c| options.collections.includes(c)));

        let options: ImportOptions =
            serde_json::from_str(r#"{"replaceExisting": true, "agents": false}"#).unwrap();
        assert!(options.replace_existing);
        assert!(!options.collections.agents);
        assert!(options.collections.voice_channels);
    }

    #[test]
    fn test_selection_only() {
        let selection = CollectionSelection::only(&[Collection::Flows]);
        assert!(selection.includes(Collection::Flows));
        assert!(!selection.includes(Collection::Categories));
    }
}
