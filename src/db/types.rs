use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =================================================
// config
// =================================================
/// In-memory copy of the `config` table.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Config {
    pub settings: HashMap<String, Value>,
}

impl Config {
    /// Retrieves the value associated with the specified key from the settings.
    pub fn get_setting(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }

    /// Updates the value associated with the specified key in the settings.
    ///
    /// If the key already exists, its value will be replaced. If it does not exist, a new key-value pair will be added.
    pub fn update_setting(&mut self, key: &str, value: Value) {
        if let Some(old_value) = self.settings.get_mut(key) {
            *old_value = value;
        } else {
            self.settings.insert(key.to_string(), value);
        }
    }

    pub fn remove_setting(&mut self, key: &str) {
        self.settings.remove(key);
    }
}
