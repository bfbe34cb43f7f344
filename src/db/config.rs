use crate::db::error::StoreError;
use crate::db::main_store::MainStore;

use log::error;
use rusqlite::params;
use serde_json::Value;

impl MainStore {
    /// Sets a configuration item in the database.
    ///
    /// Inserts or replaces a configuration key-value pair. The value is stored in JSON format.
    ///
    /// # Arguments
    ///
    /// * `key` - The key of the configuration item.
    /// * `value` - The value of the configuration item as a `serde_json::Value`.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the database operation fails.
    pub fn set_config(&mut self, key: &str, value: &Value) -> Result<(), StoreError> {
        if let Err(e) = self.conn.execute(
            "INSERT OR REPLACE INTO config (key, value) VALUES (?, ?)",
            [key, &value.to_string()],
        ) {
            error!("Failed to set config for key '{}': {}", key, e);
            return Err(StoreError::from(e));
        }
        self.config.update_setting(key, value.clone());
        Ok(())
    }

    /// Removes a configuration item, falling back to defaults afterwards.
    pub fn remove_config(&mut self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM config WHERE key = ?1", params![key])
            .map_err(|e| {
                error!("Failed to remove config for key '{}': {}", key, e);
                StoreError::from(e)
            })?;
        self.config.remove_setting(key);
        Ok(())
    }

    /// Retrieves a configuration value of the specified type.
    ///
    /// # Type Parameters
    /// * `T`: The target type that implements Deserialize
    ///
    /// # Arguments
    /// * `key`: The configuration key to retrieve
    /// * `default`: The default value to return if the key doesn't exist or conversion fails
    ///
    /// # Returns
    /// The configuration value of type T, or the default value if not found
    pub fn get_config<T>(&self, key: &str, default: T) -> T
    where
        T: serde::de::DeserializeOwned,
    {
        self.config
            .get_setting(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use crate::constants::{CFG_WEBHOOK_TIMEOUT_SECS, DEFAULT_WEBHOOK_TIMEOUT_SECS};
    use crate::test::memory_store;
    use serde_json::json;

    #[test]
    fn test_config_defaults_and_overrides() {
        let mut store = memory_store();
        assert_eq!(
            store.get_config(CFG_WEBHOOK_TIMEOUT_SECS, DEFAULT_WEBHOOK_TIMEOUT_SECS),
            30
        );

        store.set_config(CFG_WEBHOOK_TIMEOUT_SECS, &json!(5)).unwrap();
        assert_eq!(
            store.get_config(CFG_WEBHOOK_TIMEOUT_SECS, DEFAULT_WEBHOOK_TIMEOUT_SECS),
            5
        );

        // a value of the wrong type falls back to the default
        store
            .set_config(CFG_WEBHOOK_TIMEOUT_SECS, &json!("soon"))
            .unwrap();
        assert_eq!(
            store.get_config(CFG_WEBHOOK_TIMEOUT_SECS, DEFAULT_WEBHOOK_TIMEOUT_SECS),
            30
        );

        store.remove_config(CFG_WEBHOOK_TIMEOUT_SECS).unwrap();
        assert!(store.config.get_setting(CFG_WEBHOOK_TIMEOUT_SECS).is_none());
    }

    #[test]
    fn test_config_survives_reload() {
        let mut store = memory_store();
        store.set_config("export_file_prefix", &json!("mine")).unwrap();
        store.reload_config().unwrap();
        assert_eq!(
            store.get_config("export_file_prefix", String::new()),
            "mine".to_string()
        );
    }
}
