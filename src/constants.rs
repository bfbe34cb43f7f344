use lazy_static::*;
use parking_lot::RwLock as PLRwLock;
use std::path::PathBuf;
use std::sync::Arc;

pub const APP_NAME: &str = "webhook-buddy";
pub const DB_FILE_NAME: &str = "webhook-buddy.db";
pub const LOG_FILE_NAME: &str = "webhook-buddy.log";

// =================================================
// Export / import
// =================================================
/// Format version written into every export document.
pub const EXPORT_VERSION: &str = "1.0.0";

// =================================================
// Webhook payloads
// =================================================
pub const EXTENSION_VERSION: &str = "1.3.0";
pub const PAYLOAD_SOURCE: &str = "webhook-buddy-extension";

// =================================================
// Settings stored in the `config` table
// =================================================
pub const CFG_WEBHOOK_TIMEOUT_SECS: &str = "webhook_timeout_secs";
pub const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 30;
pub const CFG_EXPORT_FILE_PREFIX: &str = "export_file_prefix";
pub const DEFAULT_EXPORT_FILE_PREFIX: &str = "webhook-buddy-export";
pub const CFG_BACKUP_DIR: &str = "backup_dir";

lazy_static! {
    // Data directory holding the database, logs and snapshot files.
    // Debug builds use ./dev_data so development never touches the real profile.
    pub static ref STORE_DIR: Arc<PLRwLock<PathBuf>> = {
        #[cfg(debug_assertions)]
        let path = std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("dev_data");

        #[cfg(not(debug_assertions))]
        let path = dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_NAME);

        Arc::new(PLRwLock::new(path))
    };
}

/// read the value from the RwLock or return the default value if the lock cannot be acquired
pub fn get_static_var<T: Clone>(var: &Arc<PLRwLock<T>>) -> T {
    var.read().clone()
}
