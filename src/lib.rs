// modules
pub mod commands;
mod constants;
pub mod db;
pub mod error;
pub mod http;
mod libs;
mod logger;
pub mod webhook;

#[cfg(test)]
pub mod test;

use rust_i18n::i18n;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

pub use constants::{EXPORT_VERSION, EXTENSION_VERSION, STORE_DIR};
pub use db::MainStore;
pub use error::{AppError, Result};
pub use logger::setup_logger;

// Initialize internationalization with the "i18n" directory
// - Base directory is the crate root, so this will look for translations in ./i18n/
i18n!("i18n", fallback = "en");

/// Opens the application's store.
///
/// `data_dir` overrides the default data directory. Logging goes to
/// `<data dir>/logs` and the database is `<data dir>/webhook-buddy.db`.
/// Callers share the returned store between the UI and webhook dispatch.
pub fn init(data_dir: Option<PathBuf>) -> Result<Arc<RwLock<MainStore>>> {
    if let Some(dir) = data_dir {
        *STORE_DIR.write() = dir;
    }
    let data_dir = constants::get_static_var(&STORE_DIR);

    if let Err(e) = setup_logger(&data_dir.join("logs")) {
        // a logger installed by the host application is kept
        eprintln!("{}", e);
    }

    let store = MainStore::open(data_dir.join(constants::DB_FILE_NAME))?;
    log::info!(
        "Store opened at {:?}, schema version {}",
        data_dir,
        store.schema_version()?
    );
    Ok(Arc::new(RwLock::new(store)))
}

/// Closes a store opened by [`init`].
///
/// Fails when other handles to the store are still alive.
pub fn shutdown(store: Arc<RwLock<MainStore>>) -> Result<()> {
    let store = Arc::try_unwrap(store).map_err(|_| AppError::General {
        message: rust_i18n::t!("main.store_still_in_use").to_string(),
    })?;
    store.into_inner()?.close()?;
    log::info!("Store closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_and_shutdown() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = init(Some(dir.path().to_path_buf())).unwrap();
        assert!(dir.path().join(constants::DB_FILE_NAME).exists());

        let extra = store.clone();
        assert!(shutdown(store).is_err());
        assert!(shutdown(extra).is_ok());
    }
}
