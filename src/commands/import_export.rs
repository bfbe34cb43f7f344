//!
//! Export and import of the whole store, to strings or snapshot files.
//!
//! ## Example
//!
//! ```ignore
//! let result = export_to_file(&store, &CollectionSelection::default());
//! if result.success {
//!     println!("{}", result.message);
//! }
//! ```

use rust_i18n::t;
use std::path::Path;
use std::sync::{Arc, RwLock};

use super::ActionResult;
use crate::db::{CollectionSelection, DbBackup, ImportOptions, ImportReport, MainStore};
use crate::error::Result;

/// Serializes the selected collections into an export document.
pub fn export_json(
    state: &Arc<RwLock<MainStore>>,
    selection: &CollectionSelection,
) -> Result<String> {
    let store = state.read()?;
    Ok(store.export_data(selection)?)
}

/// Imports an export document into the store.
///
/// Callers should reload every view of the store afterwards.
pub fn import_json(
    state: &Arc<RwLock<MainStore>>,
    json: &str,
    options: &ImportOptions,
) -> Result<ImportReport> {
    let mut store = state.write()?;
    Ok(store.import_data(json, options)?)
}

/// Exports the selected collections into a new snapshot file in the backup directory.
pub fn export_to_file(
    state: &Arc<RwLock<MainStore>>,
    selection: &CollectionSelection,
) -> ActionResult {
    save_snapshot(state, selection).into()
}

fn save_snapshot(state: &Arc<RwLock<MainStore>>, selection: &CollectionSelection) -> Result<String> {
    let (json, backup) = {
        let store = state.read()?;
        (store.export_data(selection)?, DbBackup::from_store(&store)?)
    };
    let path = backup.save_export(&json)?;
    Ok(t!("main.export_saved", path = path.display()).to_string())
}

/// Imports a snapshot file.
pub fn import_from_file(
    state: &Arc<RwLock<MainStore>>,
    path: &Path,
    options: &ImportOptions,
) -> ActionResult {
    load_snapshot(state, path, options).into()
}

fn load_snapshot(
    state: &Arc<RwLock<MainStore>>,
    path: &Path,
    options: &ImportOptions,
) -> Result<String> {
    let json = snapshot_files(state)?.read_snapshot(path)?;
    let report = import_json(state, &json, options)?;
    Ok(summarize(&report))
}

/// Imports a document given as text, e.g. a file picked by the user.
pub fn import_text(
    state: &Arc<RwLock<MainStore>>,
    json: &str,
    options: &ImportOptions,
) -> ActionResult {
    import_json(state, json, options)
        .map(|report| summarize(&report))
        .into()
}

/// Lists snapshot files, newest first.
pub fn list_snapshots(state: &Arc<RwLock<MainStore>>) -> Result<Vec<String>> {
    Ok(snapshot_files(state)?
        .list_snapshots()?
        .into_iter()
        .map(|p| p.to_string_lossy().to_string())
        .collect())
}

pub fn delete_snapshot(state: &Arc<RwLock<MainStore>>, path: &Path) -> ActionResult {
    snapshot_files(state)
        .and_then(|backup| Ok(backup.delete_snapshot(path)?))
        .map(|_| t!("main.snapshot_deleted", path = path.display()).to_string())
        .into()
}

fn snapshot_files(state: &Arc<RwLock<MainStore>>) -> Result<DbBackup> {
    let store = state.read()?;
    Ok(DbBackup::from_store(&store)?)
}

fn summarize(report: &ImportReport) -> String {
    let mut message = t!("main.import_succeeded", count = report.total_imported()).to_string();
    if !report.warnings.is_empty() {
        message.push(' ');
        message.push_str(&t!("main.import_warnings", count = report.warnings.len()));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CFG_BACKUP_DIR;
    use crate::db::{Collection, StoreError};
    use crate::error::AppError;
    use crate::test::{memory_store, seed_store};
    use tempfile::TempDir;

    fn shared_store(dir: &TempDir) -> Arc<RwLock<MainStore>> {
        let mut store = memory_store();
        store
            .set_config(
                CFG_BACKUP_DIR,
                &serde_json::json!(dir.path().to_string_lossy()),
            )
            .unwrap();
        Arc::new(RwLock::new(store))
    }

    #[test]
    fn test_export_then_import_snapshot_file() {
        let dir = TempDir::new().unwrap();
        let state = shared_store(&dir);
        seed_store(&mut state.write().unwrap());

        let exported = export_to_file(&state, &CollectionSelection::default());
        assert!(exported.success, "{}", exported.message);

        let snapshots = list_snapshots(&state).unwrap();
        assert_eq!(snapshots.len(), 1);

        let result = import_from_file(
            &state,
            Path::new(&snapshots[0]),
            &ImportOptions {
                replace_existing: true,
                collections: CollectionSelection::default(),
            },
        );
        assert!(result.success, "{}", result.message);
        assert_eq!(state.read().unwrap().get_categories().unwrap().len(), 1);

        let deleted = delete_snapshot(&state, Path::new(&snapshots[0]));
        assert!(deleted.success);
        assert!(list_snapshots(&state).unwrap().is_empty());
    }

    #[test]
    fn test_failures_become_unsuccessful_results() {
        let dir = TempDir::new().unwrap();
        let state = shared_store(&dir);

        let result = import_text(&state, "{not json", &ImportOptions::default());
        assert!(!result.success);
        assert!(!result.message.is_empty());

        let missing = import_from_file(
            &state,
            &dir.path().join("nope.json"),
            &ImportOptions::default(),
        );
        assert!(!missing.success);
    }

    #[test]
    fn test_import_json_surfaces_store_errors() {
        let dir = TempDir::new().unwrap();
        let state = shared_store(&dir);

        let result = import_json(&state, r#"{"version":"1.0.0"}"#, &ImportOptions::default());
        assert!(matches!(
            result,
            Err(AppError::Db(StoreError::InvalidFormat(_)))
        ));

        let json = export_json(&state, &CollectionSelection::only(&[Collection::Agents])).unwrap();
        let report = import_json(&state, &json, &ImportOptions::default()).unwrap();
        assert_eq!(report.imported_count(Collection::Agents), 0);
    }
}
