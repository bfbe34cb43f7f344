use chrono::Local;
use lazy_static::lazy_static;
use log::{error, info};
use regex::Regex;
use rust_i18n::t;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    CFG_BACKUP_DIR, CFG_EXPORT_FILE_PREFIX, DEFAULT_EXPORT_FILE_PREFIX, STORE_DIR,
};
use crate::db::error::StoreError;
use crate::db::main_store::MainStore;

lazy_static! {
    // <prefix>-YYYYMMDD_HHMMSS[_N].json
    static ref SNAPSHOT_NAME: Regex =
        Regex::new(r"^(?P<prefix>.+)-(?P<stamp>\d{8}_\d{6})(_(?P<counter>\d+))?\.json$").expect("invalid snapshot name pattern");
}

/// Configuration for snapshot file operations.
#[derive(Debug, Clone, Default)]
pub struct BackupConfig {
    /// Directory where snapshot files are stored; defaults to `<data dir>/backup`
    pub backup_dir: Option<String>,
    /// File name prefix; defaults to `webhook-buddy-export`
    pub file_prefix: Option<String>,
}

/// Manages export snapshot files on disk.
pub struct DbBackup {
    backup_dir: PathBuf,
    file_prefix: String,
}

impl DbBackup {
    /// Creates a new `DbBackup`, making sure the backup directory exists.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError::IoError` if the directory cannot be created
    pub fn new(config: BackupConfig) -> Result<Self, StoreError> {
        let backup_dir = match config.backup_dir.as_deref() {
            None | Some("") => STORE_DIR.read().join("backup"),
            Some(dir) => PathBuf::from(dir),
        };

        if !backup_dir.exists() {
            fs::create_dir_all(&backup_dir).map_err(|e| {
                error!("Failed to create backup directory: {}", e);
                StoreError::IoError(
                    t!(
                        "db.backup.failed_to_create_backup_dir_at",
                        path = backup_dir.display(),
                        error = e.to_string()
                    )
                    .to_string(),
                )
            })?;
        }

        let file_prefix = match config.file_prefix {
            Some(prefix) if !prefix.trim().is_empty() => prefix.trim().to_string(),
            _ => DEFAULT_EXPORT_FILE_PREFIX.to_string(),
        };

        Ok(Self {
            backup_dir,
            file_prefix,
        })
    }

    /// Creates a `DbBackup` from the `backup_dir` and `export_file_prefix` settings.
    pub fn from_store(store: &MainStore) -> Result<Self, StoreError> {
        Self::new(BackupConfig {
            backup_dir: Some(store.get_config(CFG_BACKUP_DIR, String::new())),
            file_prefix: Some(store.get_config(
                CFG_EXPORT_FILE_PREFIX,
                DEFAULT_EXPORT_FILE_PREFIX.to_string(),
            )),
        })
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Writes an export document to a new, timestamped snapshot file.
    ///
    /// # Returns
    ///
    /// The path of the written file
    pub fn save_export(&self, content: &str) -> Result<PathBuf, StoreError> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let mut path = self
            .backup_dir
            .join(format!("{}-{}.json", self.file_prefix, stamp));
        let mut counter = 1;
        while path.exists() {
            path = self
                .backup_dir
                .join(format!("{}-{}_{}.json", self.file_prefix, stamp, counter));
            counter += 1;
        }

        fs::write(&path, content).map_err(|e| {
            error!("Failed to write snapshot file: {}", e);
            StoreError::IoError(
                t!(
                    "db.backup.failed_to_write_file",
                    path = path.display(),
                    error = e.to_string()
                )
                .to_string(),
            )
        })?;
        info!("Snapshot written to {}", path.display());
        Ok(path)
    }

    /// Lists snapshot files in the backup directory, newest first.
    pub fn list_snapshots(&self) -> Result<Vec<PathBuf>, StoreError> {
        if !self.backup_dir.exists() {
            return Err(StoreError::IoError(
                t!("db.backup.dir_not_found", path = self.backup_dir.display()).to_string(),
            ));
        }

        let mut snapshots: Vec<PathBuf> = fs::read_dir(&self.backup_dir)
            .map_err(|e| {
                StoreError::IoError(
                    t!(
                        "db.backup.failed_to_read_backup_dir",
                        path = self.backup_dir.display(),
                        error = e.to_string()
                    )
                    .to_string(),
                )
            })?
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if path.is_file() && self.is_snapshot_file(&path) {
                    Some(path)
                } else {
                    None
                }
            })
            .collect();

        snapshots.sort_by_key(|path| std::cmp::Reverse(snapshot_order(path)));
        Ok(snapshots)
    }

    /// Reads a snapshot file's text.
    pub fn read_snapshot(&self, path: &Path) -> Result<String, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound(
                t!("db.backup.file_not_found", path = path.display()).to_string(),
            ));
        }
        fs::read_to_string(path).map_err(|e| {
            StoreError::IoError(
                t!(
                    "db.backup.failed_to_read_file",
                    path = path.display(),
                    error = e.to_string()
                )
                .to_string(),
            )
        })
    }

    /// Deletes a snapshot file. Only snapshot files inside the backup directory can be removed.
    pub fn delete_snapshot(&self, path: &Path) -> Result<(), StoreError> {
        if path.parent() != Some(self.backup_dir.as_path()) || !self.is_snapshot_file(path) {
            return Err(StoreError::InvalidData(
                t!("db.backup.not_a_snapshot", path = path.display()).to_string(),
            ));
        }
        if !path.exists() {
            return Err(StoreError::NotFound(
                t!("db.backup.file_not_found", path = path.display()).to_string(),
            ));
        }
        fs::remove_file(path)?;
        info!("Deleted snapshot {}", path.display());
        Ok(())
    }

    /// Checks if a file name matches `<prefix>-YYYYMMDD_HHMMSS.json`
    fn is_snapshot_file(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| SNAPSHOT_NAME.captures(name))
            .and_then(|caps| caps.name("prefix"))
            .map(|prefix| prefix.as_str() == self.file_prefix)
            .unwrap_or(false)
    }
}

/// Creation order encoded in a snapshot file name: the timestamp, then the
/// collision counter (`0` for the first file of that second).
fn snapshot_order(path: &Path) -> (String, u64) {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| SNAPSHOT_NAME.captures(name))
        .map(|caps| {
            let stamp = caps.name("stamp").map_or("", |m| m.as_str()).to_string();
            let counter = caps
                .name("counter")
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0);
            (stamp, counter)
        })
        .unwrap_or_default()
}
