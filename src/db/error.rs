use rust_i18n::t;
use serde::Serialize;
use thiserror::Error;

/// Represents errors that can occur in the main store.
#[derive(Error, Debug, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "camelCase")]
pub enum StoreError {
    /// Error variant for database-related errors.
    #[error("{0}")]
    DatabaseError(String),

    /// A referenced row does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The import document is not a recognizable export.
    #[error("{}", t!("db.invalid_import_format", error = _0))]
    InvalidFormat(String),

    /// The import transaction failed and was rolled back.
    #[error("{}", t!("db.import_failed", error = _0))]
    ImportFailed(String),

    #[error("{0}")]
    InvalidData(String),

    /// Error variant for JSON-related errors.
    #[error("{0}")]
    JsonError(String),

    /// Error variant for I/O-related errors.
    #[error("{0}")]
    IoError(String),

    #[error("{0}")]
    LockError(String),
}

/// Macro to implement the `From` trait for converting specific error types into `StoreError`.
///
/// # Arguments
///
/// - `$variant`: The variant of `StoreError` to use.
/// - `$error_type`: The type of the error to convert from.
/// - `$t_key`: The i18n key used to format the message.
macro_rules! impl_from_error {
    ($variant:ident, $error_type:ty, $t_key:literal) => {
        impl From<$error_type> for StoreError {
            fn from(err: $error_type) -> Self {
                StoreError::$variant(t!($t_key, error = err.to_string()).to_string())
            }
        }
    };
}

impl_from_error!(DatabaseError, rusqlite::Error, "db.database_error");
impl_from_error!(JsonError, serde_json::Error, "db.json_error");
impl_from_error!(IoError, std::io::Error, "db.io_error");

impl StoreError {
    /// Wraps any error raised inside the import transaction.
    pub(crate) fn into_import_failure(self) -> Self {
        match self {
            StoreError::ImportFailed(_) => self,
            other => StoreError::ImportFailed(other.to_string()),
        }
    }
}
