use rust_i18n::t;
use serde::Serialize;
use thiserror::Error;

/// The single, unified error type for the entire application.
///
/// This enum wraps all module-specific errors, providing a consistent structure
/// for error handling and for serialization to the UI layer.
/// The `#[serde(tag = "module", content = "details")]` attribute ensures that
/// the JSON output is clean and predictable.
#[derive(Error, Debug, Serialize)]
#[serde(tag = "module", content = "details")]
pub enum AppError {
    #[error(transparent)]
    Db(#[from] crate::db::error::StoreError),

    /// Errors originating from the HTTP module.
    #[error(transparent)]
    Http(#[from] crate::http::error::HttpError),

    /// Errors raised while delivering a webhook payload.
    #[error(transparent)]
    Webhook(#[from] crate::webhook::error::WebhookError),

    #[error("{message}")]
    General { message: String },
}

// Lets UI-facing operations hand errors over as a single JSON string.
impl From<AppError> for String {
    fn from(error: AppError) -> Self {
        let error_message = error.to_string();

        match serde_json::to_value(&error) {
            Ok(mut value) => {
                if let Some(obj) = value.as_object_mut() {
                    obj.insert(
                        "message".to_string(),
                        serde_json::Value::String(error_message),
                    );
                }
                serde_json::to_string(&value).unwrap_or_else(|e| {
                    serde_json::json!({
                        "module": "Internal",
                        "details": {
                            "kind": "SerializationFailed",
                            "message": format!("Failed to re-serialize error value: {}", e)
                        },
                        "message": "An unexpected error occurred during error handling.".to_string()
                    })
                    .to_string()
                })
            }
            Err(e) => serde_json::json!({
                "module": "Internal",
                "details": {
                    "kind": "SerializationFailed",
                    "message": format!("Failed to serialize error: {}", e)
                },
                "message": error_message
            })
            .to_string(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for AppError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        AppError::Db(crate::db::StoreError::LockError(
            t!("db.failed_to_lock_main_store", error = err.to_string()).to_string(),
        ))
    }
}

/// A universal Result type for UI-facing operations and other fallible functions.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StoreError;
    use crate::webhook::WebhookError;

    #[test]
    fn test_error_renders_module_and_message() {
        let error = AppError::from(StoreError::NotFound("flow 3 not found".into()));
        let rendered: String = error.into();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["module"], "Db");
        assert_eq!(value["details"]["kind"], "notFound");
        assert_eq!(value["message"], "flow 3 not found");
    }

    #[test]
    fn test_delivery_failure_serializes_status() {
        let error = AppError::from(WebhookError::DeliveryFailed {
            status: 502,
            body: "bad gateway".into(),
        });
        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(value["module"], "Webhook");
        assert_eq!(value["details"]["kind"], "deliveryFailed");
        assert_eq!(value["details"]["message"]["status"], 502);
    }
}
