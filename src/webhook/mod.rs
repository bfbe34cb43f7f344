//! Webhook dispatch for flows, agent chat and voice messages.
//!
//! Dispatch only reads the store. Store guards are released before any
//! request is awaited.

pub mod agent;
pub mod error;
pub mod flow;
pub mod page;
pub mod payload;
pub mod voice;

use rust_i18n::t;
use serde::Serialize;
use std::sync::{Arc, RwLock};

use crate::constants::{CFG_WEBHOOK_TIMEOUT_SECS, DEFAULT_WEBHOOK_TIMEOUT_SECS};
use crate::db::{MainStore, StoreError, User};
use crate::http::{HttpClient, WebhookResponse};
use crate::libs::timestamp;

pub use agent::send_chat_message;
pub use error::WebhookError;
pub use flow::execute_flow;
pub use page::{Heading, MetaTag, NoPageContext, PageContextProvider, PageData, StaticPageContext};
pub use payload::{Attachment, VoiceRecording};
pub use voice::send_voice_message;

/// Result of a successful delivery.
#[derive(Debug, Clone, Serialize)]
pub struct Delivery {
    pub message: String,
    pub response: WebhookResponse,
}

/// Builds an HTTP client honoring the `webhook_timeout_secs` setting.
pub fn client_from_store(store: &Arc<RwLock<MainStore>>) -> Result<HttpClient, WebhookError> {
    let timeout = with_store(store, |s| {
        Ok(s.get_config(CFG_WEBHOOK_TIMEOUT_SECS, DEFAULT_WEBHOOK_TIMEOUT_SECS))
    })?;
    Ok(HttpClient::with_timeout(timeout)?)
}

/// Runs `f` under a read lock of the store.
pub(crate) fn with_store<T>(
    store: &Arc<RwLock<MainStore>>,
    f: impl FnOnce(&MainStore) -> Result<T, WebhookError>,
) -> Result<T, WebhookError> {
    let guard = store.read().map_err(|e| {
        StoreError::LockError(t!("db.failed_to_lock_main_store", error = e.to_string()).to_string())
    })?;
    f(&guard)
}

pub(crate) fn require_user(store: &MainStore) -> Result<User, WebhookError> {
    store.get_user()?.ok_or(WebhookError::UserMissing)
}

pub(crate) fn not_found(entity: &str, id: i64) -> WebhookError {
    WebhookError::NotFound(t!("db.row_not_found", entity = entity, id = id).to_string())
}

/// Turns a non-2xx response into `DeliveryFailed`.
pub(crate) fn ensure_delivered(response: WebhookResponse) -> Result<WebhookResponse, WebhookError> {
    if response.is_success() {
        Ok(response)
    } else {
        log::warn!("Webhook responded with status {}", response.status);
        Err(WebhookError::DeliveryFailed {
            status: response.status,
            body: response.body.as_text(),
        })
    }
}

pub(crate) fn now_iso() -> String {
    timestamp::to_iso(&timestamp::now())
}
