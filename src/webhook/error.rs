use rust_i18n::t;
use serde::Serialize;
use thiserror::Error;

use crate::db::StoreError;
use crate::http::HttpError;

/// Errors raised while dispatching a payload to a webhook.
#[derive(Error, Debug, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "camelCase")]
pub enum WebhookError {
    /// The flow, agent or voice channel does not exist.
    #[error("{0}")]
    NotFound(String),

    /// No user profile has been saved yet.
    #[error("{}", t!("webhook.user_missing"))]
    UserMissing,

    /// Page data could not be extracted.
    #[error("{}", t!("webhook.page_context_failed", error = _0))]
    PageContext(String),

    /// The webhook answered with a non-2xx status.
    #[error("{}", t!("webhook.delivery_failed", status = status, body = body))]
    DeliveryFailed { status: u16, body: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Http(#[from] HttpError),
}
