//!
//! UI-facing operations.
//!
//! Every operation reports back with an [`ActionResult`]: failures carry the
//! error's message instead of propagating, so the side panel can show them
//! as they are.
//!

pub mod import_export;
pub mod webhook;

use serde::{Deserialize, Serialize};

use crate::http::ResponseBody;

/// Structured success/failure result shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    /// Body returned by the webhook, when there is one to show
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseBody>,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            response: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            response: None,
        }
    }

    pub fn with_response(mut self, response: ResponseBody) -> Self {
        self.response = Some(response);
        self
    }
}

impl<E: std::fmt::Display> From<Result<String, E>> for ActionResult {
    fn from(result: Result<String, E>) -> Self {
        match result {
            Ok(message) => ActionResult::ok(message),
            Err(e) => {
                log::error!("{}", e);
                ActionResult::fail(e.to_string())
            }
        }
    }
}
