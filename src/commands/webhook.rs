//!
//! Run flows and send chat or voice messages from the side panel.
//!
//! Each operation builds an HTTP client honoring the `webhook_timeout_secs`
//! setting and reports the outcome as an [`ActionResult`].
//!

use rust_i18n::t;
use std::sync::{Arc, RwLock};

use super::ActionResult;
use crate::db::MainStore;
use crate::webhook::{
    self, client_from_store, Attachment, Delivery, PageContextProvider, VoiceRecording,
    WebhookError,
};

fn report(result: Result<Delivery, WebhookError>, context: &str) -> ActionResult {
    match result {
        Ok(delivery) => ActionResult::ok(delivery.message).with_response(delivery.response.body),
        Err(e) => {
            log::error!("{}: {}", context, e);
            ActionResult::fail(t!("main.action_failed", action = context, error = e.to_string()))
        }
    }
}

/// Runs a flow against the current page.
pub async fn run_flow(
    state: &Arc<RwLock<MainStore>>,
    flow_id: i64,
    provider: &dyn PageContextProvider,
) -> ActionResult {
    let result = match client_from_store(state) {
        Ok(client) => webhook::execute_flow(state, flow_id, provider, &client).await,
        Err(e) => Err(e),
    };
    report(result, &t!("main.executing_flow"))
}

/// Sends a chat message, with optional attachments, to an agent.
pub async fn send_message(
    state: &Arc<RwLock<MainStore>>,
    agent_id: i64,
    message: &str,
    attachments: &[Attachment],
    provider: &dyn PageContextProvider,
) -> ActionResult {
    let result = match client_from_store(state) {
        Ok(client) => {
            webhook::send_chat_message(state, agent_id, message, attachments, provider, &client)
                .await
        }
        Err(e) => Err(e),
    };
    report(result, &t!("main.sending_message"))
}

/// Sends a voice recording to a voice channel.
pub async fn send_voice(
    state: &Arc<RwLock<MainStore>>,
    channel_id: i64,
    recording: VoiceRecording,
    provider: &dyn PageContextProvider,
) -> ActionResult {
    let result = match client_from_store(state) {
        Ok(client) => {
            webhook::send_voice_message(state, channel_id, recording, provider, &client).await
        }
        Err(e) => Err(e),
    };
    report(result, &t!("main.sending_voice_message"))
}
