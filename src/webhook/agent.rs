use rust_i18n::t;
use std::sync::{Arc, RwLock};

use super::payload::{AgentPayload, Attachment};
use super::{
    ensure_delivered, not_found, now_iso, require_user, with_store, Delivery, PageContextProvider,
    WebhookError,
};
use crate::db::MainStore;
use crate::http::{FormPart, HttpClient};

/// Sends a chat message to an agent's webhook.
///
/// Page data is best effort. Without attachments the payload is posted as
/// JSON; with attachments it becomes the `metadata` part of a multipart body
/// next to one `file<N>` part per attachment.
pub async fn send_chat_message(
    store: &Arc<RwLock<MainStore>>,
    agent_id: i64,
    message: &str,
    attachments: &[Attachment],
    provider: &dyn PageContextProvider,
    client: &HttpClient,
) -> Result<Delivery, WebhookError> {
    let (agent, user) = with_store(store, |s| {
        let agent = s
            .get_agent_by_id(agent_id)?
            .ok_or_else(|| not_found("agent", agent_id))?;
        Ok((agent, require_user(s)?))
    })?;

    let page_data = match provider.extract_page_data().await {
        Ok(page) => Some(page),
        Err(e) => {
            log::info!("Sending chat message without page data: {}", e);
            None
        }
    };

    let payload = AgentPayload::new(
        &user,
        agent.id,
        &agent.name,
        message,
        page_data,
        attachments,
        now_iso(),
    );

    log::info!(
        "Sending message to agent {} ({} attachment(s))",
        agent.name,
        attachments.len()
    );
    let response = if attachments.is_empty() {
        client.post_json(&agent.webhook_url, &payload).await?
    } else {
        let mut parts: Vec<FormPart> = attachments
            .iter()
            .enumerate()
            .map(|(index, file)| {
                FormPart::file(
                    format!("file{}", index),
                    file.name.clone(),
                    file.mime_type.clone(),
                    file.data.clone(),
                )
            })
            .collect();
        parts.push(FormPart::json(
            "metadata",
            serde_json::to_string(&payload).map_err(crate::db::StoreError::from)?,
        ));
        client.post_multipart(&agent.webhook_url, parts).await?
    };
    let response = ensure_delivered(response)?;

    Ok(Delivery {
        message: t!("webhook.message_sent", name = agent.name).to_string(),
        response,
    })
}
