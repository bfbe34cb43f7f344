use rust_i18n::t;
use std::sync::{Arc, RwLock};

use super::payload::{FlowPayload, PromptPayload};
use super::{
    ensure_delivered, not_found, now_iso, require_user, with_store, Delivery, PageContextProvider,
    WebhookError,
};
use crate::db::MainStore;
use crate::http::HttpClient;

/// Runs a flow: posts the current page, the user profile and the flow's
/// prompt (if it still exists) to the flow's webhook as JSON.
///
/// Page data is required; extraction failures abort the run.
pub async fn execute_flow(
    store: &Arc<RwLock<MainStore>>,
    flow_id: i64,
    provider: &dyn PageContextProvider,
    client: &HttpClient,
) -> Result<Delivery, WebhookError> {
    let (flow, user, prompt) = with_store(store, |s| {
        let flow = s
            .get_flow_by_id(flow_id)?
            .ok_or_else(|| not_found("flow", flow_id))?;
        let user = require_user(s)?;
        // a prompt id left behind by a deleted prompt is ignored
        let prompt = match flow.prompt_id {
            Some(prompt_id) => s.get_prompt_by_id(prompt_id)?,
            None => None,
        };
        Ok((flow, user, prompt))
    })?;

    let page_data = provider.extract_page_data().await?;

    let payload = FlowPayload {
        user: (&user).into(),
        flow_id: flow.uuid.clone(),
        flow_name: flow.name.clone(),
        page_data,
        timestamp: now_iso(),
        prompt: prompt.as_ref().map(PromptPayload::from),
    };

    log::info!("Executing flow {} -> {}", flow.name, flow.webhook_url);
    let response = ensure_delivered(client.post_json(&flow.webhook_url, &payload).await?)?;

    Ok(Delivery {
        message: t!(
            "webhook.flow_executed",
            name = flow.name,
            url = flow.webhook_url
        )
        .to_string(),
        response,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{FlowPatch, NewFlow};
    use crate::test::{memory_store, seed_store, WebhookReceiver};
    use crate::webhook::page::{NoPageContext, PageData, StaticPageContext};

    fn page() -> StaticPageContext {
        StaticPageContext(PageData {
            url: "https://example.com/post".into(),
            title: "A post".into(),
            paragraphs: vec!["First paragraph".into()],
            selected_text: Some("highlight".into()),
            ..Default::default()
        })
    }

    fn store_with_flow(url: &str) -> (Arc<RwLock<MainStore>>, i64) {
        let mut store = memory_store();
        let ids = seed_store(&mut store);
        store
            .update_flow(
                ids.flow,
                FlowPatch {
                    webhook_url: Some(url.to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        (Arc::new(RwLock::new(store)), ids.flow)
    }

    #[tokio::test]
    async fn test_execute_flow_posts_payload_with_prompt() {
        let receiver = WebhookReceiver::start(200, "text/plain", "ok").await;
        let (store, flow_id) = store_with_flow(&receiver.url());
        let client = HttpClient::new().unwrap();

        let delivery = execute_flow(&store, flow_id, &page(), &client).await.unwrap();
        assert_eq!(delivery.response.status, 200);

        let body = receiver.requests()[0].json();
        let flow = store.read().unwrap().get_flow_by_id(flow_id).unwrap().unwrap();
        assert_eq!(body["flowId"], flow.uuid.as_str());
        assert_eq!(body["flowName"], "Summarize page");
        assert_eq!(body["userEmail"], "ada@example.com");
        assert_eq!(body["pageData"]["selectedText"], "highlight");
        assert_eq!(body["prompt"]["systemPrompt"], "You summarize web pages");
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_dangling_prompt_is_skipped() {
        let receiver = WebhookReceiver::start(200, "text/plain", "ok").await;
        let (store, flow_id) = store_with_flow(&receiver.url());
        {
            let mut s = store.write().unwrap();
            let prompt_id = s.get_flow_by_id(flow_id).unwrap().unwrap().prompt_id.unwrap();
            s.delete_prompt(prompt_id).unwrap();
        }

        execute_flow(&store, flow_id, &page(), &HttpClient::new().unwrap())
            .await
            .unwrap();
        let body = receiver.requests()[0].json();
        assert!(body.get("prompt").is_none());
    }

    #[tokio::test]
    async fn test_non_success_status_is_delivery_failure() {
        let receiver = WebhookReceiver::start(404, "text/plain", "no such hook").await;
        let (store, flow_id) = store_with_flow(&receiver.url());

        let result = execute_flow(&store, flow_id, &page(), &HttpClient::new().unwrap()).await;
        match result {
            Err(WebhookError::DeliveryFailed { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "no such hook");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_page_or_user_or_flow() {
        let receiver = WebhookReceiver::start(200, "text/plain", "ok").await;
        let (store, flow_id) = store_with_flow(&receiver.url());
        let client = HttpClient::new().unwrap();

        assert!(matches!(
            execute_flow(&store, flow_id, &NoPageContext, &client).await,
            Err(WebhookError::PageContext(_))
        ));
        assert!(matches!(
            execute_flow(&store, flow_id + 100, &page(), &client).await,
            Err(WebhookError::NotFound(_))
        ));

        let mut bare = memory_store();
        let category = bare
            .create_category(crate::db::NewCategory {
                name: "c".into(),
                description: None,
            })
            .unwrap();
        let flow = bare
            .create_flow(NewFlow {
                name: "f".into(),
                webhook_url: receiver.url(),
                category_id: category,
                ..Default::default()
            })
            .unwrap();
        let bare = Arc::new(RwLock::new(bare));
        assert!(matches!(
            execute_flow(&bare, flow, &page(), &client).await,
            Err(WebhookError::UserMissing)
        ));
        assert!(receiver.requests().is_empty());
    }
}
