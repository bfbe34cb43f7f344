use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Router,
};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::db::{MainStore, NewAgent, NewCategory, NewFlow, NewPrompt, NewVoiceChannel, User};
use crate::logger::setup_test_logger;

#[small_ctor::ctor]
unsafe fn init() {
    let _ = setup_test_logger();
}

/// Creates a fresh, fully migrated in-memory store.
pub fn memory_store() -> MainStore {
    MainStore::open_in_memory().expect("Failed to create in-memory store")
}

/// Ids of the rows created by [`seed_store`].
#[derive(Debug, Clone, Copy)]
pub struct SeedIds {
    pub category: i64,
    pub flow: i64,
    pub prompt: i64,
    pub voice_channel: i64,
    pub agent: i64,
}

/// Fills `store` with one row of every collection plus a user profile.
///
/// The flow belongs to the "Work" category and uses the seeded prompt.
pub fn seed_store(store: &mut MainStore) -> SeedIds {
    let category = store
        .create_category(NewCategory {
            name: "Work".into(),
            description: Some("Day job".into()),
        })
        .expect("Failed to seed category");
    let prompt = store
        .create_prompt(NewPrompt {
            name: "Summarize".into(),
            system_prompt: "You summarize web pages".into(),
            user_prompt: "Summarize this page".into(),
        })
        .expect("Failed to seed prompt");
    let flow = store
        .create_flow(NewFlow {
            name: "Summarize page".into(),
            description: None,
            webhook_url: "https://hooks.example.com/flow".into(),
            category_id: category,
            prompt_id: Some(prompt),
        })
        .expect("Failed to seed flow");
    let voice_channel = store
        .create_voice_channel(NewVoiceChannel {
            name: "Standup".into(),
            webhook_url: "https://hooks.example.com/voice".into(),
        })
        .expect("Failed to seed voice channel");
    let agent = store
        .create_agent(NewAgent {
            name: "Researcher".into(),
            description: None,
            webhook_url: "https://hooks.example.com/agent".into(),
        })
        .expect("Failed to seed agent");
    store
        .save_user(&test_user())
        .expect("Failed to seed user");

    SeedIds {
        category,
        flow,
        prompt,
        voice_channel,
        agent,
    }
}

pub fn test_user() -> User {
    User {
        id: None,
        name: "Ada".into(),
        email: "ada@example.com".into(),
        url: Some("https://ada.example.com".into()),
        mission_statement: Some("Ship it".into()),
    }
}

/// A request captured by [`WebhookReceiver`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub content_type: String,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is not JSON")
    }
}

#[derive(Clone)]
struct ReceiverState {
    status: u16,
    content_type: String,
    reply: String,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

/// A local webhook endpoint that records every request and answers with a fixed response.
pub struct WebhookReceiver {
    addr: std::net::SocketAddr,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

async fn receive(
    State(state): State<ReceiverState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, [(header::HeaderName, String); 1], String) {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.captured.lock().push(CapturedRequest {
        content_type,
        body: body.to_vec(),
    });
    (
        StatusCode::from_u16(state.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        [(header::CONTENT_TYPE, state.content_type.clone())],
        state.reply.clone(),
    )
}

impl WebhookReceiver {
    pub async fn start(status: u16, content_type: &str, reply: &str) -> Self {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let state = ReceiverState {
            status,
            content_type: content_type.to_string(),
            reply: reply.to_string(),
            captured: captured.clone(),
        };
        let app = Router::new()
            .route("/hook", post(receive))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind webhook receiver");
        let addr = listener.local_addr().expect("Failed to read receiver address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, captured }
    }

    pub fn url(&self) -> String {
        format!("http://{}/hook", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().clone()
    }
}
