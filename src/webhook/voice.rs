use base64::{engine::general_purpose::STANDARD, Engine as _};
use rust_i18n::t;
use std::sync::{Arc, RwLock};

use super::payload::{voice_filename, AudioMetadata, VoicePayload, VoiceRecording};
use super::{
    ensure_delivered, not_found, now_iso, require_user, with_store, Delivery, PageContextProvider,
    WebhookError,
};
use crate::constants::{EXTENSION_VERSION, PAYLOAD_SOURCE};
use crate::db::{MainStore, StoreError};
use crate::http::{FormPart, HttpClient};

/// Posts a voice recording to a voice channel's webhook.
///
/// The body is always multipart: the binary `audio` part, a JSON `metadata`
/// part and the user's profile as plain fields.
pub async fn send_voice_message(
    store: &Arc<RwLock<MainStore>>,
    channel_id: i64,
    recording: VoiceRecording,
    provider: &dyn PageContextProvider,
    client: &HttpClient,
) -> Result<Delivery, WebhookError> {
    let (channel, user) = with_store(store, |s| {
        let channel = s
            .get_voice_channel_by_id(channel_id)?
            .ok_or_else(|| not_found("voice channel", channel_id))?;
        Ok((channel, require_user(s)?))
    })?;

    let page_data = match provider.extract_page_data().await {
        Ok(page) => Some(page),
        Err(e) => {
            log::info!("Sending voice message without page data: {}", e);
            None
        }
    };

    let timestamp = now_iso();
    let filename = voice_filename(&timestamp, &recording.format);
    let payload = VoicePayload {
        user: (&user).into(),
        channel_id: channel.id,
        channel_name: channel.name.clone(),
        page_data,
        audio: AudioMetadata {
            data: STANDARD.encode(&recording.data),
            mime_type: recording.mime_type.clone(),
            format: recording.format.clone(),
            sample_rate: recording.sample_rate,
            duration: recording.duration,
            size: recording.data.len(),
            filename: filename.clone(),
        },
        timestamp,
        source: PAYLOAD_SOURCE.to_string(),
        version: EXTENSION_VERSION.to_string(),
        binary_audio_available: true,
    };
    let metadata = serde_json::to_string(&payload).map_err(StoreError::from)?;

    let parts = vec![
        FormPart::file("audio", filename, recording.mime_type, recording.data),
        FormPart::json("metadata", metadata),
        FormPart::text("userName", user.name.clone()),
        FormPart::text("userEmail", user.email.clone()),
        FormPart::text("userUrl", user.url.clone().unwrap_or_default()),
        FormPart::text(
            "userMission",
            user.mission_statement.clone().unwrap_or_default(),
        ),
        FormPart::text("userId", payload.user.user_id.clone()),
    ];

    log::info!(
        "Sending voice message to channel {} -> {}",
        channel.name,
        channel.webhook_url
    );
    let response = ensure_delivered(client.post_multipart(&channel.webhook_url, parts).await?)?;

    Ok(Delivery {
        message: t!("webhook.voice_sent", name = channel.name).to_string(),
        response,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::VoiceChannelPatch;
    use crate::test::{memory_store, seed_store, WebhookReceiver};
    use crate::webhook::page::NoPageContext;

    fn recording() -> VoiceRecording {
        VoiceRecording {
            data: b"RIFFfakeaudio".to_vec(),
            format: "webm".into(),
            mime_type: "audio/webm".into(),
            duration: Some(2.5),
            sample_rate: Some(48000),
        }
    }

    fn store_with_channel(url: &str) -> (Arc<RwLock<MainStore>>, i64) {
        let mut store = memory_store();
        let ids = seed_store(&mut store);
        store
            .update_voice_channel(
                ids.voice_channel,
                VoiceChannelPatch {
                    webhook_url: Some(url.to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        (Arc::new(RwLock::new(store)), ids.voice_channel)
    }

    #[tokio::test]
    async fn test_voice_message_is_multipart() {
        let receiver = WebhookReceiver::start(200, "text/plain", "got it").await;
        let (store, channel_id) = store_with_channel(&receiver.url());

        send_voice_message(
            &store,
            channel_id,
            recording(),
            &NoPageContext,
            &HttpClient::new().unwrap(),
        )
        .await
        .unwrap();

        let request = &receiver.requests()[0];
        assert!(request.content_type.starts_with("multipart/form-data"));
        let body = request.text();
        assert!(body.contains(r#"name="audio"; filename="voice_message_"#));
        assert!(body.contains(".webm\""));
        assert!(body.contains("RIFFfakeaudio"));
        assert!(body.contains(r#"name="metadata""#));
        assert!(body.contains(r#""binaryAudioAvailable":true"#));
        assert!(body.contains(r#""sampleRate":48000"#));
        assert!(body.contains(&format!(r#""data":"{}""#, STANDARD.encode(b"RIFFfakeaudio"))));
        assert!(body.contains(r#"name="userName""#));
        assert!(body.contains(r#"name="userMission""#));
        assert!(body.contains("Ship it"));
    }

    #[tokio::test]
    async fn test_voice_failures() {
        let receiver = WebhookReceiver::start(400, "text/plain", "bad audio").await;
        let (store, channel_id) = store_with_channel(&receiver.url());
        let client = HttpClient::new().unwrap();

        match send_voice_message(&store, channel_id, recording(), &NoPageContext, &client).await {
            Err(WebhookError::DeliveryFailed { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad audio");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(
            send_voice_message(&store, channel_id + 1, recording(), &NoPageContext, &client).await,
            Err(WebhookError::NotFound(_))
        ));
    }
}
