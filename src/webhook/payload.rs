use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

use super::page::PageData;
use crate::constants::{EXTENSION_VERSION, PAYLOAD_SOURCE};
use crate::db::{Prompt, User};

/// User profile fields flattened into every payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFields {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_mission: Option<String>,
}

impl From<&User> for UserFields {
    fn from(user: &User) -> Self {
        Self {
            user_id: user
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            user_name: user.name.clone(),
            user_email: user.email.clone(),
            user_url: user.url.clone(),
            user_mission: user.mission_statement.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptPayload {
    pub name: String,
    pub system_prompt: String,
    pub user_prompt: String,
}

impl From<&Prompt> for PromptPayload {
    fn from(prompt: &Prompt) -> Self {
        Self {
            name: prompt.name.clone(),
            system_prompt: prompt.system_prompt.clone(),
            user_prompt: prompt.user_prompt.clone(),
        }
    }
}

/// Body posted when a flow runs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowPayload {
    #[serde(flatten)]
    pub user: UserFields,
    /// The flow's uuid
    pub flow_id: String,
    pub flow_name: String,
    pub page_data: PageData,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<PromptPayload>,
}

/// A file attached to a chat message.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentFile {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: usize,
    /// Base64 encoded content
    pub data: String,
}

impl From<&Attachment> for AttachmentFile {
    fn from(attachment: &Attachment) -> Self {
        Self {
            name: attachment.name.clone(),
            mime_type: attachment.mime_type.clone(),
            size: attachment.data.len(),
            data: STANDARD.encode(&attachment.data),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachments {
    pub count: usize,
    pub files: Vec<AttachmentFile>,
}

/// Body posted when the user chats with an agent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPayload {
    #[serde(flatten)]
    pub user: UserFields,
    pub agent_id: i64,
    pub agent_name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_data: Option<PageData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Attachments>,
    pub timestamp: String,
    pub source: String,
    pub version: String,
    pub binary_files_available: bool,
}

impl AgentPayload {
    pub fn new(
        user: &User,
        agent_id: i64,
        agent_name: &str,
        message: &str,
        page_data: Option<PageData>,
        attachments: &[Attachment],
        timestamp: String,
    ) -> Self {
        let attachments = if attachments.is_empty() {
            None
        } else {
            Some(Attachments {
                count: attachments.len(),
                files: attachments.iter().map(AttachmentFile::from).collect(),
            })
        };
        Self {
            user: user.into(),
            agent_id,
            agent_name: agent_name.to_string(),
            message: message.to_string(),
            page_data,
            binary_files_available: attachments.is_some(),
            attachments,
            timestamp,
            source: PAYLOAD_SOURCE.to_string(),
            version: EXTENSION_VERSION.to_string(),
        }
    }
}

/// A finished voice recording.
#[derive(Debug, Clone)]
pub struct VoiceRecording {
    pub data: Vec<u8>,
    /// Container format used as file extension, e.g. `webm`
    pub format: String,
    pub mime_type: String,
    /// Length in seconds
    pub duration: Option<f64>,
    pub sample_rate: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioMetadata {
    /// Base64 copy of the audio, kept alongside the binary part
    pub data: String,
    pub mime_type: String,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    pub size: usize,
    pub filename: String,
}

/// Metadata part of a voice message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoicePayload {
    #[serde(flatten)]
    pub user: UserFields,
    pub channel_id: i64,
    pub channel_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_data: Option<PageData>,
    pub audio: AudioMetadata,
    pub timestamp: String,
    pub source: String,
    pub version: String,
    pub binary_audio_available: bool,
}

/// `voice_message_<timestamp>.<format>`, with `:` and `.` in the timestamp replaced by `-`.
pub fn voice_filename(timestamp: &str, format: &str) -> String {
    format!(
        "voice_message_{}.{}",
        timestamp.replace([':', '.'], "-"),
        format
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::test_user;
    use serde_json::json;

    fn page() -> PageData {
        PageData {
            url: "https://example.com/article".into(),
            title: "Article".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_user_fields_flatten_and_skip_missing() {
        let mut user = test_user();
        user.id = Some(1);
        user.url = None;
        let value = serde_json::to_value(UserFields::from(&user)).unwrap();
        assert_eq!(
            value,
            json!({
                "userId": "1",
                "userName": "Ada",
                "userEmail": "ada@example.com",
                "userMission": "Ship it"
            })
        );

        user.id = None;
        assert_eq!(UserFields::from(&user).user_id, "unknown");
    }

    #[test]
    fn test_flow_payload_shape() {
        let payload = FlowPayload {
            user: (&test_user()).into(),
            flow_id: "f-uuid".into(),
            flow_name: "Summarize".into(),
            page_data: page(),
            timestamp: "2024-05-01T10:00:00.000Z".into(),
            prompt: None,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["flowId"], "f-uuid");
        assert_eq!(value["userName"], "Ada");
        assert_eq!(value["pageData"]["url"], "https://example.com/article");
        assert_eq!(value["pageData"]["metaTags"], json!([]));
        assert!(value.get("prompt").is_none());
        assert!(value["pageData"].get("selectedText").is_none());
    }

    #[test]
    fn test_agent_payload_attachments() {
        let attachment = Attachment {
            name: "a.txt".into(),
            mime_type: "text/plain".into(),
            data: b"hi".to_vec(),
        };
        let payload = AgentPayload::new(
            &test_user(),
            3,
            "Researcher",
            "hello",
            None,
            &[attachment],
            "2024-05-01T10:00:00.000Z".into(),
        );
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["binaryFilesAvailable"], true);
        assert_eq!(value["source"], PAYLOAD_SOURCE);
        assert_eq!(value["version"], EXTENSION_VERSION);
        assert_eq!(
            value["attachments"],
            json!({"count": 1, "files": [{"name": "a.txt", "type": "text/plain", "size": 2, "data": "aGk="}]})
        );
        assert!(value.get("pageData").is_none());

        let plain = AgentPayload::new(&test_user(), 3, "Researcher", "hello", None, &[], "t".into());
        let value = serde_json::to_value(&plain).unwrap();
        assert_eq!(value["binaryFilesAvailable"], false);
        assert!(value.get("attachments").is_none());
    }

    #[test]
    fn test_voice_filename() {
        assert_eq!(
            voice_filename("2024-05-01T10:00:00.123Z", "webm"),
            "voice_message_2024-05-01T10-00-00-123Z.webm"
        );
    }
}
