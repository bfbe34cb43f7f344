use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One part of a `multipart/form-data` body
#[derive(Debug, Clone)]
pub enum FormPart {
    /// Plain text field
    Text { name: String, value: String },
    /// JSON document sent with an `application/json` part type
    Json { name: String, body: String },
    /// Binary file field
    File {
        name: String,
        filename: String,
        mime_type: String,
        data: Vec<u8>,
    },
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        FormPart::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn json(name: impl Into<String>, body: impl Into<String>) -> Self {
        FormPart::Json {
            name: name.into(),
            body: body.into(),
        }
    }

    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        FormPart::File {
            name: name.into(),
            filename: filename.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FormPart::Text { name, .. } | FormPart::Json { name, .. } | FormPart::File { name, .. } => {
                name
            }
        }
    }
}

/// Body returned by a webhook, decoded according to its content type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    /// Decodes `body` as JSON when the content type says so, falling back to text.
    pub fn decode(content_type: Option<&str>, body: String) -> Self {
        let is_json = content_type
            .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
            .unwrap_or(false);
        if is_json {
            match serde_json::from_str(&body) {
                Ok(value) => return ResponseBody::Json(value),
                Err(e) => log::warn!("Webhook declared JSON but sent invalid JSON: {}", e),
            }
        }
        ResponseBody::Text(body)
    }

    pub fn as_text(&self) -> String {
        match self {
            ResponseBody::Json(value) => value.to_string(),
            ResponseBody::Text(text) => text.clone(),
        }
    }
}

/// Response of a webhook call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    /// Response status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response body
    pub body: ResponseBody,
}

impl WebhookResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_json_and_text() {
        assert_eq!(
            ResponseBody::decode(Some("application/json; charset=utf-8"), r#"{"ok":true}"#.into()),
            ResponseBody::Json(json!({"ok": true}))
        );
        assert_eq!(
            ResponseBody::decode(Some("text/plain"), r#"{"ok":true}"#.into()),
            ResponseBody::Text(r#"{"ok":true}"#.into())
        );
        assert_eq!(
            ResponseBody::decode(Some("application/json"), "not json".into()),
            ResponseBody::Text("not json".into())
        );
        assert_eq!(
            ResponseBody::decode(None, "".into()),
            ResponseBody::Text("".into())
        );
    }
}
