//! HTTP client used to deliver webhook payloads.
//!
//! Requests are sent once; there is no retry. Any status is returned to the
//! caller, which decides what counts as a failed delivery.

use reqwest::multipart::{Form, Part};
use rust_i18n::t;
use serde::Serialize;
use std::{collections::HashMap, time::Duration};

use super::{
    error::{HttpError, HttpResult},
    types::{FormPart, ResponseBody, WebhookResponse},
};
use crate::constants::DEFAULT_WEBHOOK_TIMEOUT_SECS;

/// HTTP client for posting to webhooks
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Creates a new HTTP client with the default timeout
    pub fn new() -> HttpResult<Self> {
        Self::with_timeout(DEFAULT_WEBHOOK_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client whose requests time out after `timeout_secs`
    pub fn with_timeout(timeout_secs: u64) -> HttpResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self { client })
    }

    /// Posts `payload` as a JSON body
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        payload: &T,
    ) -> HttpResult<WebhookResponse> {
        log::debug!("POST {} (json)", url);
        let response = self.client.post(url).json(payload).send().await?;
        Self::read_response(response).await
    }

    /// Posts `parts` as a `multipart/form-data` body
    pub async fn post_multipart(
        &self,
        url: &str,
        parts: Vec<FormPart>,
    ) -> HttpResult<WebhookResponse> {
        log::debug!("POST {} (multipart, {} parts)", url, parts.len());
        let mut form = Form::new();
        for part in parts {
            form = match part {
                FormPart::Text { name, value } => form.text(name, value),
                FormPart::Json { name, body } => {
                    let part = Part::text(body).mime_str("application/json").map_err(|e| {
                        HttpError::Request(
                            t!("http.mime_parse_failed", error = e.to_string()).to_string(),
                        )
                    })?;
                    form.part(name, part)
                }
                FormPart::File {
                    name,
                    filename,
                    mime_type,
                    data,
                } => {
                    let part = Part::bytes(data)
                        .file_name(filename)
                        .mime_str(&mime_type)
                        .map_err(|e| {
                            HttpError::Request(
                                t!("http.mime_parse_failed", error = e.to_string()).to_string(),
                            )
                        })?;
                    form.part(name, part)
                }
            };
        }

        let response = self.client.post(url).multipart(form).send().await?;
        Self::read_response(response).await
    }

    async fn read_response(response: reqwest::Response) -> HttpResult<WebhookResponse> {
        let status = response.status().as_u16();
        let headers = Self::extract_headers(response.headers());

        let text = response.text().await.map_err(|e| {
            HttpError::Response(t!("http.read_response_failed", error = e.to_string()).to_string())
        })?;
        let body = ResponseBody::decode(headers.get("content-type").map(String::as_str), text);

        log::debug!("Webhook responded with status {}", status);
        Ok(WebhookResponse {
            status,
            headers,
            body,
        })
    }

    /// Extracts headers from reqwest::HeaderMap into a HashMap
    fn extract_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::WebhookReceiver;
    use serde_json::json;

    #[tokio::test]
    async fn test_post_json() {
        let receiver = WebhookReceiver::start(200, "application/json", r#"{"received":true}"#).await;
        let client = HttpClient::new().unwrap();

        let response = client
            .post_json(&receiver.url(), &json!({"hello": "world"}))
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(response.body, ResponseBody::Json(json!({"received": true})));

        let requests = receiver.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].content_type.starts_with("application/json"));
        assert_eq!(requests[0].json(), json!({"hello": "world"}));
    }

    #[tokio::test]
    async fn test_post_multipart() {
        let receiver = WebhookReceiver::start(201, "text/plain", "stored").await;
        let client = HttpClient::new().unwrap();

        let response = client
            .post_multipart(
                &receiver.url(),
                vec![
                    FormPart::json("metadata", r#"{"a":1}"#),
                    FormPart::text("userName", "Ada"),
                    FormPart::file("file0", "notes.txt", "text/plain", b"hello file".to_vec()),
                ],
            )
            .await
            .unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(response.body, ResponseBody::Text("stored".into()));

        let request = &receiver.requests()[0];
        assert!(request.content_type.starts_with("multipart/form-data"));
        let body = request.text();
        assert!(body.contains(r#"name="metadata""#));
        assert!(body.contains("application/json"));
        assert!(body.contains(r#"name="userName""#));
        assert!(body.contains(r#"name="file0"; filename="notes.txt""#));
        assert!(body.contains("hello file"));
    }

    #[tokio::test]
    async fn test_error_status_is_returned() {
        let receiver = WebhookReceiver::start(500, "text/plain", "boom").await;
        let client = HttpClient::new().unwrap();

        let response = client.post_json(&receiver.url(), &json!({})).await.unwrap();
        assert!(!response.is_success());
        assert_eq!(response.body.as_text(), "boom");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_request_error() {
        let client = HttpClient::with_timeout(2).unwrap();
        // port 9 (discard) is almost never listening
        let result = client.post_json("http://127.0.0.1:9/", &json!({})).await;
        assert!(matches!(result, Err(HttpError::Request(_))));
    }
}
