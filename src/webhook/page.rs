//! Page context attached to outgoing payloads.
//!
//! Extraction itself happens outside this crate (a browser content script,
//! a scraper, a test fixture); dispatch only asks a [`PageContextProvider`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::WebhookError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaTag {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    /// Tag name, e.g. `h1`
    pub level: String,
    pub text: String,
}

/// Structured content of the page the user is looking at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub meta_tags: Vec<MetaTag>,
    #[serde(default)]
    pub headings: Vec<Heading>,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_text: Option<String>,
}

/// Source of page data for the active page.
#[async_trait]
pub trait PageContextProvider: Send + Sync {
    async fn extract_page_data(&self) -> Result<PageData, WebhookError>;
}

/// Provider returning a fixed page.
pub struct StaticPageContext(pub PageData);

#[async_trait]
impl PageContextProvider for StaticPageContext {
    async fn extract_page_data(&self) -> Result<PageData, WebhookError> {
        Ok(self.0.clone())
    }
}

/// Provider used when no page is available, e.g. outside a browser tab.
pub struct NoPageContext;

#[async_trait]
impl PageContextProvider for NoPageContext {
    async fn extract_page_data(&self) -> Result<PageData, WebhookError> {
        Err(WebhookError::PageContext(
            rust_i18n::t!("webhook.no_active_page").to_string(),
        ))
    }
}
