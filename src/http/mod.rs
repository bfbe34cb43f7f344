pub mod client;
pub mod error;
pub mod types;

pub use client::HttpClient;
pub use error::{HttpError, HttpResult};
pub use types::{FormPart, ResponseBody, WebhookResponse};
