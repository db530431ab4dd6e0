//! HTTP plumbing for portal calls.
//!
//! [`HttpClient`] is the seam between request building and the transport, so
//! header-injecting wrappers like [`TokenHeader`] can be stacked on top of
//! [`BasicClient`].

pub mod auth;
mod basic;

pub use auth::TokenHeader;
pub use basic::BasicClient;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request, Response, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::services::SemsError;

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

/// POSTs `body` as JSON and decodes the JSON reply.
///
/// Non-2xx statuses become [`SemsError::Status`] carrying the response body.
pub async fn post_json<C, B>(client: &C, url: &str, body: &B) -> Result<Value, SemsError>
where
    C: HttpClient + ?Sized,
    B: Serialize + ?Sized,
{
    let url = Url::parse(url).map_err(|e| SemsError::InvalidUrl(format!("{url}: {e}")))?;
    let payload = serde_json::to_vec(body).map_err(|e| SemsError::Decode(e.to_string()))?;

    let mut req = Request::new(Method::POST, url);
    req.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    req.headers_mut()
        .insert(ACCEPT, HeaderValue::from_static("*/*"));
    *req.body_mut() = Some(payload.into());

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(SemsError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = resp.bytes().await?;
    debug!(bytes = bytes.len(), "Response received");
    serde_json::from_slice(&bytes).map_err(|e| SemsError::Decode(e.to_string()))
}
