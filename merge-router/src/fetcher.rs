//! Read-path backend fetches.
//!
//! A failed fetch never fails the read path: the backend simply contributes
//! an empty document to the merge.

use crate::errors::GatewayError;
use crate::metrics_defs::BACKEND_FETCH_FAILURES;
use serde_json::{Map, Value as JsonValue};
use shared::counter;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Why a fetch fell back to the empty document
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("error fetching: {0}")]
    Request(#[source] reqwest::Error),

    #[error("error reading body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("error parsing body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    fn reason(&self) -> &'static str {
        match self {
            FetchError::Request(e) if e.is_timeout() => "timeout",
            FetchError::Request(_) => "request",
            FetchError::Body(_) => "body",
            FetchError::Decode(_) => "decode",
        }
    }
}

/// Retrieves JSON object documents from a backend.
///
/// Each fetcher owns its client, so the timeout of one backend is enforced
/// independently of the other.
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    /// `timeout` bounds the whole exchange, body included.
    pub fn new(timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Fetches the document at `url`, or `{}` if anything goes wrong.
    pub async fn fetch(&self, url: &Url) -> JsonValue {
        match self.try_fetch(url).await {
            Ok(document) => JsonValue::Object(document),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "backend fetch failed, using empty document");
                counter!(BACKEND_FETCH_FAILURES, "reason" => e.reason()).increment(1);
                JsonValue::Object(Map::new())
            }
        }
    }

    /// The status code is not checked: error pages are decoded like any other
    /// body and only count as failures if they are not a JSON object.
    async fn try_fetch(&self, url: &Url) -> Result<Map<String, JsonValue>, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::Request)?;

        let body = response.bytes().await.map_err(FetchError::Body)?;

        Ok(serde_json::from_slice(&body)?)
    }
}
