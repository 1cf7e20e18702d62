use crate::errors::GatewayError;
use crate::fetcher::Fetcher;
use crate::handler::{HandlerBody, RequestBody, RouteHandler};
use crate::merger::merge;
use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Request, Response, StatusCode};
use serde_json::Value as JsonValue;
use shared::http::make_text_response;
use std::time::Duration;
use url::Url;

/// One read source: where it lives and the fetcher dedicated to it.
struct Source {
    url: Url,
    fetcher: Fetcher,
}

/// Handler that fans a read out to both backends and serves the merged
/// document
///
/// The secondary document is the base and the primary document the overlay,
/// so the primary wins conflicts. An unavailable backend contributes `{}`.
pub struct FanOutHandler {
    primary: Source,
    secondary: Source,
}

impl FanOutHandler {
    pub fn new(primary: Url, secondary: Url, timeout: Duration) -> Result<Self, GatewayError> {
        Ok(Self {
            primary: Source {
                url: primary,
                fetcher: Fetcher::new(timeout)?,
            },
            secondary: Source {
                url: secondary,
                fetcher: Fetcher::new(timeout)?,
            },
        })
    }

    /// Fetches both documents concurrently and merges them.
    pub async fn merged_document(&self) -> JsonValue {
        let (primary, secondary) = tokio::join!(
            self.primary.fetcher.fetch(&self.primary.url),
            self.secondary.fetcher.fetch(&self.secondary.url),
        );

        merge(secondary, primary)
    }
}

/// Serializes `document` as a newline terminated JSON body.
pub fn json_response(document: &JsonValue) -> Result<Response<HandlerBody>, GatewayError> {
    let mut bytes = serde_json::to_vec(document)
        .map_err(|e| GatewayError::ResponseSerializationError(e.to_string()))?;
    bytes.push(b'\n');

    let mut response = Response::new(
        Full::new(Bytes::from(bytes))
            .map_err(|never| match never {})
            .boxed_unsync(),
    );
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Ok(response)
}

#[async_trait]
impl RouteHandler for FanOutHandler {
    async fn handle(&self, _request: Request<RequestBody>) -> Response<HandlerBody> {
        let merged = self.merged_document().await;

        match json_response(&merged) {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "error encoding merged data");
                make_text_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        }
    }

    fn name(&self) -> &'static str {
        "fan_out"
    }
}
