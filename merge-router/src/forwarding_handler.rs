use crate::errors::GatewayError;
use crate::handler::{HandlerBody, RequestBody, RouteHandler};
use crate::http::{ProxyClient, build_upstream_request, new_proxy_client, send_to_upstream};
use crate::metrics_defs::PROXY_FAILURES;
use async_trait::async_trait;
use http_body_util::BodyExt;
use hyper::{Request, Response};
use shared::counter;
use shared::http::make_text_response;
use std::time::Duration;
use url::Url;

/// Handler that relays write requests to the secondary backend
///
/// The upstream status, headers and body come back to the caller unchanged.
/// Nothing is retried: a failed attempt surfaces as an error response.
pub struct ForwardHandler {
    client: ProxyClient,
    target_url: Url,
    timeout_duration: Duration,
}

impl ForwardHandler {
    pub fn new(target_url: Url) -> Self {
        Self {
            client: new_proxy_client(),
            target_url,
            timeout_duration: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_duration = timeout;
        self
    }

    fn error_response(&self, error: GatewayError, reason: &'static str) -> Response<HandlerBody> {
        tracing::error!(
            target_url = %self.target_url,
            error = %error,
            "error proxying to secondary"
        );
        counter!(PROXY_FAILURES, "reason" => reason).increment(1);
        make_text_response(error.status(), error.to_string())
    }
}

#[async_trait]
impl RouteHandler for ForwardHandler {
    async fn handle(&self, request: Request<RequestBody>) -> Response<HandlerBody> {
        let upstream_request = match build_upstream_request(&self.target_url, request) {
            Ok(upstream_request) => upstream_request,
            Err(e) => return self.error_response(e, "request_build"),
        };

        let response = match send_to_upstream(
            &self.client,
            &self.target_url,
            upstream_request,
            self.timeout_duration,
        )
        .await
        {
            Ok(response) => response,
            Err(e @ GatewayError::UpstreamTimeout(_)) => return self.error_response(e, "timeout"),
            Err(e) => return self.error_response(e, "upstream"),
        };

        // Status and head are committed once this response is returned, so a
        // failure while streaming the body can only be logged.
        let target_url = self.target_url.clone();
        response.map(move |body| {
            body.map_err(move |e| {
                tracing::error!(
                    target_url = %target_url,
                    error = %e,
                    "error copying proxy response body"
                );
                counter!(PROXY_FAILURES, "reason" => "response_body").increment(1);
                e
            })
            .boxed_unsync()
        })
    }

    fn name(&self) -> &'static str {
        "forward"
    }
}
