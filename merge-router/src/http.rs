use crate::errors::GatewayError;
use crate::handler::RequestBody;
use hyper::body::{Body, Bytes, Frame, Incoming, SizeHint};
use hyper::header::HOST;
use hyper::{Request, Response};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{Instant, Sleep, sleep_until, timeout_at};
use url::Url;

pub type ProxyClient = Client<HttpConnector, RequestBody>;

pub fn new_proxy_client() -> ProxyClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

/// Rebuilds `request` against `upstream_url`.
///
/// Method, body and every header value are carried over untouched, with no
/// hop-by-hop filtering. `Host` is the exception: it names the gateway, and
/// the client fills in the upstream authority instead. The inbound path and
/// query are dropped since the gateway serves a single route.
pub fn build_upstream_request(
    upstream_url: &Url,
    request: Request<RequestBody>,
) -> Result<Request<RequestBody>, GatewayError> {
    let (parts, body) = request.into_parts();

    let mut req_builder = Request::builder()
        .method(parts.method)
        .uri(upstream_url.as_str());

    for (name, value) in parts.headers.iter() {
        if name == HOST {
            continue;
        }
        req_builder = req_builder.header(name, value);
    }

    req_builder
        .body(body)
        .map_err(|e| GatewayError::RequestBuildError(e.to_string()))
}

/// Send a request to the upstream and return its response.
///
/// # Timeout Behavior
///
/// `timeout_duration` is a single deadline for the whole exchange:
/// - Connecting and sending the request (body included)
/// - Receiving the response head
/// - Streaming the response body
///
/// The body is still streamed frame by frame. A frame that has not arrived
/// by the deadline ends the body with [`GatewayError::UpstreamTimeout`].
pub async fn send_to_upstream(
    client: &ProxyClient,
    upstream_url: &Url,
    request: Request<RequestBody>,
    timeout_duration: Duration,
) -> Result<Response<UpstreamBody>, GatewayError> {
    let deadline = Instant::now() + timeout_duration;
    // Use host as identifier for error messages
    let upstream_identifier = upstream_url.host_str().unwrap_or(upstream_url.as_str());

    let response = timeout_at(deadline, client.request(request))
        .await
        .map_err(|_| GatewayError::UpstreamTimeout(upstream_identifier.to_string()))?
        .map_err(|e| {
            GatewayError::UpstreamRequestFailed(upstream_identifier.to_string(), error_chain(&e))
        })?;

    let upstream = upstream_identifier.to_string();
    Ok(response.map(|body| UpstreamBody::new(body, deadline, upstream)))
}

/// Upstream response body bounded by the exchange deadline
#[derive(Debug)]
pub struct UpstreamBody {
    inner: Incoming,
    deadline: Pin<Box<Sleep>>,
    upstream: String,
    timed_out: bool,
}

impl UpstreamBody {
    fn new(inner: Incoming, deadline: Instant, upstream: String) -> Self {
        Self {
            inner,
            deadline: Box::pin(sleep_until(deadline)),
            upstream,
            timed_out: false,
        }
    }
}

impl Body for UpstreamBody {
    type Data = Bytes;
    type Error = GatewayError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, GatewayError>>> {
        let this = self.get_mut();
        if this.timed_out {
            return Poll::Ready(None);
        }

        if let Poll::Ready(frame) = Pin::new(&mut this.inner).poll_frame(cx) {
            return Poll::Ready(
                frame.map(|result| {
                    result.map_err(|e| GatewayError::ResponseBodyError(error_chain(&e)))
                }),
            );
        }

        if this.deadline.as_mut().poll(cx).is_ready() {
            this.timed_out = true;
            return Poll::Ready(Some(Err(GatewayError::UpstreamTimeout(
                this.upstream.clone(),
            ))));
        }

        Poll::Pending
    }

    fn is_end_stream(&self) -> bool {
        self.timed_out || self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

// hyper-util's client error only says "client error (Connect)"; the cause is
// further down the source chain.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
