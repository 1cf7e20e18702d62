use crate::errors::GatewayError;
use async_trait::async_trait;
use http_body_util::combinators::UnsyncBoxBody;
use hyper::body::Bytes;
use hyper::{Request, Response};

/// Body of a request entering a handler: the inbound stream, unbuffered.
pub type RequestBody = UnsyncBoxBody<Bytes, hyper::Error>;

/// Body of a response leaving a handler.
pub type HandlerBody = UnsyncBoxBody<Bytes, GatewayError>;

/// Handler for one of the dispatch modes of the merged route
///
/// Handlers never fail: every error is already turned into the response the
/// caller should see.
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn handle(&self, request: Request<RequestBody>) -> Response<HandlerBody>;

    fn name(&self) -> &'static str;
}
