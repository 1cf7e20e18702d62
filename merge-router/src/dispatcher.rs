use crate::config::Config;
use crate::errors::GatewayError;
use crate::fanout_handler::FanOutHandler;
use crate::forwarding_handler::ForwardHandler;
use crate::handler::{HandlerBody, RequestBody, RouteHandler};
use crate::metrics_defs::{REQUEST_DURATION, REQUESTS_INFLIGHT};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use shared::http::make_error_response;
use shared::{gauge, histogram};
use std::pin::Pin;
use std::sync::Arc;
use tokio::time::Instant;

/// How a request on the merged route is served
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Fetch both backends and serve the merged document
    Read,
    /// Relay to the secondary backend
    Write,
}

impl Mode {
    pub fn for_method(method: &Method) -> Self {
        if *method == Method::GET {
            Mode::Read
        } else {
            Mode::Write
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Read => "read",
            Mode::Write => "write",
        }
    }
}

/// Counts a request in `requests.inflight` until dropped, including when
/// the request future is cancelled.
struct InflightGuard;

impl InflightGuard {
    fn new() -> Self {
        gauge!(REQUESTS_INFLIGHT).increment(1.0);
        Self
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        gauge!(REQUESTS_INFLIGHT).decrement(1.0);
    }
}

struct Inner {
    route: String,
    read: Box<dyn RouteHandler>,
    write: Box<dyn RouteHandler>,
}

/// Entry point of every inbound request
///
/// Classifies each request by method and hands it to the matching handler.
/// Cloning is cheap and clones share the same handlers.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        let read = FanOutHandler::new(
            config.backends.primary.clone(),
            config.backends.secondary.clone(),
            config.timeouts.fetch(),
        )?;
        let write = ForwardHandler::new(config.backends.secondary.clone())
            .with_timeout(config.timeouts.proxy());

        Ok(Self::with_handlers(
            config.route.clone(),
            Box::new(read),
            Box::new(write),
        ))
    }

    pub fn with_handlers(
        route: String,
        read: Box<dyn RouteHandler>,
        write: Box<dyn RouteHandler>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner { route, read, write }),
        }
    }

    fn handler(&self, mode: Mode) -> &dyn RouteHandler {
        match mode {
            Mode::Read => self.inner.read.as_ref(),
            Mode::Write => self.inner.write.as_ref(),
        }
    }

    pub async fn dispatch(&self, request: Request<RequestBody>) -> Response<HandlerBody> {
        if request.uri().path() != self.inner.route {
            tracing::debug!(
                method = %request.method(),
                path = %request.uri().path(),
                "No route matched"
            );
            return make_error_response(StatusCode::NOT_FOUND);
        }

        let mode = Mode::for_method(request.method());
        let handler = self.handler(mode);
        tracing::debug!(method = %request.method(), handler = handler.name(), "Dispatching request");

        let started = Instant::now();
        let inflight = InflightGuard::new();
        let response = handler.handle(request).await;
        drop(inflight);

        histogram!(
            REQUEST_DURATION,
            "mode" => mode.as_str(),
            "status" => response.status().as_u16().to_string()
        )
        .record(started.elapsed().as_secs_f64());

        response
    }
}

impl Service<Request<Incoming>> for Dispatcher {
    type Response = Response<HandlerBody>;
    type Error = GatewayError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let dispatcher = self.clone();
        Box::pin(async move {
            let req = req.map(|body| body.boxed_unsync());
            Ok(dispatcher.dispatch(req).await)
        })
    }
}
