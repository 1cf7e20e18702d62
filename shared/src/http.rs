use http::header::{CONTENT_TYPE, HeaderValue, X_CONTENT_TYPE_OPTIONS};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioExecutor;
use hyper_util::rt::TokioIo;
use hyper_util::server::conn::auto::Builder;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Accepts connections from an already bound listener until accepting fails.
///
/// Every connection is served on its own task, so requests are handled
/// concurrently and share nothing but the service itself.
pub async fn serve<S, B, E>(listener: TcpListener, service: S) -> Result<(), E>
where
    S: Service<Request<Incoming>, Response = Response<B>, Error = E> + Send + Sync + 'static,
    S::Future: Send + 'static,
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: std::error::Error + Send + Sync + 'static,
    E: From<std::io::Error> + std::error::Error + Send + Sync + 'static,
{
    let service_arc = Arc::new(service);

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let _ = stream.set_nodelay(true);
        let io = TokioIo::new(stream);
        let svc = service_arc.clone();

        // Hand the connection to hyper; auto-detect h1/h2 on this socket
        tokio::spawn(async move {
            if let Err(e) = Builder::new(TokioExecutor::new())
                .serve_connection(io, svc)
                .await
            {
                tracing::debug!(peer = %peer_addr, error = %e, "connection closed with error");
            }
        });
    }
}

/// Builds a plain-text response carrying `message`.
///
/// The body is terminated by a newline and marked `nosniff`.
pub fn make_text_response<E>(
    status: StatusCode,
    message: impl Into<String>,
) -> Response<UnsyncBoxBody<Bytes, E>> {
    let mut text = message.into();
    text.push('\n');

    let mut response = Response::new(
        Full::new(Bytes::from(text))
            .map_err(|never| match never {})
            .boxed_unsync(),
    );
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));

    response
}

/// Plain-text response whose body is the lowercase reason phrase of `status`.
pub fn make_error_response<E>(status: StatusCode) -> Response<UnsyncBoxBody<Bytes, E>> {
    let reason = status.canonical_reason().unwrap_or("error").to_lowercase();
    make_text_response(status, reason)
}
