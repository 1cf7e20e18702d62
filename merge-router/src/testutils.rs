//! Loopback backends for tests.

use crate::handler::RequestBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::HeaderMap;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode, Uri};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

/// A request as seen by a test backend
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Backend that answers every request with the same canned response and
/// records what it received.
pub struct TestBackend {
    pub url: Url,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl TestBackend {
    pub async fn start(status: StatusCode, headers: &[(&str, &str)], body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let port = listener.local_addr().unwrap().port();

        let headers: Vec<(String, String)> = headers
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        let body = Bytes::from(body.to_string());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();

        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let io = TokioIo::new(stream);
                let headers = headers.clone();
                let body = body.clone();
                let recorded = recorded.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let headers = headers.clone();
                        let body = body.clone();
                        let recorded = recorded.clone();
                        async move {
                            let (parts, req_body) = req.into_parts();
                            let req_body = req_body
                                .collect()
                                .await
                                .map(|collected| collected.to_bytes())
                                .unwrap_or_default();
                            recorded.lock().unwrap().push(RecordedRequest {
                                method: parts.method,
                                uri: parts.uri,
                                headers: parts.headers,
                                body: req_body,
                            });

                            let mut builder = Response::builder().status(status);
                            for (name, value) in &headers {
                                builder = builder.header(name.as_str(), value.as_str());
                            }
                            Ok::<_, Infallible>(builder.body(Full::new(body)).unwrap())
                        }
                    });

                    let _ = Builder::new(TokioExecutor::new())
                        .serve_connection(io, service)
                        .await;
                });
            }
        });

        Self {
            url: Url::parse(&format!("http://127.0.0.1:{port}/api/rawdata")).unwrap(),
            requests,
        }
    }

    /// Backend serving `body` as `200 application/json`
    pub async fn json(body: &str) -> Self {
        Self::start(StatusCode::OK, &[("content-type", "application/json")], body).await
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// URL of a port nothing listens on
pub async fn closed_port_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Url::parse(&format!("http://127.0.0.1:{port}/api/rawdata")).unwrap()
}

/// URL of a backend that accepts connections but never answers
pub async fn stalled_backend_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    Url::parse(&format!("http://127.0.0.1:{port}/api/rawdata")).unwrap()
}

/// URL of a backend that announces a 100 byte body but only sends `hello`
///
/// With `close` the connection is dropped after the partial body, otherwise
/// it is held open and the rest never arrives.
pub async fn partial_body_backend_url(close: bool) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let _ = stream
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\n\r\nhello")
                .await;
            let _ = stream.flush().await;
            if !close {
                held.push(stream);
            }
        }
    });

    Url::parse(&format!("http://127.0.0.1:{port}/api/rawdata")).unwrap()
}

/// Request body carrying `bytes`, as the dispatcher would hand it over
pub fn request_body(bytes: &'static [u8]) -> RequestBody {
    Full::new(Bytes::from_static(bytes))
        .map_err(|never| match never {})
        .boxed_unsync()
}
