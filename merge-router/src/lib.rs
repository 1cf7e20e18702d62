//! HTTP gateway that merges the JSON documents of two backends.
//!
//! `GET` on the configured route fetches both backends, deep-merges the
//! secondary document with the primary document on top and serves the
//! result. Every other method is relayed verbatim to the secondary backend.

pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod fanout_handler;
pub mod fetcher;
pub mod forwarding_handler;
pub mod handler;
pub mod http;
pub mod merger;
pub mod metrics_defs;

#[cfg(test)]
mod testutils;

use dispatcher::Dispatcher;
use errors::GatewayError;
use tokio::net::TcpListener;

pub async fn run(config: config::Config) -> Result<(), GatewayError> {
    config.validate()?;
    let listener =
        TcpListener::bind(format!("{}:{}", config.listener.host, config.listener.port)).await?;
    serve(listener, config).await
}

/// Serves the gateway on an already bound listener.
pub async fn serve(listener: TcpListener, config: config::Config) -> Result<(), GatewayError> {
    let dispatcher = Dispatcher::new(&config)?;
    let address = listener.local_addr()?;

    tracing::info!(
        address = %address,
        route = %config.route,
        primary = %config.backends.primary,
        secondary = %config.backends.secondary,
        "Merge gateway running (primary: read-only, secondary: read-write)"
    );

    shared::http::serve(listener, dispatcher).await
}
