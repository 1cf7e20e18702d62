use crate::config::MetricsConfig;
use metrics_exporter_statsd::StatsdBuilder;

const METRICS_PREFIX: &str = "merge_gateway";

#[derive(thiserror::Error, Debug)]
pub enum MetricsError {
    #[error("could not build statsd exporter: {0}")]
    Exporter(String),
    #[error("a metrics recorder is already installed")]
    AlreadyInstalled,
}

/// Installs the statsd recorder and describes every gateway metric.
pub fn init(config: &MetricsConfig) -> Result<(), MetricsError> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(METRICS_PREFIX))
        .map_err(|e| MetricsError::Exporter(e.to_string()))?;
    metrics::set_global_recorder(recorder).map_err(|_| MetricsError::AlreadyInstalled)?;

    shared::metrics_defs::describe_all(merge_router::metrics_defs::ALL_METRICS);
    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "Reporting metrics to statsd"
    );

    Ok(())
}
