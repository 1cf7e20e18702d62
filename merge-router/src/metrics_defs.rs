use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "Request duration in seconds. Tagged with mode, status.",
};

pub const REQUESTS_INFLIGHT: MetricDef = MetricDef {
    name: "requests.inflight",
    metric_type: MetricType::Gauge,
    description: "Number of requests currently being processed",
};

pub const BACKEND_FETCH_FAILURES: MetricDef = MetricDef {
    name: "backend.fetch.failures",
    metric_type: MetricType::Counter,
    description: "Backend fetches that fell back to an empty document. Tagged with reason.",
};

pub const PROXY_FAILURES: MetricDef = MetricDef {
    name: "proxy.failures",
    metric_type: MetricType::Counter,
    description: "Write requests that could not be relayed to the secondary backend. Tagged with reason.",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REQUEST_DURATION,
    REQUESTS_INFLIGHT,
    BACKEND_FETCH_FAILURES,
    PROXY_FAILURES,
];
