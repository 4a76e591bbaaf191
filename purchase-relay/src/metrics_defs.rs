use shared::metrics_defs::{MetricDef, MetricType};

pub const RELAY_REQUESTS: MetricDef = MetricDef {
    name: "relay.requests",
    metric_type: MetricType::Counter,
    description: "Purchase relay requests. Tagged with outcome.",
};

pub const UPSTREAM_DURATION: MetricDef = MetricDef {
    name: "relay.upstream.duration",
    metric_type: MetricType::Histogram,
    description: "Graph API request duration in seconds. Tagged with status.",
};

pub const PIXEL_REQUESTS: MetricDef = MetricDef {
    name: "pixel.requests",
    metric_type: MetricType::Counter,
    description: "Pixel bootstrap script requests. Tagged with outcome.",
};

pub const ALL_METRICS: &[MetricDef] = &[RELAY_REQUESTS, UPSTREAM_DURATION, PIXEL_REQUESTS];
