//! Metrics definitions for keyword lookups.

use shared::metrics_defs::{MetricDef, MetricType};

pub const LOOKUP_REQUESTS: MetricDef = MetricDef {
    name: "lookup.requests",
    metric_type: MetricType::Counter,
    description: "Number of keyword lookups with a valid keyword",
};

pub const LOOKUP_SERVED: MetricDef = MetricDef {
    name: "lookup.served",
    metric_type: MetricType::Counter,
    description: "Number of lookups answered, tagged by the tier that answered",
};

pub const LOOKUP_EXHAUSTED: MetricDef = MetricDef {
    name: "lookup.exhausted",
    metric_type: MetricType::Counter,
    description: "Number of lookups where every tier failed",
};

pub const LOOKUP_DURATION: MetricDef = MetricDef {
    name: "lookup.duration",
    metric_type: MetricType::Histogram,
    description: "Time to answer a keyword lookup in seconds",
};

pub const TIER_ATTEMPTS: MetricDef = MetricDef {
    name: "tier.attempts",
    metric_type: MetricType::Counter,
    description: "Number of requests made to a tier, tagged by tier",
};

pub const TIER_FAILURES: MetricDef = MetricDef {
    name: "tier.failures",
    metric_type: MetricType::Counter,
    description: "Number of tier requests that failed and fell through, tagged by tier",
};

// Described to the recorder at startup.
pub const ALL_METRICS: &[MetricDef] = &[
    LOOKUP_REQUESTS,
    LOOKUP_SERVED,
    LOOKUP_EXHAUSTED,
    LOOKUP_DURATION,
    TIER_ATTEMPTS,
    TIER_FAILURES,
];
