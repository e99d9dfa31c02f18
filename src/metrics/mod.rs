//! Project-health scoring: weighted aggregation, status classification and badges.

pub mod aggregator;
pub mod badge;
pub mod report;

pub use aggregator::{
    aggregate, default_thresholds, default_weights, CategoryScore, Direction, HealthScore,
    MetricSample, MetricsAggregator, Status, Threshold,
};
pub use badge::{label, Badge};
pub use report::{ConsolidatedReport, HealthReport};
