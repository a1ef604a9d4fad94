pub mod dto;
pub mod extract;
pub mod series;
pub mod service;

pub use dto::{MetricField, MetricRecord, NormalizedMetric};
pub use extract::normalize;
pub use series::{ChartSeries, Dataset, DatasetSpec};
pub use service::{FetchOutcome, MetricsService, RequestToken, RequestTracker};
