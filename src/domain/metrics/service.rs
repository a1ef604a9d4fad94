//! Chart-level orchestration: build the query, run it, normalize and
//! aggregate the response.
//!
//! Every fetch carries a monotonically increasing request token. In-flight
//! requests are never cancelled; when a newer fetch for the same chart has
//! been issued by the time an older one completes, the older result comes
//! back as [`FetchOutcome::Superseded`] and the presentation layer drops it
//! (last request wins).

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use super::dto::MetricRecord;
use super::series::{
    failure_specs_for, interval_label_key, to_series, usage_minute_specs, ChartSeries,
};
use crate::core::client::AnalyticsClient;
use crate::core::query::QueryBuilder;
use crate::domain::common::{
    Country, Dimension, DimensionFilter, DimensionSelection, FilterValue, Interval, TimeRange,
};
use crate::errors::{FetchStage, InsightsError};

/// Token identifying one fetch issued against one chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// Issues tokens and remembers the newest one. One tracker per chart flow;
/// charts never supersede each other.
#[derive(Debug, Default)]
pub struct RequestTracker {
    issued: AtomicU64,
}

impl RequestTracker {
    pub fn begin(&self) -> RequestToken {
        RequestToken(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.issued.load(Ordering::SeqCst) == token.0
    }
}

/// Result of a chart fetch that raced a newer one.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Fresh(T),
    /// A newer fetch for this chart was issued while this one was in
    /// flight; discard.
    Superseded,
}

/// Fetches chart-ready series for the three dashboard views.
pub struct MetricsService<C> {
    client: C,
    builder: QueryBuilder,
    usage_requests: RequestTracker,
    browser_requests: RequestTracker,
    region_requests: RequestTracker,
}

impl<C: AnalyticsClient> MetricsService<C> {
    pub fn new(client: C, builder: QueryBuilder) -> Self {
        Self {
            client,
            builder,
            usage_requests: RequestTracker::default(),
            browser_requests: RequestTracker::default(),
            region_requests: RequestTracker::default(),
        }
    }

    /// Daily streamed-minute usage over `range`.
    pub async fn usage_by_day(
        &self,
        range: &TimeRange,
    ) -> Result<FetchOutcome<ChartSeries>, InsightsError> {
        let token = self.usage_requests.begin();
        let query = self
            .builder
            .aggregate(range, &DimensionFilter::None, Some(Interval::Daily))?;
        let result = self
            .fetch_records(&query)
            .await
            .map(|records| to_series(&records, interval_label_key(), &usage_minute_specs()));
        self.settle(&self.usage_requests, token, result)
    }

    /// Attempt/failure breakdown per browser over `range`.
    pub async fn failures_by_browser(
        &self,
        range: &TimeRange,
    ) -> Result<FetchOutcome<ChartSeries>, InsightsError> {
        let filter = DimensionFilter::Single(DimensionSelection::all_browsers());
        self.failure_chart(&self.browser_requests, range, filter).await
    }

    /// Failure breakdown per country, or, when `country` is picked, the
    /// per-browser attempt/failure breakdown within that country. The
    /// filter variant decides both the query shape and the dataset layout.
    pub async fn failures_by_region(
        &self,
        range: &TimeRange,
        country: Option<Country>,
    ) -> Result<FetchOutcome<ChartSeries>, InsightsError> {
        let filter = match country {
            None => DimensionFilter::Single(DimensionSelection::all_countries()),
            Some(country) => DimensionFilter::Composite(vec![
                DimensionSelection::new(
                    Dimension::Country,
                    vec![FilterValue::Country(country)],
                ),
                DimensionSelection::all_browsers(),
            ]),
        };
        self.failure_chart(&self.region_requests, range, filter).await
    }

    async fn failure_chart(
        &self,
        tracker: &RequestTracker,
        range: &TimeRange,
        filter: DimensionFilter,
    ) -> Result<FetchOutcome<ChartSeries>, InsightsError> {
        let token = tracker.begin();
        let query = self.builder.aggregate(range, &filter, None)?;
        let result = self.fetch_records(&query).await.map(|records| {
            let (label_key, specs) = failure_specs_for(&filter);
            to_series(&records, label_key, &specs)
        });
        self.settle(tracker, token, result)
    }

    async fn fetch_records(
        &self,
        query: &crate::core::client::Query,
    ) -> Result<Vec<MetricRecord>, InsightsError> {
        let envelope = self
            .client
            .execute(query)
            .await
            .map_err(|e| InsightsError::fetch_failed(FetchStage::Aggregate, e))?;
        envelope
            .decode_resources()
            .map_err(|e| InsightsError::fetch_failed(FetchStage::Aggregate, e))
    }

    // Superseded fetches are dropped whether they succeeded or failed; a
    // stale error must not displace whatever the newest fetch produced.
    fn settle(
        &self,
        tracker: &RequestTracker,
        token: RequestToken,
        result: Result<ChartSeries, InsightsError>,
    ) -> Result<FetchOutcome<ChartSeries>, InsightsError> {
        if !tracker.is_current(token) {
            debug!("dropping superseded chart fetch");
            return Ok(FetchOutcome::Superseded);
        }
        result.map(FetchOutcome::Fresh)
    }
}
