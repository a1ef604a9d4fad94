use chrono::{DateTime, Utc};
use thiserror::Error;

/// Which remote round trip a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    /// Session-summary page fetch.
    Summary,
    /// Batched session-detail fetch.
    Detail,
    /// Grouped metrics fetch backing a chart.
    Aggregate,
}

impl std::fmt::Display for FetchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FetchStage::Summary => "summary",
            FetchStage::Detail => "detail",
            FetchStage::Aggregate => "aggregate",
        };
        f.write_str(name)
    }
}

/// Failure raised by an [`AnalyticsClient`](crate::core::client::AnalyticsClient)
/// round trip. Opaque to the query/pagination core; callers only ever see it
/// wrapped in [`InsightsError::FetchFailed`].
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("analytics service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("analytics service rejected the query: {0}")]
    Service(String),

    #[error("malformed analytics response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum InsightsError {
    /// Client-side construction error; never sent to the remote service.
    #[error("invalid time range: from {from} is after to {to}")]
    InvalidRange {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    /// Client-side construction error; the remote service remains
    /// authoritative for enumerated value sets.
    #[error("invalid {dimension} filter value: {value}")]
    InvalidFilter {
        dimension: &'static str,
        value: String,
    },

    /// A session-detail query needs at least one session id; the paginator
    /// short-circuits before ever hitting this.
    #[error("session detail query requires at least one session id")]
    EmptySessionBatch,

    /// Remote failure, surfaced with the round trip it belongs to. Prior
    /// good state (pagination, last series) is left intact by the caller.
    #[error("{stage} fetch failed: {source}")]
    FetchFailed {
        stage: FetchStage,
        #[source]
        source: RemoteError,
    },
}

impl InsightsError {
    pub fn fetch_failed(stage: FetchStage, source: RemoteError) -> Self {
        Self::FetchFailed { stage, source }
    }
}
