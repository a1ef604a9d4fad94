//! Query and pagination engine for real-time communication platform
//! analytics.
//!
//! Turns a user-picked time range and dimension filter into analytics
//! queries, normalizes the partially-absent nested metrics that come back,
//! and drives cursor-based pagination over the per-session result set. The
//! outputs, [`ChartSeries`] and [`PaginationState`], are the only values
//! that cross into the rendering collaborators; charts, tables and date
//! pickers live elsewhere.
//!
//! The remote service is reached through the [`AnalyticsClient`] capability,
//! one round trip per query. [`GraphQlClient`] is the production
//! implementation.

pub mod config;
pub mod core;
pub mod domain;
pub mod errors;

pub use crate::config::InsightsConfig;
pub use crate::core::client::{
    AnalyticsClient, GraphQlClient, Query, QueryShape, ResponseEnvelope,
};
pub use crate::core::query::QueryBuilder;
pub use crate::domain::common::{
    Browser, Country, Dimension, DimensionFilter, DimensionSelection, FilterValue, Interval,
    TimeRange,
};
pub use crate::domain::metrics::{ChartSeries, FetchOutcome, MetricsService};
pub use crate::domain::session::{
    LoadMoreOutcome, PaginationState, SessionDetail, SessionPaginator,
};
pub use crate::errors::{FetchStage, InsightsError, RemoteError};
