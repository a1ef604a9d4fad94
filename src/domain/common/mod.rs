//! Time-window and grouping-dimension value types shared by every query.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::InsightsError;

/// Inclusive time window a query is bounded by, at second granularity.
///
/// Both ends are always replaced together; a range with `from > to` can be
/// constructed (the UI hands us whatever the user picked) but is rejected by
/// the query builder before anything reaches the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Window ending now and reaching `days` back. The dashboards default to
    /// the last 10 days.
    pub fn last_days(days: i64) -> Self {
        let to = Utc::now();
        Self {
            from: to - Duration::days(days),
            to,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.from <= self.to
    }

    /// `start:` argument value at the query boundary.
    pub fn start_param(&self) -> String {
        self.from.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// `end:` argument value at the query boundary.
    pub fn end_param(&self) -> String {
        self.to.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Bucketing applied to time-series queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Daily,
}

impl Interval {
    pub fn wire_name(&self) -> &'static str {
        match self {
            Interval::Daily => "DAILY",
        }
    }
}

/// Closed browser set recognized by the analytics service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Browser {
    Chrome,
    Firefox,
    Ie,
    Edge,
    Safari,
    Other,
}

impl Browser {
    pub const ALL: [Browser; 6] = [
        Browser::Chrome,
        Browser::Firefox,
        Browser::Ie,
        Browser::Edge,
        Browser::Safari,
        Browser::Other,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            Browser::Chrome => "CHROME",
            Browser::Firefox => "FIREFOX",
            Browser::Ie => "IE",
            Browser::Edge => "EDGE",
            Browser::Safari => "SAFARI",
            Browser::Other => "OTHER",
        }
    }
}

impl FromStr for Browser {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Browser::ALL
            .into_iter()
            .find(|b| b.wire_name() == s)
            .ok_or_else(|| InsightsError::InvalidFilter {
                dimension: "browser",
                value: s.to_string(),
            })
    }
}

/// Closed country set the dashboards report on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Country {
    Sa,
    Eg,
    Us,
    In,
    Gb,
}

impl Country {
    pub const ALL: [Country; 5] = [
        Country::Sa,
        Country::Eg,
        Country::Us,
        Country::In,
        Country::Gb,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            Country::Sa => "SA",
            Country::Eg => "EG",
            Country::Us => "US",
            Country::In => "IN",
            Country::Gb => "GB",
        }
    }
}

impl FromStr for Country {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Country::ALL
            .into_iter()
            .find(|c| c.wire_name() == s)
            .ok_or_else(|| InsightsError::InvalidFilter {
                dimension: "country",
                value: s.to_string(),
            })
    }
}

/// Categorical axis metrics can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Browser,
    Country,
}

impl Dimension {
    pub fn wire_name(&self) -> &'static str {
        match self {
            Dimension::Browser => "BROWSER",
            Dimension::Country => "COUNTRY",
        }
    }

    pub fn filter_arg(&self) -> &'static str {
        match self {
            Dimension::Browser => "browser",
            Dimension::Country => "country",
        }
    }
}

/// Enumerated value under one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterValue {
    Browser(Browser),
    Country(Country),
}

impl FilterValue {
    pub fn dimension(&self) -> Dimension {
        match self {
            FilterValue::Browser(_) => Dimension::Browser,
            FilterValue::Country(_) => Dimension::Country,
        }
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            FilterValue::Browser(b) => b.wire_name(),
            FilterValue::Country(c) => c.wire_name(),
        }
    }
}

/// One grouped dimension plus the enumerated values to restrict it to.
/// An empty value list groups without restricting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionSelection {
    pub dimension: Dimension,
    pub values: Vec<FilterValue>,
}

impl DimensionSelection {
    pub fn new(dimension: Dimension, values: Vec<FilterValue>) -> Self {
        Self { dimension, values }
    }

    /// Group by every browser in the closed set.
    pub fn all_browsers() -> Self {
        Self::new(
            Dimension::Browser,
            Browser::ALL.into_iter().map(FilterValue::Browser).collect(),
        )
    }

    /// Group by every country in the closed set.
    pub fn all_countries() -> Self {
        Self::new(
            Dimension::Country,
            Country::ALL.into_iter().map(FilterValue::Country).collect(),
        )
    }
}

/// Grouping dimensions selected for an aggregate query. The variant decides
/// both the query shape and which fields appear in the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimensionFilter {
    /// No grouping; aggregate totals over the whole window.
    None,
    /// Per-value buckets on one dimension.
    Single(DimensionSelection),
    /// Nested per-value-pair buckets, in the listed dimension order.
    Composite(Vec<DimensionSelection>),
}

impl DimensionFilter {
    /// Selections in grouping order, empty for `None`.
    pub fn selections(&self) -> &[DimensionSelection] {
        match self {
            DimensionFilter::None => &[],
            DimensionFilter::Single(sel) => std::slice::from_ref(sel),
            DimensionFilter::Composite(sels) => sels,
        }
    }

    /// Innermost grouped dimension, which labels the response buckets.
    pub fn bucket_dimension(&self) -> Option<Dimension> {
        self.selections().last().map(|sel| sel.dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn range_params_are_rfc3339() {
        let range = TimeRange::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 11, 12, 30, 15).unwrap(),
        );
        assert_eq!(range.start_param(), "2024-03-01T00:00:00Z");
        assert_eq!(range.end_param(), "2024-03-11T12:30:15Z");
        assert!(range.is_valid());
    }

    #[test]
    fn inverted_range_is_invalid() {
        let now = Utc::now();
        let range = TimeRange::new(now, now - Duration::hours(1));
        assert!(!range.is_valid());
    }

    #[test]
    fn browser_round_trips_through_wire_names() {
        for browser in Browser::ALL {
            assert_eq!(browser.wire_name().parse::<Browser>().unwrap(), browser);
        }
    }

    #[test]
    fn unknown_country_is_rejected() {
        let err = "FR".parse::<Country>().unwrap_err();
        assert!(matches!(
            err,
            InsightsError::InvalidFilter {
                dimension: "country",
                ..
            }
        ));
    }

    #[test]
    fn bucket_dimension_is_innermost() {
        let filter = DimensionFilter::Composite(vec![
            DimensionSelection::all_countries(),
            DimensionSelection::all_browsers(),
        ]);
        assert_eq!(filter.bucket_dimension(), Some(Dimension::Browser));
        assert_eq!(DimensionFilter::None.bucket_dimension(), None);
    }
}
