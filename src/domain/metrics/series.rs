//! Chart-ready label/value series built from normalized metric buckets.

use serde::Serialize;

use super::dto::{MetricField, MetricRecord};
use super::extract::normalize;
use crate::domain::common::{Dimension, DimensionFilter};

/// Selects the bucket label for one response record. One record in, one
/// label out; the aggregator never sorts or merges rows.
pub type LabelKey = fn(&MetricRecord) -> String;

/// Describes one dataset to project out of a record sequence.
#[derive(Debug, Clone, Copy)]
pub struct DatasetSpec {
    pub label: &'static str,
    pub field: MetricField,
    /// Stack the rendering layer groups this dataset into, where the chart
    /// type stacks at all.
    pub group_tag: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Dataset {
    pub label: String,
    pub values: Vec<f64>,
    pub group_tag: Option<String>,
}

/// Output handed to the chart collaborators. Invariant: every dataset's
/// `values` has exactly one entry per label.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartSeries {
    /// An empty series still carries one (empty) dataset per spec, so "no
    /// data in range" renders as an empty chart rather than a broken one.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Projects `records` into a chart series, normalizing each record on the
/// way. Dimension-agnostic: whoever changed the query's dimensionality must
/// supply the matching `label_key` and `specs`.
pub fn to_series(records: &[MetricRecord], label_key: LabelKey, specs: &[DatasetSpec]) -> ChartSeries {
    let labels = records.iter().map(label_key).collect();

    let normalized: Vec<_> = records.iter().map(normalize).collect();
    let datasets = specs
        .iter()
        .map(|spec| Dataset {
            label: spec.label.to_string(),
            values: normalized.iter().map(|n| n.field(spec.field)).collect(),
            group_tag: spec.group_tag.map(str::to_string),
        })
        .collect();

    ChartSeries { labels, datasets }
}

fn browser_label(record: &MetricRecord) -> String {
    record.browser.clone().unwrap_or_default()
}

fn country_label(record: &MetricRecord) -> String {
    record.country.clone().unwrap_or_default()
}

fn interval_label(record: &MetricRecord) -> String {
    record
        .interval_start
        .map(|start| start.format("%b %d").to_string())
        .unwrap_or_default()
}

// Ungrouped error queries carry neither a dimension label nor interval
// fields; the single totals bucket gets a fixed label.
fn total_label(_record: &MetricRecord) -> String {
    "Total".to_string()
}

/// Datasets for the daily usage line chart.
pub fn usage_minute_specs() -> Vec<DatasetSpec> {
    vec![
        DatasetSpec {
            label: "Streamed Published Minutes",
            field: MetricField::PublishedMinutes,
            group_tag: None,
        },
        DatasetSpec {
            label: "Streamed Subscribed Minutes",
            field: MetricField::SubscribedMinutes,
            group_tag: None,
        },
    ]
}

/// Label key for interval-bucketed (time series) queries.
pub fn interval_label_key() -> LabelKey {
    interval_label
}

fn failures_only_specs() -> Vec<DatasetSpec> {
    vec![
        DatasetSpec {
            label: "Connect Failures",
            field: MetricField::ConnectFailures,
            group_tag: Some("1"),
        },
        DatasetSpec {
            label: "Publish Failures",
            field: MetricField::PublishFailures,
            group_tag: Some("1"),
        },
        DatasetSpec {
            label: "Subscribe Failures",
            field: MetricField::SubscribeFailures,
            group_tag: Some("1"),
        },
    ]
}

fn attempts_and_failures_specs() -> Vec<DatasetSpec> {
    vec![
        DatasetSpec {
            label: "Connect Attempts",
            field: MetricField::ConnectAttempts,
            group_tag: Some("1"),
        },
        DatasetSpec {
            label: "Connect Failures",
            field: MetricField::ConnectFailures,
            group_tag: Some("1"),
        },
        DatasetSpec {
            label: "Publish Attempts",
            field: MetricField::PublishAttempts,
            group_tag: Some("2"),
        },
        DatasetSpec {
            label: "Publish Failures",
            field: MetricField::PublishFailures,
            group_tag: Some("2"),
        },
        DatasetSpec {
            label: "Subscribe Attempts",
            field: MetricField::SubscribeAttempts,
            group_tag: Some("3"),
        },
        DatasetSpec {
            label: "Subscribe Failures",
            field: MetricField::SubscribeFailures,
            group_tag: Some("3"),
        },
    ]
}

/// Picks the `(label_key, dataset_specs)` pair matching a filter's bucket
/// dimension. Country buckets show the failure breakdown only; browser
/// buckets (including country×browser) show attempts next to failures;
/// ungrouped totals collapse into one "Total" bucket.
pub fn failure_specs_for(filter: &DimensionFilter) -> (LabelKey, Vec<DatasetSpec>) {
    match filter.bucket_dimension() {
        Some(Dimension::Country) => (country_label, failures_only_specs()),
        Some(Dimension::Browser) => (browser_label, attempts_and_failures_specs()),
        None => (total_label, attempts_and_failures_specs()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::common::DimensionSelection;
    use serde_json::json;

    fn record(value: serde_json::Value) -> MetricRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn empty_input_yields_well_formed_empty_series() {
        let specs = usage_minute_specs();
        let series = to_series(&[], interval_label_key(), &specs);

        assert!(series.is_empty());
        assert!(series.labels.is_empty());
        assert_eq!(series.datasets.len(), specs.len());
        for (dataset, spec) in series.datasets.iter().zip(&specs) {
            assert_eq!(dataset.label, spec.label);
            assert!(dataset.values.is_empty());
        }
    }

    #[test]
    fn every_dataset_matches_record_count() {
        let records = vec![
            record(json!({ "browser": "CHROME", "errors": { "connect": { "attempts": 10, "failures": 2 } } })),
            record(json!({ "browser": "FIREFOX" })),
            record(json!({ "browser": "SAFARI", "errors": { "subscribe": { "failures": 1 } } })),
        ];
        let (label_key, specs) =
            failure_specs_for(&DimensionFilter::Single(DimensionSelection::all_browsers()));
        let series = to_series(&records, label_key, &specs);

        assert_eq!(series.labels, vec!["CHROME", "FIREFOX", "SAFARI"]);
        assert_eq!(series.datasets.len(), 6);
        for dataset in &series.datasets {
            assert_eq!(dataset.values.len(), records.len());
        }
        // Connect Attempts dataset, zero-filled where absent.
        assert_eq!(series.datasets[0].values, vec![10.0, 0.0, 0.0]);
        assert_eq!(series.datasets[1].values, vec![2.0, 0.0, 0.0]);
    }

    #[test]
    fn country_buckets_use_failure_breakdown() {
        let (label_key, specs) =
            failure_specs_for(&DimensionFilter::Single(DimensionSelection::all_countries()));
        let records = vec![record(
            json!({ "country": "EG", "errors": { "publish": { "failures": 4 } } }),
        )];
        let series = to_series(&records, label_key, &specs);

        assert_eq!(series.labels, vec!["EG"]);
        assert_eq!(series.datasets.len(), 3);
        assert_eq!(series.datasets[1].label, "Publish Failures");
        assert_eq!(series.datasets[1].values, vec![4.0]);
        assert_eq!(series.datasets[1].group_tag.as_deref(), Some("1"));
    }

    #[test]
    fn composite_filter_labels_by_innermost_dimension() {
        let filter = DimensionFilter::Composite(vec![
            DimensionSelection::all_countries(),
            DimensionSelection::all_browsers(),
        ]);
        let (label_key, specs) = failure_specs_for(&filter);
        let records = vec![record(json!({ "browser": "EDGE", "country": "US" }))];
        let series = to_series(&records, label_key, &specs);

        assert_eq!(series.labels, vec!["EDGE"]);
        assert_eq!(series.datasets.len(), 6);
    }

    #[test]
    fn ungrouped_totals_get_a_fixed_label() {
        let (label_key, specs) = failure_specs_for(&DimensionFilter::None);
        let records = vec![record(
            json!({ "errors": { "connect": { "attempts": 7, "failures": 2 } } }),
        )];
        let series = to_series(&records, label_key, &specs);

        assert_eq!(series.labels, vec!["Total"]);
        assert_eq!(series.datasets.len(), 6);
        assert_eq!(series.datasets[0].values, vec![7.0]);
        assert_eq!(series.datasets[1].values, vec![2.0]);
    }

    #[test]
    fn interval_labels_format_like_the_dashboards() {
        let records = vec![record(json!({
            "intervalStart": "2024-03-05T00:00:00Z",
            "usage": { "streamedPublishedMinutes": 1.5 }
        }))];
        let series = to_series(&records, interval_label_key(), &usage_minute_specs());

        assert_eq!(series.labels, vec!["Mar 05"]);
        assert_eq!(series.datasets[0].values, vec![1.5]);
        assert_eq!(series.datasets[1].values, vec![0.0]);
    }
}
