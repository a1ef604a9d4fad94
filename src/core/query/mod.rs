//! Deterministic construction of analytics query documents.
//!
//! One builder method per query shape. Validation happens here, before
//! anything reaches the wire: a builder error means no query was sent.
//! The field set each method requests is shape-coupled with the metric
//! extractor; the two change together.

use crate::config::InsightsConfig;
use crate::core::client::{Query, QueryShape};
use crate::domain::common::{DimensionFilter, DimensionSelection, Interval, TimeRange};
use crate::errors::InsightsError;

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    project_id: String,
}

impl QueryBuilder {
    pub fn new(config: &InsightsConfig) -> Self {
        Self {
            project_id: config.project_id.clone(),
        }
    }

    /// Grouped metrics over `range`. With an `interval` the query asks for
    /// interval-bucketed usage minutes; without one it asks for the
    /// per-channel error counters selected by `filter` (country buckets get
    /// failures only, browser and ungrouped buckets get attempts as well).
    pub fn aggregate(
        &self,
        range: &TimeRange,
        filter: &DimensionFilter,
        interval: Option<Interval>,
    ) -> Result<Query, InsightsError> {
        validate_range(range)?;
        validate_filter(filter)?;

        let mut args = vec![
            format!("start: \"{}\"", range.start_param()),
            format!("end: \"{}\"", range.end_param()),
        ];
        if let Some(interval) = interval {
            args.push(format!("interval: {}", interval.wire_name()));
        }

        let selections = filter.selections();
        if !selections.is_empty() {
            let dims = selections
                .iter()
                .map(|sel| sel.dimension.wire_name())
                .collect::<Vec<_>>()
                .join(", ");
            args.push(format!("groupBy: [{dims}]"));

            for sel in selections {
                if sel.values.is_empty() {
                    continue;
                }
                let values = sel
                    .values
                    .iter()
                    .map(|v| v.wire_name())
                    .collect::<Vec<_>>()
                    .join(", ");
                args.push(format!("{}: [{values}]", sel.dimension.filter_arg()));
            }
        }

        let document = format!(
            "{{\n  project(projectId: {project}) {{\n    projectData(\n      {args}\n    ) {{\n      resources {{\n{fields}\n      }}\n    }}\n  }}\n}}",
            project = self.project_id,
            args = args.join(",\n      "),
            fields = resource_fields(filter, interval),
        );

        Ok(Query {
            document,
            shape: QueryShape::Aggregate,
        })
    }

    /// One page of session ids within `range`, with the total count and end
    /// cursor in the envelope. Follow-up pages pass the previous page's
    /// cursor as `after_cursor`.
    pub fn session_summaries(
        &self,
        range: &TimeRange,
        after_cursor: Option<&str>,
    ) -> Result<Query, InsightsError> {
        validate_range(range)?;

        let mut args = vec![
            format!("start: \"{}\"", range.start_param()),
            format!("end: \"{}\"", range.end_param()),
        ];
        if let Some(cursor) = after_cursor {
            args.push(format!("after: \"{}\"", escape(cursor)));
        }

        let document = format!(
            "{{\n  project(projectId: {project}) {{\n    sessionData {{\n      sessionSummaries(\n        {args}\n      ) {{\n        totalCount\n        pageInfo {{\n          endCursor\n        }}\n        resources {{\n          sessionId\n        }}\n      }}\n    }}\n  }}\n}}",
            project = self.project_id,
            args = args.join(",\n        "),
        );

        Ok(Query {
            document,
            shape: QueryShape::SessionSummary,
        })
    }

    /// Details for every id of one summary page, batched into a single
    /// query so each page costs exactly two round trips.
    pub fn session_details(&self, session_ids: &[String]) -> Result<Query, InsightsError> {
        if session_ids.is_empty() {
            return Err(InsightsError::EmptySessionBatch);
        }

        let ids = session_ids
            .iter()
            .map(|id| format!("\"{}\"", escape(id)))
            .collect::<Vec<_>>()
            .join(", ");

        let document = format!(
            "{{\n  project(projectId: {project}) {{\n    sessionData {{\n      sessions(sessionIds: [{ids}]) {{\n        resources {{\n          sessionId\n          publisherMinutes\n          subscriberMinutes\n          meetings {{\n            totalCount\n          }}\n        }}\n      }}\n    }}\n  }}\n}}",
            project = self.project_id,
        );

        Ok(Query {
            document,
            shape: QueryShape::SessionDetail,
        })
    }
}

fn validate_range(range: &TimeRange) -> Result<(), InsightsError> {
    if !range.is_valid() {
        return Err(InsightsError::InvalidRange {
            from: range.from,
            to: range.to,
        });
    }
    Ok(())
}

fn validate_filter(filter: &DimensionFilter) -> Result<(), InsightsError> {
    let selections = filter.selections();

    if matches!(filter, DimensionFilter::Composite(_)) && selections.len() < 2 {
        return Err(InsightsError::InvalidFilter {
            dimension: "groupBy",
            value: "composite filter needs at least two dimensions".to_string(),
        });
    }

    for (i, sel) in selections.iter().enumerate() {
        if selections[..i].iter().any(|s| s.dimension == sel.dimension) {
            return Err(InsightsError::InvalidFilter {
                dimension: sel.dimension.filter_arg(),
                value: format!("duplicate {} dimension", sel.dimension.wire_name()),
            });
        }
        for value in &sel.values {
            if value.dimension() != sel.dimension {
                return Err(InsightsError::InvalidFilter {
                    dimension: sel.dimension.filter_arg(),
                    value: value.wire_name().to_string(),
                });
            }
        }
    }
    Ok(())
}

fn resource_fields(filter: &DimensionFilter, interval: Option<Interval>) -> String {
    if interval.is_some() {
        return concat!(
            "        intervalStart\n",
            "        intervalEnd\n",
            "        usage {\n",
            "          streamedPublishedMinutes\n",
            "          streamedSubscribedMinutes\n",
            "        }"
        )
        .to_string();
    }

    use crate::domain::common::Dimension;
    let (label_field, with_attempts) = match filter.bucket_dimension() {
        Some(Dimension::Country) => (Some("country"), false),
        Some(Dimension::Browser) => (Some("browser"), true),
        None => (None, true),
    };

    let channel = |name: &str| {
        if with_attempts {
            format!("        {name} {{\n          attempts\n          failures\n        }}")
        } else {
            format!("        {name} {{\n          failures\n        }}")
        }
    };

    let mut fields = String::new();
    if let Some(label) = label_field {
        fields.push_str(&format!("        {label}\n"));
    }
    fields.push_str(&format!(
        "        errors {{\n{}\n{}\n{}\n        }}",
        channel("connect"),
        channel("publish"),
        channel("subscribe"),
    ));
    fields
}

// Session ids and cursors are opaque strings supplied by the service; keep
// them from breaking out of their quoted GraphQL position.
fn escape(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}
