//! Wire DTOs for grouped metric buckets and their normalized form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attempt/failure counters for one channel (connect, publish or subscribe).
/// Either counter may be absent when the bucket saw no traffic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelCounters {
    pub attempts: Option<u64>,
    pub failures: Option<u64>,
}

/// Per-channel error groups. Channels the query did not request, or that
/// carried no data, are simply absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorGroups {
    pub connect: Option<ChannelCounters>,
    pub publish: Option<ChannelCounters>,
    pub subscribe: Option<ChannelCounters>,
}

/// Streamed-minute usage counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageCounters {
    pub streamed_published_minutes: Option<f64>,
    pub streamed_subscribed_minutes: Option<f64>,
}

/// One bucket of the aggregate response. Every field is optional: an absent
/// field means "no data for this bucket", never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    pub interval_start: Option<DateTime<Utc>>,
    pub interval_end: Option<DateTime<Utc>>,
    pub browser: Option<String>,
    pub country: Option<String>,
    pub errors: Option<ErrorGroups>,
    pub usage: Option<UsageCounters>,
}

/// Typed path into a [`NormalizedMetric`], used by dataset specs to pick the
/// value series for a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricField {
    ConnectAttempts,
    ConnectFailures,
    PublishAttempts,
    PublishFailures,
    SubscribeAttempts,
    SubscribeFailures,
    PublishedMinutes,
    SubscribedMinutes,
}

/// [`MetricRecord`] with every nested optional resolved to a number.
/// Absent and zero are indistinguishable past this point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedMetric {
    pub connect_attempts: u64,
    pub connect_failures: u64,
    pub publish_attempts: u64,
    pub publish_failures: u64,
    pub subscribe_attempts: u64,
    pub subscribe_failures: u64,
    pub published_minutes: f64,
    pub subscribed_minutes: f64,
}

impl NormalizedMetric {
    pub fn field(&self, field: MetricField) -> f64 {
        match field {
            MetricField::ConnectAttempts => self.connect_attempts as f64,
            MetricField::ConnectFailures => self.connect_failures as f64,
            MetricField::PublishAttempts => self.publish_attempts as f64,
            MetricField::PublishFailures => self.publish_failures as f64,
            MetricField::SubscribeAttempts => self.subscribe_attempts as f64,
            MetricField::SubscribeFailures => self.subscribe_failures as f64,
            MetricField::PublishedMinutes => self.published_minutes,
            MetricField::SubscribedMinutes => self.subscribed_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_deserializes_with_partial_nesting() {
        let record: MetricRecord = serde_json::from_value(json!({
            "browser": "CHROME",
            "errors": { "connect": { "attempts": 10 } }
        }))
        .unwrap();

        assert_eq!(record.browser.as_deref(), Some("CHROME"));
        let errors = record.errors.unwrap();
        assert_eq!(errors.connect.unwrap().attempts, Some(10));
        assert!(errors.publish.is_none());
        assert!(record.usage.is_none());
    }

    #[test]
    fn usage_counters_use_camel_case() {
        let record: MetricRecord = serde_json::from_value(json!({
            "intervalStart": "2024-03-01T00:00:00Z",
            "usage": { "streamedPublishedMinutes": 12.5 }
        }))
        .unwrap();

        let usage = record.usage.unwrap();
        assert_eq!(usage.streamed_published_minutes, Some(12.5));
        assert_eq!(usage.streamed_subscribed_minutes, None);
        assert!(record.interval_start.is_some());
    }
}
