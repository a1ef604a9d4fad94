//! Zero-fill normalization of raw metric buckets.
//!
//! The analytics service omits any nested group that has no data, so every
//! optional level here defaults to 0 independently. This is a total function:
//! normalization never fails, and it must run on every record before the
//! record reaches series aggregation, so that the presentation layer never
//! has to tell "absent" apart from "zero".

use super::dto::{ChannelCounters, MetricRecord, NormalizedMetric};

fn attempts(channel: &Option<ChannelCounters>) -> u64 {
    channel.as_ref().and_then(|c| c.attempts).unwrap_or(0)
}

fn failures(channel: &Option<ChannelCounters>) -> u64 {
    channel.as_ref().and_then(|c| c.failures).unwrap_or(0)
}

/// Resolves every nested optional path of `record` to a number.
pub fn normalize(record: &MetricRecord) -> NormalizedMetric {
    let errors = record.errors.as_ref();
    let connect = errors.map(|e| &e.connect);
    let publish = errors.map(|e| &e.publish);
    let subscribe = errors.map(|e| &e.subscribe);

    NormalizedMetric {
        connect_attempts: connect.map(attempts).unwrap_or(0),
        connect_failures: connect.map(failures).unwrap_or(0),
        publish_attempts: publish.map(attempts).unwrap_or(0),
        publish_failures: publish.map(failures).unwrap_or(0),
        subscribe_attempts: subscribe.map(attempts).unwrap_or(0),
        subscribe_failures: subscribe.map(failures).unwrap_or(0),
        published_minutes: record
            .usage
            .as_ref()
            .and_then(|u| u.streamed_published_minutes)
            .unwrap_or(0.0),
        subscribed_minutes: record
            .usage
            .as_ref()
            .and_then(|u| u.streamed_subscribed_minutes)
            .unwrap_or(0.0),
    }
}
