//! Session wire records and the pagination aggregate.

use serde::{Deserialize, Serialize};

use crate::core::util::round::round;

/// Minimal identity from the summary page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingCounts {
    pub total_count: Option<u64>,
}

/// Raw per-session detail record; counters may be absent for sessions that
/// never carried traffic.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetailRecord {
    pub session_id: String,
    pub publisher_minutes: Option<f64>,
    pub subscriber_minutes: Option<f64>,
    pub meetings: Option<MeetingCounts>,
}

/// Display-ready session row: zero-filled, minutes rounded to the 4 decimal
/// places the session table shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    pub session_id: String,
    pub publisher_minutes: f64,
    pub subscriber_minutes: f64,
    pub meeting_count: u64,
}

impl From<SessionDetailRecord> for SessionDetail {
    fn from(record: SessionDetailRecord) -> Self {
        Self {
            session_id: record.session_id,
            publisher_minutes: round(record.publisher_minutes.unwrap_or(0.0), 4),
            subscriber_minutes: round(record.subscriber_minutes.unwrap_or(0.0), 4),
            meeting_count: record.meetings.and_then(|m| m.total_count).unwrap_or(0),
        }
    }
}

/// Everything the session table needs. Owned exclusively by
/// [`SessionPaginator`](crate::domain::session::SessionPaginator) and only
/// ever updated whole-page at a time; `accumulated.len() <= total_count`
/// and an empty `end_cursor` is terminal.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub end_cursor: String,
    pub total_count: u64,
    pub accumulated: Vec<SessionDetail>,
    pub fetching_more: bool,
}

impl PaginationState {
    pub fn has_more(&self) -> bool {
        !self.end_cursor.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detail_record_zero_fills_and_rounds() {
        let record: SessionDetailRecord = serde_json::from_value(json!({
            "sessionId": "s1",
            "publisherMinutes": 1.23456789,
            "meetings": { "totalCount": 3 }
        }))
        .unwrap();

        let detail = SessionDetail::from(record);
        assert_eq!(detail.publisher_minutes, 1.2346);
        assert_eq!(detail.subscriber_minutes, 0.0);
        assert_eq!(detail.meeting_count, 3);
    }

    #[test]
    fn absent_meetings_group_counts_as_zero() {
        let record: SessionDetailRecord =
            serde_json::from_value(json!({ "sessionId": "s2" })).unwrap();
        assert_eq!(SessionDetail::from(record).meeting_count, 0);
    }

    #[test]
    fn empty_cursor_means_exhausted() {
        let state = PaginationState::default();
        assert!(!state.has_more());

        let state = PaginationState {
            end_cursor: "c1".into(),
            ..Default::default()
        };
        assert!(state.has_more());
    }
}
