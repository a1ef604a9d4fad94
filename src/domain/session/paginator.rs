//! Cursor-driven fetch loop over the session result set.
//!
//! Each page costs exactly two round trips: one summary query for ids,
//! total count and cursor, then one detail query batching every id of the
//! page. The detail fetch never starts before its summary completes, and a
//! failed fetch leaves the last-good state untouched; retrying is the
//! caller's call.

use tracing::{debug, warn};

use super::dto::{PaginationState, SessionDetail, SessionDetailRecord, SessionSummary};
use crate::core::client::AnalyticsClient;
use crate::core::query::QueryBuilder;
use crate::domain::common::TimeRange;
use crate::errors::{FetchStage, InsightsError};

/// Where the paginator currently stands. Fetching phases cover the initial
/// page and incremental loads alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginatorPhase {
    Idle,
    FetchingSummary,
    FetchingDetail,
    Ready,
    Failed,
}

/// What a `load_more` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMoreOutcome {
    /// A page was fetched and appended.
    Loaded,
    /// The cursor was empty: the result set is exhausted. Not an error.
    NoMorePages,
    /// A previous `load_more` is still in flight; state untouched.
    AlreadyFetching,
}

struct FetchedPage {
    details: Vec<SessionDetail>,
    total_count: u64,
    end_cursor: String,
}

pub struct SessionPaginator<C> {
    client: C,
    builder: QueryBuilder,
    range: Option<TimeRange>,
    state: PaginationState,
    phase: PaginatorPhase,
}

impl<C: AnalyticsClient> SessionPaginator<C> {
    pub fn new(client: C, builder: QueryBuilder) -> Self {
        Self {
            client,
            builder,
            range: None,
            state: PaginationState::default(),
            phase: PaginatorPhase::Idle,
        }
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    pub fn phase(&self) -> PaginatorPhase {
        self.phase
    }

    /// Fetches the first page for `range`, replacing any previous
    /// pagination session. On failure the previous state stays in place so
    /// the table can keep showing a stale-but-valid view.
    pub async fn start(&mut self, range: TimeRange) -> Result<&PaginationState, InsightsError> {
        debug!(from = %range.start_param(), to = %range.end_param(), "starting session pagination");

        match self.fetch_page(&range, None).await {
            Ok(page) => {
                self.range = Some(range);
                self.state = PaginationState {
                    end_cursor: page.end_cursor,
                    total_count: page.total_count,
                    accumulated: page.details,
                    fetching_more: false,
                };
                self.phase = PaginatorPhase::Ready;
                Ok(&self.state)
            }
            Err(err) => {
                warn!(error = %err, "session pagination start failed");
                self.phase = PaginatorPhase::Failed;
                Err(err)
            }
        }
    }

    /// Fetches the next page and appends it. A no-op signalling
    /// [`LoadMoreOutcome::NoMorePages`] once the cursor is exhausted.
    pub async fn load_more(&mut self) -> Result<LoadMoreOutcome, InsightsError> {
        if self.state.fetching_more {
            return Ok(LoadMoreOutcome::AlreadyFetching);
        }
        if !self.state.has_more() {
            debug!("load_more called with exhausted cursor");
            return Ok(LoadMoreOutcome::NoMorePages);
        }
        // has_more implies a successful start, which recorded the range.
        let range = match self.range {
            Some(range) => range,
            None => return Ok(LoadMoreOutcome::NoMorePages),
        };

        let cursor = self.state.end_cursor.clone();
        self.state.fetching_more = true;
        let result = self.fetch_page(&range, Some(cursor.as_str())).await;
        self.state.fetching_more = false;

        match result {
            Ok(page) => {
                self.state.accumulated.extend(page.details);
                self.state.total_count = page.total_count;
                self.state.end_cursor = page.end_cursor;
                self.phase = PaginatorPhase::Ready;
                Ok(LoadMoreOutcome::Loaded)
            }
            Err(err) => {
                warn!(error = %err, "session pagination load_more failed");
                self.phase = PaginatorPhase::Failed;
                Err(err)
            }
        }
    }

    /// Runs one summary+detail fetch pair. Results are staged and only
    /// committed by the caller, so a mid-pair failure cannot leave a
    /// partially updated state behind.
    async fn fetch_page(
        &mut self,
        range: &TimeRange,
        after_cursor: Option<&str>,
    ) -> Result<FetchedPage, InsightsError> {
        self.phase = PaginatorPhase::FetchingSummary;

        let summary_query = self.builder.session_summaries(range, after_cursor)?;
        let envelope = self
            .client
            .execute(&summary_query)
            .await
            .map_err(|e| InsightsError::fetch_failed(FetchStage::Summary, e))?;

        // Count and cursor live in the envelope, not the resource list.
        let total_count = envelope.total_count.unwrap_or(0);
        let summaries: Vec<SessionSummary> = envelope
            .decode_resources()
            .map_err(|e| InsightsError::fetch_failed(FetchStage::Summary, e))?;
        let end_cursor = envelope
            .page_info
            .map(|info| info.end_cursor)
            .unwrap_or_default();

        if summaries.is_empty() {
            // Nothing to look up; issuing an empty-id detail query would be
            // malformed anyway.
            debug!("summary page carried no session ids");
            return Ok(FetchedPage {
                details: Vec::new(),
                total_count,
                end_cursor,
            });
        }

        self.phase = PaginatorPhase::FetchingDetail;

        let ids: Vec<String> = summaries.into_iter().map(|s| s.session_id).collect();
        let detail_query = self.builder.session_details(&ids)?;
        let envelope = self
            .client
            .execute(&detail_query)
            .await
            .map_err(|e| InsightsError::fetch_failed(FetchStage::Detail, e))?;

        let records: Vec<SessionDetailRecord> = envelope
            .decode_resources()
            .map_err(|e| InsightsError::fetch_failed(FetchStage::Detail, e))?;

        debug!(
            ids = ids.len(),
            rows = records.len(),
            total_count,
            "session page fetched"
        );

        Ok(FetchedPage {
            details: records.into_iter().map(SessionDetail::from).collect(),
            total_count,
            end_cursor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InsightsConfig;
    use crate::core::client::{PageInfo, Query, ResponseEnvelope};
    use crate::errors::RemoteError;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MockClient {
        responses: Mutex<VecDeque<Result<ResponseEnvelope, RemoteError>>>,
        calls: Mutex<Vec<Query>>,
    }

    impl MockClient {
        fn push(&self, response: Result<ResponseEnvelope, RemoteError>) {
            self.responses.lock().unwrap().push_back(response);
        }

        fn calls(&self) -> Vec<Query> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AnalyticsClient for MockClient {
        async fn execute(&self, query: &Query) -> Result<ResponseEnvelope, RemoteError> {
            self.calls.lock().unwrap().push(query.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected query")
        }
    }

    fn summary_envelope(ids: &[&str], total: u64, cursor: &str) -> ResponseEnvelope {
        ResponseEnvelope {
            resources: ids.iter().map(|id| json!({ "sessionId": id })).collect(),
            page_info: (!cursor.is_empty()).then(|| PageInfo {
                end_cursor: cursor.to_string(),
            }),
            total_count: Some(total),
        }
    }

    fn detail_envelope(ids: &[&str]) -> ResponseEnvelope {
        ResponseEnvelope {
            resources: ids
                .iter()
                .map(|id| {
                    json!({
                        "sessionId": id,
                        "publisherMinutes": 1.5,
                        "subscriberMinutes": 2.25,
                        "meetings": { "totalCount": 1 }
                    })
                })
                .collect(),
            page_info: None,
            total_count: None,
        }
    }

    fn paginator(client: Arc<MockClient>) -> SessionPaginator<Arc<MockClient>> {
        let builder = QueryBuilder::new(&InsightsConfig::new("46292342"));
        SessionPaginator::new(client, builder)
    }

    fn range() -> TimeRange {
        TimeRange::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn empty_summary_short_circuits_without_detail_query() {
        let client = Arc::new(MockClient::default());
        client.push(Ok(ResponseEnvelope::default()));

        let mut paginator = paginator(client.clone());
        let state = paginator.start(range()).await.unwrap();

        assert!(state.accumulated.is_empty());
        assert_eq!(state.total_count, 0);
        assert_eq!(state.end_cursor, "");
        // Only the summary query went out.
        assert_eq!(client.calls().len(), 1);
        assert_eq!(paginator.phase(), PaginatorPhase::Ready);
    }

    #[tokio::test]
    async fn first_page_accumulates_and_keeps_cursor() {
        let client = Arc::new(MockClient::default());
        client.push(Ok(summary_envelope(&["s1", "s2"], 5, "c1")));
        client.push(Ok(detail_envelope(&["s1", "s2"])));

        let mut paginator = paginator(client.clone());
        let state = paginator.start(range()).await.unwrap();

        assert_eq!(state.accumulated.len(), 2);
        assert_eq!(state.total_count, 5);
        assert_eq!(state.end_cursor, "c1");
        assert!(state.has_more());

        let calls = client.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].document.contains("sessionIds: [\"s1\", \"s2\"]"));
    }

    #[tokio::test]
    async fn load_more_threads_cursor_and_appends() {
        let client = Arc::new(MockClient::default());
        client.push(Ok(summary_envelope(&["s1", "s2"], 3, "c1")));
        client.push(Ok(detail_envelope(&["s1", "s2"])));
        client.push(Ok(summary_envelope(&["s3"], 3, "")));
        client.push(Ok(detail_envelope(&["s3"])));

        let mut paginator = paginator(client.clone());
        paginator.start(range()).await.unwrap();

        let outcome = paginator.load_more().await.unwrap();
        assert_eq!(outcome, LoadMoreOutcome::Loaded);

        let state = paginator.state();
        assert_eq!(state.accumulated.len(), 3);
        assert_eq!(state.accumulated[2].session_id, "s3");
        assert_eq!(state.end_cursor, "");
        assert!(!state.fetching_more);

        let calls = client.calls();
        assert!(calls[2].document.contains("after: \"c1\""));

        // Cursor exhausted: further loads are no-ops.
        let outcome = paginator.load_more().await.unwrap();
        assert_eq!(outcome, LoadMoreOutcome::NoMorePages);
        assert_eq!(client.calls().len(), 4);
    }

    #[tokio::test]
    async fn load_more_before_start_is_a_no_op() {
        let client = Arc::new(MockClient::default());
        let mut paginator = paginator(client.clone());

        let outcome = paginator.load_more().await.unwrap();
        assert_eq!(outcome, LoadMoreOutcome::NoMorePages);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_detail_fetch_leaves_last_good_state() {
        // Capture the warn-level traffic this path emits (only once).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
            .with_test_writer()
            .try_init();

        let client = Arc::new(MockClient::default());
        client.push(Ok(summary_envelope(&["s1", "s2"], 5, "c1")));
        client.push(Ok(detail_envelope(&["s1", "s2"])));
        client.push(Ok(summary_envelope(&["s3"], 5, "c2")));
        client.push(Err(RemoteError::Transport("connection reset".into())));

        let mut paginator = paginator(client.clone());
        paginator.start(range()).await.unwrap();

        let err = paginator.load_more().await.unwrap_err();
        assert!(matches!(
            err,
            InsightsError::FetchFailed {
                stage: FetchStage::Detail,
                ..
            }
        ));

        let state = paginator.state();
        assert_eq!(state.accumulated.len(), 2);
        assert_eq!(state.end_cursor, "c1");
        assert!(!state.fetching_more);
        assert_eq!(paginator.phase(), PaginatorPhase::Failed);
    }

    #[tokio::test]
    async fn failed_summary_on_restart_keeps_previous_state() {
        let client = Arc::new(MockClient::default());
        client.push(Ok(summary_envelope(&["s1"], 1, "")));
        client.push(Ok(detail_envelope(&["s1"])));
        client.push(Err(RemoteError::Status {
            status: 502,
            body: "bad gateway".into(),
        }));

        let mut paginator = paginator(client.clone());
        paginator.start(range()).await.unwrap();

        let err = paginator.start(range()).await.unwrap_err();
        assert!(matches!(
            err,
            InsightsError::FetchFailed {
                stage: FetchStage::Summary,
                ..
            }
        ));
        assert_eq!(paginator.state().accumulated.len(), 1);
        assert_eq!(paginator.phase(), PaginatorPhase::Failed);
    }

    #[tokio::test]
    async fn detail_rows_are_rounded_and_zero_filled() {
        let client = Arc::new(MockClient::default());
        client.push(Ok(summary_envelope(&["s1"], 1, "")));
        client.push(Ok(ResponseEnvelope {
            resources: vec![json!({ "sessionId": "s1", "publisherMinutes": 0.123456 })],
            page_info: None,
            total_count: None,
        }));

        let mut paginator = paginator(client.clone());
        let state = paginator.start(range()).await.unwrap();

        let row = &state.accumulated[0];
        assert_eq!(row.publisher_minutes, 0.1235);
        assert_eq!(row.subscriber_minutes, 0.0);
        assert_eq!(row.meeting_count, 0);
    }
}
