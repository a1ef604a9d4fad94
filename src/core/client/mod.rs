//! The remote analytics capability: one asynchronous round trip per query.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::RemoteError;

pub mod graphql;

pub use graphql::GraphQlClient;

/// Identifies where a query's response envelope lives in the GraphQL
/// response document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryShape {
    /// `project.projectData`: grouped metric buckets.
    Aggregate,
    /// `project.sessionData.sessionSummaries`: paginated session ids.
    SessionSummary,
    /// `project.sessionData.sessions`: batched per-session details.
    SessionDetail,
}

impl QueryShape {
    fn envelope_pointer(&self) -> &'static str {
        match self {
            QueryShape::Aggregate => "/data/project/projectData",
            QueryShape::SessionSummary => "/data/project/sessionData/sessionSummaries",
            QueryShape::SessionDetail => "/data/project/sessionData/sessions",
        }
    }
}

/// A fully built query, ready to execute. Construction goes through
/// [`QueryBuilder`](crate::core::query::QueryBuilder), which never emits a
/// partially valid document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub document: String,
    pub shape: QueryShape,
}

/// Page-info portion of a paginated response. Carried on the envelope, not
/// on the resource list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub end_cursor: String,
}

/// What every query variant comes back as: an ordered resource list plus,
/// for paginated shapes, the page-info/total-count envelope fields.
#[derive(Debug, Clone, Default)]
pub struct ResponseEnvelope {
    pub resources: Vec<Value>,
    pub page_info: Option<PageInfo>,
    pub total_count: Option<u64>,
}

impl ResponseEnvelope {
    /// Pulls the envelope for `shape` out of a raw GraphQL response body.
    ///
    /// A missing envelope node or resource list decodes to an empty
    /// resource list: the service omits nodes that have no data, and "no
    /// data" is a valid result, not a failure. GraphQL-level errors are
    /// failures.
    pub fn from_response(shape: QueryShape, body: &Value) -> Result<Self, RemoteError> {
        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let message = errors
                    .iter()
                    .filter_map(|e| e.get("message").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(RemoteError::Service(message));
            }
        }

        let node = match body.pointer(shape.envelope_pointer()) {
            Some(node) => node,
            None => return Ok(Self::default()),
        };

        let resources = node
            .get("resources")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let page_info = node
            .pointer("/pageInfo/endCursor")
            .and_then(Value::as_str)
            .map(|cursor| PageInfo {
                end_cursor: cursor.to_string(),
            });

        let total_count = node.get("totalCount").and_then(Value::as_u64);

        Ok(Self {
            resources,
            page_info,
            total_count,
        })
    }

    /// Decodes the resource list into the record type the query shape
    /// promised. A record that does not fit the schema is a remote fault.
    pub fn decode_resources<T: DeserializeOwned>(&self) -> Result<Vec<T>, RemoteError> {
        self.resources
            .iter()
            .map(|value| {
                serde_json::from_value(value.clone())
                    .map_err(|e| RemoteError::Decode(e.to_string()))
            })
            .collect()
    }
}

/// The single capability the query/pagination core needs from the outside
/// world. Production uses [`GraphQlClient`]; tests script responses.
#[async_trait]
pub trait AnalyticsClient: Send + Sync {
    async fn execute(&self, query: &Query) -> Result<ResponseEnvelope, RemoteError>;
}

#[async_trait]
impl<T: AnalyticsClient + ?Sized> AnalyticsClient for std::sync::Arc<T> {
    async fn execute(&self, query: &Query) -> Result<ResponseEnvelope, RemoteError> {
        (**self).execute(query).await
    }
}
