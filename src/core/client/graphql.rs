use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{AnalyticsClient, Query, ResponseEnvelope};
use crate::config::InsightsConfig;
use crate::errors::RemoteError;

/// Production [`AnalyticsClient`]: posts each query document to the
/// configured GraphQL endpoint, one round trip per call.
#[derive(Debug, Clone)]
pub struct GraphQlClient {
    http: Client,
    endpoint: String,
    api_token: Option<String>,
}

impl GraphQlClient {
    pub fn new(config: &InsightsConfig) -> Result<Self, RemoteError> {
        let http = Client::builder()
            .build()
            .map_err(|e| RemoteError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_token: config.api_token.clone(),
        })
    }
}

#[async_trait::async_trait]
impl AnalyticsClient for GraphQlClient {
    async fn execute(&self, query: &Query) -> Result<ResponseEnvelope, RemoteError> {
        debug!(shape = ?query.shape, endpoint = %self.endpoint, "executing analytics query");

        let mut request = self
            .http
            .post(&self.endpoint)
            .json(&serde_json::json!({ "query": query.document }));
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Transport(format!("{} (url={})", e, self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;

        ResponseEnvelope::from_response(query.shape, &body)
    }
}
