use anyhow::{anyhow, Result};
use std::env;
use tracing::debug;

const DEFAULT_ENDPOINT: &str = "https://insights.opentok.com/graphql";

/// Connection settings for the analytics service.
///
/// Loaded once at process start and injected into
/// [`QueryBuilder`](crate::core::query::QueryBuilder) and
/// [`GraphQlClient`](crate::core::client::GraphQlClient) construction;
/// read-only thereafter.
#[derive(Debug, Clone)]
pub struct InsightsConfig {
    /// Project scope every query is issued against.
    pub project_id: String,
    /// GraphQL endpoint of the analytics service.
    pub endpoint: String,
    /// Bearer token, if the deployment requires one.
    pub api_token: Option<String>,
}

impl InsightsConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_token: None,
        }
    }

    /// Reads `INSIGHTS_PROJECT_ID`, `INSIGHTS_API_ENDPOINT` and
    /// `INSIGHTS_API_TOKEN`, honoring a local `.env` file.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let project_id = env::var("INSIGHTS_PROJECT_ID")
            .map_err(|_| anyhow!("INSIGHTS_PROJECT_ID is not set"))?;

        let endpoint = env::var("INSIGHTS_API_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());

        let api_token = env::var("INSIGHTS_API_TOKEN").ok();

        debug!(%endpoint, "analytics configuration loaded");
        Ok(Self {
            project_id,
            endpoint,
            api_token,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_style_construction() {
        let cfg = InsightsConfig::new("proj-123")
            .with_endpoint("http://localhost:9999/graphql")
            .with_api_token("t0ken");
        assert_eq!(cfg.project_id, "proj-123");
        assert_eq!(cfg.endpoint, "http://localhost:9999/graphql");
        assert_eq!(cfg.api_token.as_deref(), Some("t0ken"));
    }

    #[test]
    fn default_endpoint_applies() {
        let cfg = InsightsConfig::new("proj-123");
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
    }
}
