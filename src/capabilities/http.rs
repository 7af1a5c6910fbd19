use super::{AnalysisCapability, CitationCapability, ResearchCapability, ResearchRequest};
use crate::types::{AnalysisOutput, AppError, CitationOutput, ResearchOutput, Result, TaskKind};
use crate::utils::toml_config::CapabilitiesConfig;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
struct AnalysisBody<'a> {
    task: &'a str,
    context: &'a [ResearchOutput],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CitationBody<'a> {
    analysis_results: &'a [AnalysisOutput],
    research_results: &'a [ResearchOutput],
}

/// Calls a remote specialist service that exposes one JSON endpoint per capability.
///
/// Any timeout policy lives here, in the HTTP client, not in the orchestrator.
pub struct HttpCapabilities {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    research_path: String,
    analysis_path: String,
    citation_path: String,
}

impl HttpCapabilities {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            research_path: "/research".to_string(),
            analysis_path: "/analysis".to_string(),
            citation_path: "/citation".to_string(),
        })
    }

    /// Build from the `[capabilities]` config section, resolving the API key env var.
    pub fn from_config(config: &CapabilitiesConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        let mut client = Self::new(
            config.base_url.clone(),
            api_key,
            Duration::from_secs(config.timeout_secs),
        )?;
        client.research_path = config.research_path.clone();
        client.analysis_path = config.analysis_path.clone();
        client.citation_path = config.citation_path.clone();
        Ok(client)
    }

    async fn post<B, R>(&self, kind: TaskKind, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let fail = |message: String| AppError::Capability {
            capability: kind,
            message,
        };

        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.post(&url).json(body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        tracing::debug!(capability = %kind, %url, "calling capability");

        let response = request
            .send()
            .await
            .map_err(|e| fail(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(fail(format!("{} returned {}: {}", url, status, body)));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| fail(format!("invalid response from {}: {}", url, e)))
    }
}

#[async_trait]
impl ResearchCapability for HttpCapabilities {
    async fn research(&self, request: &ResearchRequest) -> Result<ResearchOutput> {
        self.post(TaskKind::Research, &self.research_path, request)
            .await
    }
}

#[async_trait]
impl AnalysisCapability for HttpCapabilities {
    async fn analyze(&self, task: &str, context: &[ResearchOutput]) -> Result<AnalysisOutput> {
        let body = AnalysisBody { task, context };
        self.post(TaskKind::Analysis, &self.analysis_path, &body)
            .await
    }
}

#[async_trait]
impl CitationCapability for HttpCapabilities {
    async fn validate(
        &self,
        analysis: &[AnalysisOutput],
        research: &[ResearchOutput],
    ) -> Result<CitationOutput> {
        let body = CitationBody {
            analysis_results: analysis,
            research_results: research,
        };
        self.post(TaskKind::Citation, &self.citation_path, &body)
            .await
    }
}
