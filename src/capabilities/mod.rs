//! Specialist Capabilities
//!
//! The orchestrator dispatches work to three external specialists. How they
//! search, reason or validate is not this crate's concern; it only relies on
//! the call shapes below. Implementations must be safe to call repeatedly
//! with the same input and must tolerate concurrent calls (the parallel
//! strategy fans out research requests).
//!
//! - [`ResearchCapability`] - retrieves sources and an answer for one query
//! - [`AnalysisCapability`] - analyses the complete research set for one task
//! - [`CitationCapability`] - validates analysis claims against research sources
//!
//! [`http::HttpCapabilities`] implements all three against a JSON service.

/// JSON-over-HTTP adapter for remote specialist services.
pub mod http;

use crate::types::{AnalysisOutput, CitationOutput, ResearchOutput, Result, SearchMode};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Parameters of one research call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResearchRequest {
    pub query: String,
    pub mode: SearchMode,
    /// Restrict retrieval to these file names.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "fileNames")]
    pub file_filter: Option<Vec<String>>,
}

#[async_trait]
pub trait ResearchCapability: Send + Sync {
    async fn research(&self, request: &ResearchRequest) -> Result<ResearchOutput>;
}

#[async_trait]
pub trait AnalysisCapability: Send + Sync {
    /// `context` is the full research set of the current pass, in decomposition order.
    ///
    /// Implementations must set `status` to `"completed"` on success; the
    /// quality score only credits analyses that do.
    async fn analyze(&self, task: &str, context: &[ResearchOutput]) -> Result<AnalysisOutput>;
}

#[async_trait]
pub trait CitationCapability: Send + Sync {
    async fn validate(
        &self,
        analysis: &[AnalysisOutput],
        research: &[ResearchOutput],
    ) -> Result<CitationOutput>;
}

/// The three specialists a coordinator cannot run without.
#[derive(Clone)]
pub struct Capabilities {
    pub research: Arc<dyn ResearchCapability>,
    pub analysis: Arc<dyn AnalysisCapability>,
    pub citation: Arc<dyn CitationCapability>,
}

impl Capabilities {
    pub fn new(
        research: Arc<dyn ResearchCapability>,
        analysis: Arc<dyn AnalysisCapability>,
        citation: Arc<dyn CitationCapability>,
    ) -> Self {
        Self {
            research,
            analysis,
            citation,
        }
    }

    /// Use one service for all three capabilities.
    pub fn from_service<S>(service: Arc<S>) -> Self
    where
        S: ResearchCapability + AnalysisCapability + CitationCapability + 'static,
    {
        Self {
            research: service.clone(),
            analysis: service.clone(),
            citation: service,
        }
    }
}
