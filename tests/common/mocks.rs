//! Mock implementations for testing.
//!
//! Hand-written stand-ins for the text-generation client, the three
//! specialist capabilities and the quality scorer, shared across the
//! integration test files.

#![allow(dead_code)]

use async_trait::async_trait;
use docintel::capabilities::{
    AnalysisCapability, CitationCapability, ResearchCapability, ResearchRequest,
};
use docintel::llm::LLMClient;
use docintel::types::{
    AnalysisOutput, AppError, CitationOutput, ResearchOutput, Result, TaskKind,
};
use docintel::workflows::QualityScorer;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// LLM client that replays queued replies and records every prompt.
///
/// Once the queue is empty it keeps answering with the default reply.
pub struct ScriptedLLM {
    replies: Mutex<VecDeque<String>>,
    default_reply: String,
    prompts: Mutex<Vec<String>>,
    should_fail: bool,
}

impl ScriptedLLM {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            default_reply: "Synthesized answer".to_string(),
            prompts: Mutex::new(Vec::new()),
            should_fail: false,
        }
    }

    /// A client whose every call fails.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new(Vec::<String>::new())
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LLMClient for ScriptedLLM {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default_reply.clone()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// A decomposition reply as a model would produce it.
pub fn decomposition_reply(research: &[&str], analysis: &[&str], citation: &[&str]) -> String {
    format!(
        "Here is the plan:\n```json\n{}\n```",
        json!({
            "research_queries": research,
            "analysis_tasks": analysis,
            "citation_requirements": citation,
            "complexity": "moderate"
        })
    )
}

/// A refinement reply carrying new research queries.
pub fn refinement_reply(research: &[&str]) -> String {
    json!({
        "research_queries": research,
        "analysis_tasks": ["Compare findings"],
        "citation_requirements": ["Validate figures"],
        "refinement_rationale": "fill the gaps"
    })
    .to_string()
}

/// Calls observed by [`RecordingCapabilities`], in dispatch order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Research(String),
    Analysis(String),
    Citation,
}

/// Deterministic specialist service that records every call.
///
/// Research answers are `"answer for <query>"` with one source each, which
/// makes it easy to tell which pass a synthesized prompt was built from.
pub struct RecordingCapabilities {
    calls: Mutex<Vec<Call>>,
    /// Research answers the citation stage received, per call
    citation_inputs: Mutex<Vec<Vec<String>>>,
    research_delays: HashMap<String, Duration>,
    fail_research: Option<String>,
    fail_analysis: bool,
    fail_citation: bool,
    accuracy: f64,
}

impl Default for RecordingCapabilities {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            citation_inputs: Mutex::new(Vec::new()),
            research_delays: HashMap::new(),
            fail_research: None,
            fail_analysis: false,
            fail_citation: false,
            accuracy: 0.9,
        }
    }
}

impl RecordingCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay the research call for `query` before it answers.
    pub fn with_research_delay(mut self, query: &str, delay: Duration) -> Self {
        self.research_delays.insert(query.to_string(), delay);
        self
    }

    /// Fail the research call for `query`.
    pub fn failing_research(mut self, query: &str) -> Self {
        self.fail_research = Some(query.to_string());
        self
    }

    pub fn failing_analysis(mut self) -> Self {
        self.fail_analysis = true;
        self
    }

    pub fn failing_citation(mut self) -> Self {
        self.fail_citation = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn research_queries(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Research(q) => Some(q),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, kind: TaskKind) -> usize {
        self.calls()
            .iter()
            .filter(|c| {
                matches!(
                    (c, kind),
                    (Call::Research(_), TaskKind::Research)
                        | (Call::Analysis(_), TaskKind::Analysis)
                        | (Call::Citation, TaskKind::Citation)
                )
            })
            .count()
    }

    pub fn citation_inputs(&self) -> Vec<Vec<String>> {
        self.citation_inputs.lock().unwrap().clone()
    }
}

fn failure(capability: TaskKind, message: &str) -> AppError {
    AppError::Capability {
        capability,
        message: message.to_string(),
    }
}

#[async_trait]
impl ResearchCapability for RecordingCapabilities {
    async fn research(&self, request: &ResearchRequest) -> Result<ResearchOutput> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Research(request.query.clone()));

        if let Some(delay) = self.research_delays.get(&request.query) {
            tokio::time::sleep(*delay).await;
        }
        if self.fail_research.as_deref() == Some(request.query.as_str()) {
            return Err(failure(TaskKind::Research, "index unavailable"));
        }

        Ok(ResearchOutput {
            sources: vec![json!({"fileName": format!("{}.pdf", request.query)})],
            answer: format!("answer for {}", request.query),
            information_gaps: vec![format!("gap in {}", request.query)],
            ..Default::default()
        })
    }
}

#[async_trait]
impl AnalysisCapability for RecordingCapabilities {
    async fn analyze(&self, task: &str, context: &[ResearchOutput]) -> Result<AnalysisOutput> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Analysis(task.to_string()));

        if self.fail_analysis {
            return Err(failure(TaskKind::Analysis, "analysis model crashed"));
        }

        Ok(AnalysisOutput {
            status: Some("completed".to_string()),
            analysis_type: "comparison".to_string(),
            result: json!({"inputs": context.len()}),
            executive_summary: format!("{} over {} results", task, context.len()),
            ..Default::default()
        })
    }
}

#[async_trait]
impl CitationCapability for RecordingCapabilities {
    async fn validate(
        &self,
        _analysis: &[AnalysisOutput],
        research: &[ResearchOutput],
    ) -> Result<CitationOutput> {
        self.calls.lock().unwrap().push(Call::Citation);
        self.citation_inputs
            .lock()
            .unwrap()
            .push(research.iter().map(|r| r.answer.clone()).collect());

        if self.fail_citation {
            return Err(failure(TaskKind::Citation, "validator timed out"));
        }

        Ok(CitationOutput {
            accuracy: self.accuracy,
            report: "all claims supported".to_string(),
            ..Default::default()
        })
    }
}

/// Scorer that returns a fixed sequence of scores, one per pass.
pub struct ScriptedScorer {
    scores: Mutex<VecDeque<f64>>,
    /// Research answers of every pass it scored
    seen: Mutex<Vec<Vec<String>>>,
}

impl ScriptedScorer {
    pub fn new(scores: &[f64]) -> Self {
        Self {
            scores: Mutex::new(scores.iter().copied().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn seen(&self) -> Vec<Vec<String>> {
        self.seen.lock().unwrap().clone()
    }
}

impl QualityScorer for ScriptedScorer {
    fn score(
        &self,
        research: &[ResearchOutput],
        _analysis: &[AnalysisOutput],
        _citation: &CitationOutput,
    ) -> f64 {
        self.seen
            .lock()
            .unwrap()
            .push(research.iter().map(|r| r.answer.clone()).collect());
        self.scores.lock().unwrap().pop_front().unwrap_or(0.0)
    }
}
