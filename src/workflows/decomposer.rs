//! Query decomposition and refinement.
//!
//! Both operations ask the model for a JSON plan and degrade rather than fail
//! when the reply is unusable: `decompose` falls back to a one-task-per-stage
//! plan, `refine` keeps the previous plan. Only a failing model call is an
//! error.

use crate::llm::{parse_reply, LLMClient, MalformedReply};
use crate::types::{Decomposition, ResearchOutput, Result};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Gaps quoted back to the model when refining.
const MAX_REFINEMENT_GAPS: usize = 5;

/// Shape of a refinement reply; `complexity` may be omitted.
#[derive(Debug, Deserialize)]
struct RefinementReply {
    #[serde(default)]
    research_queries: Vec<String>,
    #[serde(default)]
    analysis_tasks: Vec<String>,
    #[serde(default)]
    citation_requirements: Vec<String>,
    #[serde(default)]
    complexity: Option<String>,
    #[serde(default)]
    refinement_rationale: Option<String>,
}

/// Turns a user query into a per-stage task plan.
pub struct QueryDecomposer {
    llm: Arc<dyn LLMClient>,
}

impl QueryDecomposer {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self { llm }
    }

    /// Plan research queries, analysis tasks and citation requirements.
    ///
    /// Always returns at least one item per stage when the model call succeeds.
    pub async fn decompose(&self, user_query: &str) -> Result<Decomposition> {
        let reply = self.llm.generate(&decomposition_prompt(user_query)).await?;

        let plan = parse_reply::<Decomposition>(&reply).and_then(|plan| {
            if plan.is_actionable() {
                Ok(plan)
            } else {
                Err(MalformedReply {
                    reason: "decomposition has an empty stage".to_string(),
                })
            }
        });

        match plan {
            Ok(plan) => {
                debug!(
                    research = plan.research_queries.len(),
                    analysis = plan.analysis_tasks.len(),
                    citation = plan.citation_requirements.len(),
                    complexity = %plan.complexity,
                    "query decomposed"
                );
                Ok(plan)
            }
            Err(e) => {
                warn!(error = %e, "decomposition reply unusable, using single-task plan");
                Ok(Decomposition::fallback(user_query))
            }
        }
    }

    /// Ask for a better plan after a pass scored `quality_score`.
    ///
    /// An unusable reply yields `previous` unchanged.
    pub async fn refine(
        &self,
        previous: &Decomposition,
        prior_research: &[ResearchOutput],
        quality_score: f64,
    ) -> Result<Decomposition> {
        let prompt = refinement_prompt(previous, prior_research, quality_score);
        let reply = self.llm.generate(&prompt).await?;

        match parse_reply::<RefinementReply>(&reply) {
            Ok(refined) => {
                let plan = Decomposition {
                    research_queries: refined.research_queries,
                    analysis_tasks: refined.analysis_tasks,
                    citation_requirements: refined.citation_requirements,
                    complexity: refined
                        .complexity
                        .unwrap_or_else(|| previous.complexity.clone()),
                    refinement_rationale: refined.refinement_rationale,
                };
                if plan.is_actionable() {
                    debug!(
                        research = plan.research_queries.len(),
                        rationale = plan.refinement_rationale.as_deref().unwrap_or(""),
                        "decomposition refined"
                    );
                    Ok(plan)
                } else {
                    warn!("refined decomposition has an empty stage, keeping previous plan");
                    Ok(previous.clone())
                }
            }
            Err(e) => {
                warn!(error = %e, "refinement reply unusable, keeping previous plan");
                Ok(previous.clone())
            }
        }
    }
}

fn decomposition_prompt(user_query: &str) -> String {
    format!(
        r#"You are a task decomposition expert. Given a user query about a document collection,
break it down into specific sub-tasks for specialist agents.

User Query: {user_query}

Decompose into:
1. Research queries: What specific information needs to be retrieved?
2. Analysis tasks: What analysis needs to be performed on the data?
3. Citation requirements: What claims need citation validation?

Respond in JSON format:
{{
  "research_queries": ["query1", "query2", ...],
  "analysis_tasks": ["task1", "task2", ...],
  "citation_requirements": ["requirement1", ...],
  "complexity": "simple|moderate|complex"
}}"#
    )
}

fn refinement_prompt(
    previous: &Decomposition,
    prior_research: &[ResearchOutput],
    quality_score: f64,
) -> String {
    let gaps: Vec<&str> = prior_research
        .iter()
        .flat_map(|r| r.information_gaps.iter().map(String::as_str))
        .take(MAX_REFINEMENT_GAPS)
        .collect();
    let gaps = if gaps.is_empty() {
        "none reported".to_string()
    } else {
        gaps.iter()
            .map(|g| format!("- {}", g))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"Previous iteration achieved quality score of {quality_score:.2}.

Research queries: {queries:?}
Analysis tasks: {tasks:?}
Results summary: {count} results retrieved, {sources} sources in total
Known information gaps:
{gaps}

Suggest refined research queries to improve quality. Focus on gaps or missing information.

Respond in JSON format:
{{
  "research_queries": ["refined_query1", ...],
  "analysis_tasks": ["task1", ...],
  "citation_requirements": ["requirement1", ...],
  "refinement_rationale": "explanation"
}}"#,
        queries = previous.research_queries,
        tasks = previous.analysis_tasks,
        count = prior_research.len(),
        sources = prior_research.iter().map(|r| r.sources.len()).sum::<usize>(),
    )
}
