//! Final answer synthesis.
//!
//! The terminal, human-facing step: all three stage outputs are rendered into
//! one prompt and the model's reply is returned verbatim.

use crate::llm::LLMClient;
use crate::types::{AnalysisOutput, CitationOutput, ResearchOutput, Result};
use std::fmt::Write;
use std::sync::Arc;

pub struct AnswerSynthesizer {
    llm: Arc<dyn LLMClient>,
    /// Characters of each research answer quoted in the prompt
    excerpt_chars: usize,
}

impl AnswerSynthesizer {
    pub fn new(llm: Arc<dyn LLMClient>, excerpt_chars: usize) -> Self {
        Self { llm, excerpt_chars }
    }

    pub async fn synthesize(
        &self,
        user_query: &str,
        research: &[ResearchOutput],
        analysis: &[AnalysisOutput],
        citation: &CitationOutput,
    ) -> Result<String> {
        let prompt = self.prompt(user_query, research, analysis, citation);
        self.llm.generate(&prompt).await
    }

    pub(crate) fn prompt(
        &self,
        user_query: &str,
        research: &[ResearchOutput],
        analysis: &[AnalysisOutput],
        citation: &CitationOutput,
    ) -> String {
        format!(
            r#"You are synthesizing a comprehensive answer to a user query about a document collection.

User Query: {user_query}

Research Results:
{research}

Analysis Results:
{analysis}

Citation Validation:
{citation}

Provide a comprehensive, well-cited answer that:
1. Directly addresses the user's query
2. Incorporates key findings from research
3. Includes relevant analysis insights
4. Properly cites all sources
5. Highlights any limitations or caveats

Answer:"#,
            research = format_research(research, self.excerpt_chars),
            analysis = format_analysis(analysis),
            citation = format_citation(citation),
        )
    }
}

/// Cut `text` to at most `max_chars` characters, marking the cut.
fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

fn format_research(results: &[ResearchOutput], excerpt_chars: usize) -> String {
    let mut out = String::new();
    for (idx, result) in results.iter().enumerate() {
        let _ = writeln!(out, "Research Query {}:", idx + 1);
        let _ = writeln!(out, "  Sources: {} documents", result.sources.len());
        let _ = writeln!(out, "  Answer: {}", excerpt(&result.answer, excerpt_chars));
    }
    out
}

fn format_analysis(results: &[AnalysisOutput]) -> String {
    let mut out = String::new();
    for (idx, result) in results.iter().enumerate() {
        let _ = writeln!(out, "Analysis {} ({}):", idx + 1, result.analysis_type);
        if !result.executive_summary.is_empty() {
            let _ = writeln!(out, "  Summary: {}", result.executive_summary);
        }
        if !result.result.is_null() {
            let _ = writeln!(out, "  Result: {}", result.result);
        }
    }
    out
}

fn format_citation(citation: &CitationOutput) -> String {
    let mut out = format!("Accuracy: {:.2}\n", citation.accuracy);
    if !citation.unsupported.is_empty() {
        out.push_str("Unsupported claims:\n");
        for claim in &citation.unsupported {
            let _ = writeln!(out, "  - {}", claim);
        }
    }
    if !citation.report.is_empty() {
        let _ = writeln!(out, "Report: {}", citation.report);
    }
    out
}
