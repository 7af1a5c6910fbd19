//! Quality scoring for one pipeline pass.
//!
//! ```text
//! source_term      = min(total_sources / source_target, 1)
//! citation_term    = citation.accuracy
//! completeness     = completed analyses / max(1, analyses)
//! score            = w_sources * source_term + w_citation * citation_term
//!                  + w_completeness * completeness
//! ```
//!
//! Each term is clamped to `[0, 1]` before weighting, so with weights summing
//! to one the score is bounded to `[0, 1]` as well.

use crate::types::{AnalysisOutput, CitationOutput, ResearchOutput};
use serde::{Deserialize, Serialize};

/// Scores a completed pass. The convergence loop compares the result against
/// its threshold and keeps the best pass.
pub trait QualityScorer: Send + Sync {
    fn score(
        &self,
        research: &[ResearchOutput],
        analysis: &[AnalysisOutput],
        citation: &CitationOutput,
    ) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityWeights {
    #[serde(default = "default_sources_weight")]
    pub sources: f64,

    #[serde(default = "default_citation_weight")]
    pub citation: f64,

    #[serde(default = "default_completeness_weight")]
    pub completeness: f64,

    /// Source count at which the coverage term saturates
    #[serde(default = "default_source_target")]
    pub source_target: usize,
}

fn default_sources_weight() -> f64 {
    0.30
}

fn default_citation_weight() -> f64 {
    0.50
}

fn default_completeness_weight() -> f64 {
    0.20
}

fn default_source_target() -> usize {
    10
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            sources: default_sources_weight(),
            citation: default_citation_weight(),
            completeness: default_completeness_weight(),
            source_target: default_source_target(),
        }
    }
}

impl QualityWeights {
    pub fn validate(&self) -> Result<(), String> {
        let weights = [self.sources, self.citation, self.completeness];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("quality weights must be finite and non-negative".to_string());
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(format!("quality weights must sum to 1.0, got {}", sum));
        }
        if self.source_target == 0 {
            return Err("quality.source_target must be positive".to_string());
        }
        Ok(())
    }
}

/// NaN counts as zero.
fn unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// The weighted coverage / citation / completeness heuristic.
#[derive(Debug, Clone, Default)]
pub struct WeightedQualityScorer {
    weights: QualityWeights,
}

impl WeightedQualityScorer {
    pub fn new(weights: QualityWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &QualityWeights {
        &self.weights
    }
}

impl QualityScorer for WeightedQualityScorer {
    fn score(
        &self,
        research: &[ResearchOutput],
        analysis: &[AnalysisOutput],
        citation: &CitationOutput,
    ) -> f64 {
        let total_sources: usize = research.iter().map(|r| r.sources.len()).sum();
        let source_term = unit(total_sources as f64 / self.weights.source_target as f64);

        let citation_term = unit(citation.accuracy);

        let completed = analysis.iter().filter(|a| a.is_completed()).count();
        let completeness_term = unit(completed as f64 / analysis.len().max(1) as f64);

        let score = self.weights.sources * source_term
            + self.weights.citation * citation_term
            + self.weights.completeness * completeness_term;

        unit(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::toml_config::WorkflowSettings;
    use serde_json::json;

    fn research_with_sources(n: usize) -> ResearchOutput {
        ResearchOutput {
            sources: (0..n).map(|i| json!({"fileName": format!("doc{}.pdf", i)})).collect(),
            answer: "answer".to_string(),
            ..Default::default()
        }
    }

    fn analysis(status: &str) -> AnalysisOutput {
        AnalysisOutput {
            status: Some(status.to_string()),
            ..Default::default()
        }
    }

    fn citation(accuracy: f64) -> CitationOutput {
        CitationOutput {
            accuracy,
            ..Default::default()
        }
    }

    #[test]
    fn test_formula() {
        let scorer = WeightedQualityScorer::default();
        // 5 sources -> 0.5, accuracy 0.8, 1 of 2 analyses completed -> 0.5
        let score = scorer.score(
            &[research_with_sources(2), research_with_sources(3)],
            &[analysis("completed"), analysis("error")],
            &citation(0.8),
        );
        let expected = 0.3 * 0.5 + 0.5 * 0.8 + 0.2 * 0.5;
        assert!((score - expected).abs() < 1e-9, "score {}", score);
    }

    #[test]
    fn test_source_term_saturates() {
        let scorer = WeightedQualityScorer::default();
        let ten = scorer.score(&[research_with_sources(10)], &[], &citation(0.0));
        let fifty = scorer.score(&[research_with_sources(50)], &[], &citation(0.0));
        assert!((ten - 0.3).abs() < 1e-9);
        assert_eq!(ten, fifty);
    }

    #[test]
    fn test_monotonic_in_citation_accuracy() {
        let scorer = WeightedQualityScorer::default();
        let research = [research_with_sources(4)];
        let analyses = [analysis("completed")];
        let low = scorer.score(&research, &analyses, &citation(0.2));
        let high = scorer.score(&research, &analyses, &citation(0.9));
        assert!(high > low);
        assert!((high - low - 0.5 * 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_bounded_for_out_of_range_inputs() {
        let scorer = WeightedQualityScorer::default();
        let research = [research_with_sources(100)];
        let analyses = [analysis("completed")];

        let over = scorer.score(&research, &analyses, &citation(7.5));
        assert!((over - 1.0).abs() < 1e-9);

        let under = scorer.score(&[], &[], &citation(-3.0));
        assert_eq!(under, 0.0);

        let nan = scorer.score(&[], &[], &citation(f64::NAN));
        assert_eq!(nan, 0.0);
    }

    #[test]
    fn test_analysis_without_status_is_not_credited() {
        let scorer = WeightedQualityScorer::default();
        let bare: AnalysisOutput = serde_json::from_value(json!({
            "analysisType": "comparison",
            "result": {"delta": 0.5},
            "executiveSummary": "Fund III is cheaper"
        }))
        .unwrap();
        assert!(!bare.is_completed());

        let research = [research_with_sources(10)];
        let capped = scorer.score(&research, &[bare], &citation(1.0));
        assert!((capped - 0.8).abs() < 1e-9);
        assert!(capped < WorkflowSettings::default().quality_threshold);

        let full = scorer.score(&research, &[analysis("completed")], &citation(1.0));
        assert!((full - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_analysis_counts_as_incomplete() {
        let scorer = WeightedQualityScorer::default();
        assert_eq!(scorer.score(&[], &[], &citation(0.0)), 0.0);
    }

    #[test]
    fn test_weights_validation() {
        assert!(QualityWeights::default().validate().is_ok());

        let unbalanced = QualityWeights {
            sources: 0.5,
            ..Default::default()
        };
        assert!(unbalanced.validate().is_err());

        let negative = QualityWeights {
            sources: -0.2,
            citation: 1.0,
            completeness: 0.2,
            source_target: 10,
        };
        assert!(negative.validate().is_err());

        let no_target = QualityWeights {
            source_target: 0,
            ..Default::default()
        };
        assert!(no_target.validate().is_err());
    }
}
