//! Top-level entry point for a document query.
//!
//! The coordinator owns one [`WorkflowExecution`] per `execute` call and walks
//! it through decompose -> strategy -> synthesize. Capabilities are injected at
//! construction; there is no way to build a coordinator without them.

use super::decomposer::QueryDecomposer;
use super::quality::{QualityScorer, WeightedQualityScorer};
use super::strategy::{ExecutionStrategy, StageRunner};
use super::synthesizer::AnswerSynthesizer;
use crate::capabilities::Capabilities;
use crate::llm::LLMClient;
use crate::types::{
    AppError, ConvergenceReport, ExecutionPattern, Result, StagePipelineResult, TaskSummary,
    WorkflowExecution, WorkflowResult,
};
use crate::utils::toml_config::WorkflowSettings;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};

/// What a finished workflow hands back to its caller.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowOutput {
    pub workflow_id: String,
    pub pattern: ExecutionPattern,
    pub answer: String,
    pub total_tasks: usize,
    pub duration_ms: u64,
    /// Passes run: the loop count for `loop`, otherwise 1
    pub iterations: u32,
    pub tasks: Vec<TaskSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convergence: Option<ConvergenceReport>,
    /// Stage results the answer was synthesized from
    pub stages: StagePipelineResult,
    /// The finalized execution record, for callers that archive runs
    #[serde(skip)]
    pub execution: WorkflowExecution,
}

impl WorkflowOutput {
    fn from_execution(execution: WorkflowExecution) -> Result<Self> {
        let WorkflowResult {
            answer,
            stages,
            convergence,
        } = execution.final_result().cloned().ok_or_else(|| {
            AppError::Internal(format!("Workflow '{}' was not finalized", execution.id))
        })?;

        let iterations = match execution.pattern {
            ExecutionPattern::Loop => execution.iteration,
            _ => 1,
        };

        Ok(Self {
            workflow_id: execution.id.clone(),
            pattern: execution.pattern,
            answer,
            total_tasks: execution.tasks().len(),
            duration_ms: execution.duration_ms(),
            iterations,
            tasks: execution.task_summaries(),
            convergence,
            stages,
            execution,
        })
    }
}

pub struct WorkflowCoordinator {
    decomposer: QueryDecomposer,
    synthesizer: AnswerSynthesizer,
    capabilities: Capabilities,
    scorer: Arc<dyn QualityScorer>,
    settings: WorkflowSettings,
}

impl WorkflowCoordinator {
    /// Build a coordinator over a text-generation client and the three
    /// specialist capabilities. Scores passes with the default weights.
    pub fn new(
        llm: Arc<dyn LLMClient>,
        capabilities: Capabilities,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            decomposer: QueryDecomposer::new(llm.clone()),
            synthesizer: AnswerSynthesizer::new(llm, settings.excerpt_chars),
            capabilities,
            scorer: Arc::new(WeightedQualityScorer::default()),
            settings,
        }
    }

    /// Replace the quality scorer used by the convergence loop.
    pub fn with_scorer(mut self, scorer: Arc<dyn QualityScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Run `user_query` with a pattern given by name.
    ///
    /// Unknown names fail with [`AppError::InvalidPattern`] before anything runs.
    pub async fn execute_named(&self, user_query: &str, pattern: &str) -> Result<WorkflowOutput> {
        let pattern: ExecutionPattern = pattern.parse()?;
        self.execute(user_query, pattern).await
    }

    /// Run `user_query` end to end.
    ///
    /// Any failure after the execution record exists is reported as
    /// [`AppError::Workflow`] carrying the workflow id.
    pub async fn execute(
        &self,
        user_query: &str,
        pattern: ExecutionPattern,
    ) -> Result<WorkflowOutput> {
        let mut workflow = WorkflowExecution::new(
            user_query,
            pattern,
            self.settings.max_iterations,
            self.settings.quality_threshold,
        );
        let span = info_span!("workflow", id = %workflow.id, pattern = %pattern);

        async move {
            info!(query = user_query, "workflow started");

            if let Err(e) = self.run(&mut workflow).await {
                error!(
                    error = %e,
                    tasks = workflow.tasks().len(),
                    "workflow aborted"
                );
                return Err(AppError::Workflow {
                    workflow_id: workflow.id.clone(),
                    source: Box::new(e),
                });
            }

            let output = WorkflowOutput::from_execution(workflow)?;
            info!(
                total_tasks = output.total_tasks,
                iterations = output.iterations,
                duration_ms = output.duration_ms,
                "workflow completed"
            );
            Ok(output)
        }
        .instrument(span)
        .await
    }

    async fn run(&self, workflow: &mut WorkflowExecution) -> Result<()> {
        let decomposition = self.decomposer.decompose(&workflow.user_query).await?;
        info!(
            research = decomposition.research_queries.len(),
            analysis = decomposition.analysis_tasks.len(),
            citation = decomposition.citation_requirements.len(),
            complexity = %decomposition.complexity,
            "query decomposed"
        );

        let stages = StageRunner {
            capabilities: &self.capabilities,
            decomposer: &self.decomposer,
            scorer: self.scorer.as_ref(),
            research_mode: self.settings.research_mode,
            file_filter: self.settings.file_filter.as_deref(),
        };
        let outcome = ExecutionStrategy::for_workflow(workflow)
            .run(&stages, workflow, decomposition)
            .await?;

        let answer = self
            .synthesizer
            .synthesize(
                &workflow.user_query,
                &outcome.stages.research,
                &outcome.stages.analysis,
                &outcome.stages.citation,
            )
            .await?;

        workflow.finalize(WorkflowResult {
            answer,
            stages: outcome.stages,
            convergence: outcome.convergence,
        })
    }
}
