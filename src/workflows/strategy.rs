//! Execution strategies over the research -> analysis -> citation pipeline.
//!
//! Stage order is fixed because each stage is defined over the outputs of the
//! previous ones. Strategies only differ in concurrency inside the research
//! stage and in whether the pipeline repeats:
//!
//! | Strategy          | Research        | Analysis / Citation | Passes                  |
//! |-------------------|-----------------|---------------------|-------------------------|
//! | `Sequential`      | one at a time   | one at a time       | 1                       |
//! | `Parallel`        | fan-out / join  | one at a time       | 1                       |
//! | `ConvergenceLoop` | one at a time   | one at a time       | up to `max_iterations`  |
//!
//! Any capability failure aborts the current pass and is returned as is. The
//! parallel join waits for every research call to settle and then fails as a
//! whole if any of them failed; there is no partial research set.

use super::decomposer::QueryDecomposer;
use super::executor::TaskExecutor;
use super::quality::QualityScorer;
use crate::capabilities::{Capabilities, ResearchRequest};
use crate::types::{
    AnalysisOutput, AppError, CitationOutput, ConvergenceReport, Decomposition, ExecutionPattern,
    ResearchOutput, Result, SearchMode, StagePipelineResult, Task, TaskKind, WorkflowExecution,
};
use futures::future::join_all;
use serde_json::json;
use tracing::{debug, info};

const CITATION_QUERY: &str = "Validate all citations";

/// Result of running a strategy to completion.
#[derive(Debug, Clone)]
pub struct StrategyOutcome {
    /// The pass selected for synthesis
    pub stages: StagePipelineResult,
    /// Present for the convergence loop only
    pub convergence: Option<ConvergenceReport>,
}

/// Closed set of orchestration strategies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExecutionStrategy {
    Sequential,
    Parallel,
    ConvergenceLoop {
        max_iterations: u32,
        quality_threshold: f64,
    },
}

impl ExecutionStrategy {
    /// Strategy matching the workflow's pattern and loop limits.
    pub fn for_workflow(workflow: &WorkflowExecution) -> Self {
        match workflow.pattern {
            ExecutionPattern::Sequential => ExecutionStrategy::Sequential,
            ExecutionPattern::Parallel => ExecutionStrategy::Parallel,
            ExecutionPattern::Loop => ExecutionStrategy::ConvergenceLoop {
                max_iterations: workflow.max_iterations,
                quality_threshold: workflow.quality_threshold,
            },
        }
    }

    pub async fn run(
        self,
        stages: &StageRunner<'_>,
        workflow: &mut WorkflowExecution,
        decomposition: Decomposition,
    ) -> Result<StrategyOutcome> {
        match self {
            ExecutionStrategy::Sequential => {
                let pass = stages
                    .pass(workflow, &decomposition, ResearchFanout::Sequential, TaskIds::Single)
                    .await?;
                Ok(StrategyOutcome {
                    stages: pass,
                    convergence: None,
                })
            }
            ExecutionStrategy::Parallel => {
                let pass = stages
                    .pass(workflow, &decomposition, ResearchFanout::Concurrent, TaskIds::Single)
                    .await?;
                Ok(StrategyOutcome {
                    stages: pass,
                    convergence: None,
                })
            }
            ExecutionStrategy::ConvergenceLoop {
                max_iterations,
                quality_threshold,
            } => {
                converge(stages, workflow, decomposition, max_iterations, quality_threshold).await
            }
        }
    }
}

/// Repeat sequential passes until one meets the threshold or the budget runs out.
async fn converge(
    stages: &StageRunner<'_>,
    workflow: &mut WorkflowExecution,
    mut plan: Decomposition,
    max_iterations: u32,
    quality_threshold: f64,
) -> Result<StrategyOutcome> {
    if max_iterations == 0 {
        return Err(AppError::Configuration(
            "max_iterations must be at least 1".to_string(),
        ));
    }

    let mut quality_scores = Vec::new();
    let mut convergence_iteration = None;
    // (1-based iteration, score, pass); replaced only on a strictly higher score
    let mut best: Option<(u32, f64, StagePipelineResult)> = None;

    for iteration in 0..max_iterations {
        workflow.iteration = iteration + 1;
        info!(
            iteration = iteration + 1,
            max_iterations, "starting convergence pass"
        );

        let pass = stages
            .pass(workflow, &plan, ResearchFanout::Sequential, TaskIds::Iteration(iteration))
            .await?;
        let score = stages
            .scorer
            .score(&pass.research, &pass.analysis, &pass.citation);
        quality_scores.push(score);
        info!(iteration = iteration + 1, score, quality_threshold, "pass scored");

        let converged = score >= quality_threshold;
        if !converged && iteration + 1 < max_iterations {
            plan = stages
                .decomposer
                .refine(&plan, &pass.research, score)
                .await?;
        }

        let improves = match best {
            Some((_, best_score, _)) => score > best_score,
            None => true,
        };
        if improves {
            best = Some((iteration + 1, score, pass));
        }

        if converged {
            convergence_iteration = Some(iteration + 1);
            break;
        }
    }

    let (best_iteration, best_quality_score, stages_result) = best.ok_or_else(|| {
        AppError::Internal("convergence loop finished without a pass".to_string())
    })?;

    info!(
        converged = convergence_iteration.is_some(),
        best_iteration, best_quality_score, "convergence loop finished"
    );

    Ok(StrategyOutcome {
        stages: stages_result,
        convergence: Some(ConvergenceReport {
            quality_scores,
            converged: convergence_iteration.is_some(),
            convergence_iteration,
            best_iteration,
            best_quality_score,
        }),
    })
}

/// How the research stage dispatches its tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResearchFanout {
    Sequential,
    Concurrent,
}

/// Task id scheme: single-pass ids, or ids qualified by a 0-based loop iteration.
#[derive(Debug, Clone, Copy)]
pub(crate) enum TaskIds {
    Single,
    Iteration(u32),
}

impl TaskIds {
    fn research(self, idx: usize) -> String {
        match self {
            TaskIds::Single => format!("research_{}", idx),
            TaskIds::Iteration(it) => format!("research_{}_{}", it, idx),
        }
    }

    fn analysis(self, idx: usize) -> String {
        match self {
            TaskIds::Single => format!("analysis_{}", idx),
            TaskIds::Iteration(it) => format!("analysis_{}_{}", it, idx),
        }
    }

    fn citation(self) -> String {
        match self {
            TaskIds::Single => "citation_validation".to_string(),
            TaskIds::Iteration(it) => format!("citation_{}", it),
        }
    }
}

/// Runs the individual stages of a pass against the injected capabilities.
pub struct StageRunner<'a> {
    pub capabilities: &'a Capabilities,
    pub decomposer: &'a QueryDecomposer,
    pub scorer: &'a dyn QualityScorer,
    pub research_mode: SearchMode,
    pub file_filter: Option<&'a [String]>,
}

impl StageRunner<'_> {
    /// One research -> analysis -> citation pass.
    pub(crate) async fn pass(
        &self,
        workflow: &mut WorkflowExecution,
        plan: &Decomposition,
        fanout: ResearchFanout,
        ids: TaskIds,
    ) -> Result<StagePipelineResult> {
        let research = match fanout {
            ResearchFanout::Sequential => {
                self.research_sequential(workflow, &plan.research_queries, ids)
                    .await?
            }
            ResearchFanout::Concurrent => {
                self.research_concurrent(workflow, &plan.research_queries, ids)
                    .await?
            }
        };
        let analysis = self
            .analysis_stage(workflow, &plan.analysis_tasks, &research, ids)
            .await?;
        let citation = self
            .citation_stage(workflow, &plan.citation_requirements, &research, &analysis, ids)
            .await?;

        Ok(StagePipelineResult {
            research,
            analysis,
            citation,
        })
    }

    fn research_request(&self, query: &str) -> ResearchRequest {
        ResearchRequest {
            query: query.to_string(),
            mode: self.research_mode,
            file_filter: self.file_filter.map(<[String]>::to_vec),
        }
    }

    fn research_task(&self, id: String, request: &ResearchRequest) -> Task {
        Task::new(id, TaskKind::Research, request.query.clone())
            .with_context("mode", json!(request.mode))
            .with_context("file_names", json!(request.file_filter))
    }

    async fn research_sequential(
        &self,
        workflow: &mut WorkflowExecution,
        queries: &[String],
        ids: TaskIds,
    ) -> Result<Vec<ResearchOutput>> {
        let mut results = Vec::with_capacity(queries.len());
        for (idx, query) in queries.iter().enumerate() {
            let request = self.research_request(query);
            let task = workflow.push_task(self.research_task(ids.research(idx), &request))?;
            let output =
                TaskExecutor::run(task, self.capabilities.research.research(&request)).await?;
            results.push(output);
        }
        debug!(count = results.len(), "research stage finished");
        Ok(results)
    }

    /// Fan out every research call and join on all of them.
    ///
    /// Results are paired with their queries by position, not arrival order.
    async fn research_concurrent(
        &self,
        workflow: &mut WorkflowExecution,
        queries: &[String],
        ids: TaskIds,
    ) -> Result<Vec<ResearchOutput>> {
        let requests: Vec<ResearchRequest> =
            queries.iter().map(|q| self.research_request(q)).collect();

        let start = workflow.tasks().len();
        for (idx, request) in requests.iter().enumerate() {
            workflow.push_task(self.research_task(ids.research(idx), request))?;
        }

        let research = &self.capabilities.research;
        let calls = workflow
            .tasks_from_mut(start)
            .iter_mut()
            .zip(requests.iter())
            .map(|(task, request)| TaskExecutor::run(task, research.research(request)));

        let settled = join_all(calls).await;
        let failed = settled.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            debug!(failed, total = settled.len(), "parallel research join failed");
        }

        // First failure in query order fails the whole stage.
        let results = settled.into_iter().collect::<Result<Vec<_>>>()?;
        debug!(count = results.len(), "parallel research stage finished");
        Ok(results)
    }

    async fn analysis_stage(
        &self,
        workflow: &mut WorkflowExecution,
        tasks: &[String],
        research: &[ResearchOutput],
        ids: TaskIds,
    ) -> Result<Vec<AnalysisOutput>> {
        let research_context = serde_json::to_value(research)?;
        let mut results = Vec::with_capacity(tasks.len());
        for (idx, analysis_task) in tasks.iter().enumerate() {
            let task = workflow.push_task(
                Task::new(ids.analysis(idx), TaskKind::Analysis, analysis_task.clone())
                    .with_context("research_results", research_context.clone()),
            )?;
            let output = TaskExecutor::run(
                task,
                self.capabilities.analysis.analyze(analysis_task, research),
            )
            .await?;
            results.push(output);
        }
        debug!(count = results.len(), "analysis stage finished");
        Ok(results)
    }

    async fn citation_stage(
        &self,
        workflow: &mut WorkflowExecution,
        requirements: &[String],
        research: &[ResearchOutput],
        analysis: &[AnalysisOutput],
        ids: TaskIds,
    ) -> Result<CitationOutput> {
        let task = workflow.push_task(
            Task::new(ids.citation(), TaskKind::Citation, CITATION_QUERY)
                .with_context("citation_requirements", json!(requirements))
                .with_context("analysis_results", serde_json::to_value(analysis)?)
                .with_context("research_results", serde_json::to_value(research)?),
        )?;
        let output =
            TaskExecutor::run(task, self.capabilities.citation.validate(analysis, research))
                .await?;
        debug!(accuracy = output.accuracy, "citation stage finished");
        Ok(output)
    }
}
