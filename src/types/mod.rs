use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============= Execution Pattern =============

/// The three orchestration strategies a workflow can run under.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionPattern {
    /// Every stage runs its tasks one at a time, single pass.
    #[default]
    Sequential,
    /// Research fans out concurrently, analysis and citation stay sequential.
    Parallel,
    /// Repeated sequential passes until the quality threshold is met.
    Loop,
}

impl ExecutionPattern {
    /// Stable lowercase name, as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionPattern::Sequential => "sequential",
            ExecutionPattern::Parallel => "parallel",
            ExecutionPattern::Loop => "loop",
        }
    }
}

impl fmt::Display for ExecutionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionPattern {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(ExecutionPattern::Sequential),
            "parallel" => Ok(ExecutionPattern::Parallel),
            "loop" => Ok(ExecutionPattern::Loop),
            other => Err(AppError::InvalidPattern(other.to_string())),
        }
    }
}

/// Retrieval mode forwarded to the research capability.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Hybrid,
    Semantic,
    Lexical,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Hybrid => f.write_str("hybrid"),
            SearchMode::Semantic => f.write_str("semantic"),
            SearchMode::Lexical => f.write_str("lexical"),
        }
    }
}

impl FromStr for SearchMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hybrid" => Ok(SearchMode::Hybrid),
            "semantic" => Ok(SearchMode::Semantic),
            "lexical" => Ok(SearchMode::Lexical),
            other => Err(AppError::Configuration(format!(
                "Unknown search mode '{}' (expected hybrid, semantic or lexical)",
                other
            ))),
        }
    }
}

// ============= Task Types =============

/// Which capability a task is dispatched to.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Research,
    Analysis,
    Citation,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Research => f.write_str("research"),
            TaskKind::Analysis => f.write_str("analysis"),
            TaskKind::Citation => f.write_str("citation"),
        }
    }
}

/// Task lifecycle: `Pending -> Running -> {Completed, Failed}`, never backward.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskState {
    /// Whether `self -> next` is a legal lifecycle step.
    pub fn can_transition_to(self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (TaskState::Pending, TaskState::Running)
                | (TaskState::Running, TaskState::Completed)
                | (TaskState::Running, TaskState::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Pending => f.write_str("pending"),
            TaskState::Running => f.write_str("running"),
            TaskState::Completed => f.write_str("completed"),
            TaskState::Failed => f.write_str("failed"),
        }
    }
}

/// One unit of work dispatched to a capability.
///
/// `state` and `result` are only reachable through the transition methods so
/// that `result` is present exactly when the task completed.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: String,
    pub kind: TaskKind,
    pub query: String,
    /// Opaque mapping handed to the capability (upstream results etc.)
    pub context: Map<String, Value>,
    state: TaskState,
    result: Option<Value>,
    error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: impl Into<String>, kind: TaskKind, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            query: query.into(),
            context: Map::new(),
            state: TaskState::Pending,
            result: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Attach a context entry before dispatch.
    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn transition(&mut self, next: TaskState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(AppError::Internal(format!(
                "Task '{}' cannot move from {} to {}",
                self.id, self.state, next
            )));
        }
        self.state = next;
        if next.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    pub fn mark_running(&mut self) -> Result<()> {
        self.transition(TaskState::Running)
    }

    pub fn complete(&mut self, result: Value) -> Result<()> {
        self.transition(TaskState::Completed)?;
        self.result = Some(result);
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<()> {
        self.transition(TaskState::Failed)?;
        self.error = Some(message.into());
        Ok(())
    }

    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id.clone(),
            kind: self.kind,
            state: self.state,
        }
    }
}

/// Compact view of a task for run metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskSummary {
    pub id: String,
    pub kind: TaskKind,
    pub state: TaskState,
}

// ============= Decomposition =============

fn default_complexity() -> String {
    "simple".to_string()
}

/// Structured per-stage plan for a user query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decomposition {
    #[serde(default)]
    pub research_queries: Vec<String>,
    #[serde(default)]
    pub analysis_tasks: Vec<String>,
    #[serde(default)]
    pub citation_requirements: Vec<String>,
    /// Informational only: `simple`, `moderate` or `complex`.
    #[serde(default = "default_complexity")]
    pub complexity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refinement_rationale: Option<String>,
}

impl Decomposition {
    /// Degenerate single-item plan used when the planner reply is unusable.
    pub fn fallback(user_query: &str) -> Self {
        Self {
            research_queries: vec![user_query.to_string()],
            analysis_tasks: vec!["Analyze retrieved information".to_string()],
            citation_requirements: vec!["Validate all claims".to_string()],
            complexity: default_complexity(),
            refinement_rationale: None,
        }
    }

    /// Every stage has at least one non-blank item.
    pub fn is_actionable(&self) -> bool {
        let has_item = |items: &[String]| items.iter().any(|i| !i.trim().is_empty());
        has_item(&self.research_queries)
            && has_item(&self.analysis_tasks)
            && has_item(&self.citation_requirements)
    }
}

// ============= Capability Payloads =============

/// Reply of the research capability.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResearchOutput {
    #[serde(default)]
    pub sources: Vec<Value>,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub enhanced_summary: Option<String>,
    #[serde(default)]
    pub key_facts: Vec<Value>,
    #[serde(default)]
    pub information_gaps: Vec<String>,
    /// Fields this core does not interpret, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reply of the analysis capability.
///
/// Services must report `"status": "completed"` for a finished analysis.
/// A reply without `status` is read as incomplete and scores zero on the
/// completeness term, which caps a pass at `1 - completeness` weight.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutput {
    /// `"completed"` when the analysis finished; anything else, or absent,
    /// counts as incomplete.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub analysis_type: String,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub executive_summary: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisOutput {
    pub fn is_completed(&self) -> bool {
        self.status.as_deref() == Some("completed")
    }
}

/// Reply of the citation capability.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CitationOutput {
    /// Share of claims supported by sources, in `[0, 1]`.
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default)]
    pub validations: Vec<Value>,
    #[serde(default)]
    pub unsupported: Vec<String>,
    #[serde(default)]
    pub report: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Outputs of one research -> analysis -> citation pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StagePipelineResult {
    pub research: Vec<ResearchOutput>,
    pub analysis: Vec<AnalysisOutput>,
    pub citation: CitationOutput,
}

impl StagePipelineResult {
    pub fn total_sources(&self) -> usize {
        self.research.iter().map(|r| r.sources.len()).sum()
    }
}

// ============= Workflow Execution =============

/// Per-iteration bookkeeping of the convergence loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConvergenceReport {
    /// Quality score of each pass, index 0 is iteration 1.
    pub quality_scores: Vec<f64>,
    pub converged: bool,
    /// 1-based iteration that met the threshold.
    pub convergence_iteration: Option<u32>,
    /// 1-based iteration whose results were synthesized.
    pub best_iteration: u32,
    pub best_quality_score: f64,
}

/// Final result recorded on a finished workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub answer: String,
    pub stages: StagePipelineResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convergence: Option<ConvergenceReport>,
}

/// One end-to-end run, owned by a single `execute` call.
///
/// `tasks` is append-only and `final_result` is written exactly once, after
/// which the record no longer accepts tasks.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowExecution {
    pub id: String,
    pub user_query: String,
    pub pattern: ExecutionPattern,
    tasks: Vec<Task>,
    /// Current loop count; stays 0 for single-pass patterns.
    pub iteration: u32,
    pub max_iterations: u32,
    pub quality_threshold: f64,
    final_result: Option<WorkflowResult>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowExecution {
    pub fn new(
        user_query: impl Into<String>,
        pattern: ExecutionPattern,
        max_iterations: u32,
        quality_threshold: f64,
    ) -> Self {
        Self {
            id: format!("wf_{}", Uuid::new_v4().simple()),
            user_query: user_query.into(),
            pattern,
            tasks: Vec::new(),
            iteration: 0,
            max_iterations,
            quality_threshold,
            final_result: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn final_result(&self) -> Option<&WorkflowResult> {
        self.final_result.as_ref()
    }

    pub fn is_finalized(&self) -> bool {
        self.final_result.is_some()
    }

    /// Append a task and hand back a handle to drive it.
    pub fn push_task(&mut self, task: Task) -> Result<&mut Task> {
        if self.is_finalized() {
            return Err(AppError::Internal(format!(
                "Workflow '{}' is finalized; cannot append task '{}'",
                self.id, task.id
            )));
        }
        self.tasks.push(task);
        let last = self.tasks.len() - 1;
        Ok(&mut self.tasks[last])
    }

    /// Tasks appended at or after `start`, for stages that drive several at once.
    pub(crate) fn tasks_from_mut(&mut self, start: usize) -> &mut [Task] {
        &mut self.tasks[start..]
    }

    pub fn finalize(&mut self, result: WorkflowResult) -> Result<()> {
        if self.is_finalized() {
            return Err(AppError::Internal(format!(
                "Workflow '{}' already has a final result",
                self.id
            )));
        }
        self.final_result = Some(result);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Wall-clock time from creation to completion, or to now if still running.
    pub fn duration_ms(&self) -> u64 {
        let end = self.completed_at.unwrap_or_else(Utc::now);
        (end - self.created_at).num_milliseconds().max(0) as u64
    }

    pub fn task_summaries(&self) -> Vec<TaskSummary> {
        self.tasks.iter().map(Task::summary).collect()
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("LLM error: {0}")]
    LLM(String),

    #[error("{capability} capability failed: {message}")]
    Capability { capability: TaskKind, message: String },

    #[error("Unknown execution pattern: {0}")]
    InvalidPattern(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Workflow {workflow_id} failed: {source}")]
    Workflow {
        workflow_id: String,
        #[source]
        source: Box<AppError>,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True when a research/analysis/citation/text-generation call raised.
    pub fn is_capability_failure(&self) -> bool {
        match self {
            AppError::LLM(_) | AppError::Capability { .. } => true,
            AppError::Workflow { source, .. } => source.is_capability_failure(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
