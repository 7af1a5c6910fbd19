//! Workflow orchestration
//!
//! A user query is decomposed into research queries, analysis tasks and
//! citation requirements, run through a research -> analysis -> citation
//! pipeline, and synthesized into one answer.
//!
//! # Patterns
//!
//! - `sequential` - one task at a time, single pass
//! - `parallel` - research fans out concurrently, single pass
//! - `loop` - sequential passes repeated until the quality score meets the
//!   threshold, synthesizing from the best pass
//!
//! # Usage
//!
//! ```ignore
//! let coordinator = WorkflowCoordinator::new(llm, capabilities, settings);
//! let output = coordinator
//!     .execute("What are the fees in Fund III?", ExecutionPattern::Loop)
//!     .await?;
//! println!("{}", output.answer);
//! ```

pub mod coordinator;
pub mod decomposer;
pub mod executor;
pub mod quality;
pub mod strategy;
pub mod synthesizer;

pub use coordinator::{WorkflowCoordinator, WorkflowOutput};
pub use decomposer::QueryDecomposer;
pub use executor::TaskExecutor;
pub use quality::{QualityScorer, QualityWeights, WeightedQualityScorer};
pub use strategy::{ExecutionStrategy, StageRunner, StrategyOutcome};
pub use synthesizer::AnswerSynthesizer;
