//! # DocIntel - multi-agent document intelligence workflows
//!
//! Orchestrates specialist capabilities (research, analysis, citation
//! validation) over a document collection to answer a user query. A
//! text-generation model plans the work and writes the final answer; the
//! capabilities do the retrieval and reasoning in between.
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use docintel::{Capabilities, ExecutionPattern, Provider, WorkflowCoordinator};
//! use docintel::capabilities::http::HttpCapabilities;
//! use docintel::utils::toml_config::WorkflowSettings;
//! use std::{sync::Arc, time::Duration};
//!
//! #[tokio::main]
//! async fn main() -> docintel::Result<()> {
//!     let provider = Provider::Ollama {
//!         base_url: "http://localhost:11434".to_string(),
//!         model: "llama3.2".to_string(),
//!     };
//!     let llm = Arc::from(provider.create_client(Duration::from_secs(120))?);
//!
//!     let service = HttpCapabilities::new("http://localhost:3000", None, Duration::from_secs(300))?;
//!     let capabilities = Capabilities::from_service(Arc::new(service));
//!
//!     let coordinator = WorkflowCoordinator::new(llm, capabilities, WorkflowSettings::default());
//!     let output = coordinator
//!         .execute("Summarize the fee structure", ExecutionPattern::Parallel)
//!         .await?;
//!     println!("{}", output.answer);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Workflow data model and error handling
//! - [`llm`] - Text-generation clients and structured reply parsing
//! - [`capabilities`] - Research, analysis and citation interfaces
//! - [`workflows`] - Decomposition, strategies, scoring and synthesis
//! - [`utils`] - TOML configuration

#![warn(rustdoc::missing_crate_level_docs)]

/// Specialist capability interfaces and the HTTP adapter.
pub mod capabilities;
/// Command-line interface.
pub mod cli;
/// LLM provider clients and reply parsing.
pub mod llm;
/// Core types (tasks, workflow records, errors).
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;
/// Workflow orchestration.
pub mod workflows;

// Re-export commonly used types
pub use capabilities::{
    AnalysisCapability, Capabilities, CitationCapability, ResearchCapability, ResearchRequest,
};
pub use llm::{LLMClient, Provider};
pub use types::{AppError, ExecutionPattern, Result, WorkflowExecution};
pub use utils::toml_config::DocIntelConfig;
pub use workflows::{WorkflowCoordinator, WorkflowOutput};
