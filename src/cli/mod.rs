//! CLI module for DocIntel
//!
//! Provides command-line interface parsing for the docintel binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;

use crate::types::SearchMode;
use crate::utils::toml_config::{ConfigError, WorkflowSettings};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// DocIntel - multi-agent document intelligence
///
/// Answers questions about a document collection by orchestrating research,
/// analysis and citation-validation specialists.
#[derive(Parser, Debug)]
#[command(
    name = "docintel",
    version,
    about = "DocIntel - multi-agent document intelligence workflows",
    after_help = "EXAMPLES:\n    \
                  docintel init                                  # Write a starter docintel.toml\n    \
                  docintel run \"What are the fund fees?\"         # Sequential pipeline\n    \
                  docintel run -p loop --threshold 0.9 \"...\"     # Iterate until quality converges\n    \
                  docintel config --validate                     # Check the configuration"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "docintel.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a query against the document collection
    Run(RunArgs),

    /// Show configuration information
    Config {
        /// Validate the configuration file and exit
        #[arg(long)]
        validate: bool,
    },

    /// Write a starter docintel.toml and .env.example
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,
    },
}

/// Arguments of `docintel run`; anything unset falls back to `[workflow]`.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// The question to answer
    pub query: String,

    /// Execution pattern: sequential, parallel or loop
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Maximum convergence-loop passes
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Quality score at which the loop stops, in [0, 1]
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Research search mode: hybrid, semantic or lexical
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Restrict research to this file name (repeatable)
    #[arg(long = "file", value_name = "FILE")]
    pub files: Vec<String>,

    /// Print the workflow output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    /// Layer command-line overrides onto the configured workflow settings.
    pub fn apply(&self, settings: &mut WorkflowSettings) -> Result<(), ConfigError> {
        if let Some(n) = self.max_iterations {
            settings.max_iterations = n;
        }
        if let Some(t) = self.threshold {
            settings.quality_threshold = t;
        }
        if let Some(ref mode) = self.mode {
            settings.research_mode = mode
                .parse::<SearchMode>()
                .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        }
        if !self.files.is_empty() {
            settings.file_filter = Some(self.files.clone());
        }
        settings.validate()
    }
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
