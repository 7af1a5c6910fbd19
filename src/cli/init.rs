//! Init command implementation
//!
//! Scaffolds a starter `docintel.toml` and `.env.example`.

use super::output::Output;
use crate::utils::toml_config::DEFAULT_CONFIG_TEMPLATE;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug)]
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// Project already exists (docintel.toml found)
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing DocIntel");

    let base_path = &config.path;

    let config_path = base_path.join("docintel.toml");
    if config_path.exists() && !config.force {
        output.warning("docintel.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    if !base_path.exists() {
        if let Err(e) = fs::create_dir_all(base_path) {
            output.error(&format!("Failed to create {}: {}", base_path.display(), e));
            return InitResult::Error(e.to_string());
        }
    }

    if let Err(e) = write_file(&config_path, DEFAULT_CONFIG_TEMPLATE, config.force) {
        output.error(&format!("Failed to create docintel.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("config", "docintel.toml");

    let env_example_path = base_path.join(".env.example");
    if env_example_path.exists() && !config.force {
        output.skipped(".env.example", "already exists");
    } else if let Err(e) = write_file(&env_example_path, ENV_EXAMPLE, config.force) {
        output.warning(&format!("Failed to create .env.example: {}", e));
    } else {
        output.created("env", ".env.example");
    }

    output.header("Next Steps");
    output.info("1. Point [capabilities].base_url at the specialist service");
    output.info("2. Start Ollama, or switch [llm] to openai and set the API key:");
    output.command("ollama serve");
    output.info("3. Ask a question:");
    output.command("docintel run \"What are the management fees?\"");

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

const ENV_EXAMPLE: &str = r#"# Referenced by name from docintel.toml (api_key_env)
# OPENAI_API_KEY=sk-...
# CAPABILITY_API_KEY=

# Overrides [logging].level, e.g. docintel=debug
# RUST_LOG=info
"#;
