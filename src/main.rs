use anyhow::Context;
use docintel::capabilities::http::HttpCapabilities;
use docintel::cli::init::{self, InitConfig, InitResult};
use docintel::cli::output::Output;
use docintel::cli::{Cli, Commands, RunArgs};
use docintel::utils::toml_config::{ConfigError, DocIntelConfig, LoggingConfig};
use docintel::{Capabilities, LLMClient, WorkflowCoordinator};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command {
        Commands::Init { path, force } => match init::run(InitConfig { path, force }, &output) {
            InitResult::Error(e) => anyhow::bail!("init failed: {}", e),
            InitResult::Success | InitResult::AlreadyExists => Ok(()),
        },
        Commands::Config { validate } => show_config(&cli.config, validate, &output),
        Commands::Run(args) => run_query(&cli.config, cli.verbose, args, &output).await,
    }
}

fn init_tracing(config: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

/// A missing file means defaults; anything else is an error.
fn load_config(path: &Path, output: &Output) -> anyhow::Result<DocIntelConfig> {
    match DocIntelConfig::load(path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) => {
            output.warning(&format!(
                "{} not found, using built-in defaults",
                path.display()
            ));
            output.hint("Run 'docintel init' to create one");
            let config = DocIntelConfig::default();
            config.validate()?;
            Ok(config)
        }
        Err(e) => Err(e).with_context(|| format!("failed to load {}", path.display())),
    }
}

fn show_config(path: &Path, validate: bool, output: &Output) -> anyhow::Result<()> {
    let config = DocIntelConfig::load(path)
        .with_context(|| format!("failed to load {}", path.display()))?;

    if validate {
        output.success(&format!("{} is valid", path.display()));
        return Ok(());
    }

    output.header("Configuration");
    output.kv("file", &path.display().to_string());

    output.subheader("LLM");
    output.kv("provider", &format!("{:?}", config.llm.provider).to_lowercase());
    output.kv("model", &config.llm.model);
    if let Some(ref url) = config.llm.base_url {
        output.kv("base_url", url);
    }

    output.subheader("Capabilities");
    output.kv("base_url", &config.capabilities.base_url);
    output.kv("timeout", &format!("{}s", config.capabilities.timeout_secs));

    output.subheader("Workflow");
    let wf = &config.workflow;
    output.kv("default_pattern", wf.default_pattern.as_str());
    output.kv("max_iterations", &wf.max_iterations.to_string());
    output.kv("quality_threshold", &wf.quality_threshold.to_string());
    output.kv("research_mode", &wf.research_mode.to_string());
    if let Some(ref files) = wf.file_filter {
        output.kv("file_filter", &files.join(", "));
    }

    output.subheader("Quality weights");
    let q = &config.quality;
    output.kv("sources", &q.sources.to_string());
    output.kv("citation", &q.citation.to_string());
    output.kv("completeness", &q.completeness.to_string());
    output.kv("source_target", &q.source_target.to_string());
    Ok(())
}

async fn run_query(
    path: &Path,
    verbose: bool,
    args: RunArgs,
    output: &Output,
) -> anyhow::Result<()> {
    let mut config = load_config(path, output)?;
    init_tracing(&config.logging, verbose);

    args.apply(&mut config.workflow)
        .context("invalid command-line override")?;

    let provider = config.llm.to_provider()?;
    let llm: Arc<dyn LLMClient> = Arc::from(
        provider.create_client(Duration::from_secs(config.llm.timeout_secs))?,
    );
    let service = HttpCapabilities::from_config(&config.capabilities)?;
    let capabilities = Capabilities::from_service(Arc::new(service));

    let coordinator = WorkflowCoordinator::new(llm, capabilities, config.workflow.clone())
        .with_scorer(Arc::new(docintel::workflows::WeightedQualityScorer::new(
            config.quality,
        )));

    if !args.json {
        output.banner();
        output.info(&format!(
            "Using {} ({})",
            provider.model(),
            provider.name()
        ));
    }

    let result = match args.pattern.as_deref() {
        Some(name) => coordinator.execute_named(&args.query, name).await,
        None => {
            coordinator
                .execute(&args.query, config.workflow.default_pattern)
                .await
        }
    };

    let out = match result {
        Ok(out) => out,
        Err(e) => {
            output.error(&e.to_string());
            return Err(e.into());
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        output.workflow_report(&out);
    }
    Ok(())
}
