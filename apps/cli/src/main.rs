//! Thin binary wiring the workflow crates together: load workflow
//! definitions from disk, load plugins, and drive the engine either for a
//! single manual run or as a long-lived trigger host.

mod workflow_file;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nebula_wf_core::{Clock, SystemClock};
use nebula_wf_credential::InMemoryCredentialStore;
use nebula_wf_engine::{EngineConfig, WorkflowEngine};
use nebula_wf_execution::InMemoryExecutionStore;
use nebula_wf_log::{ConsoleSink, ExecutionLogger};
use nebula_wf_model::{InMemoryWorkflowStore, WorkflowStore};
use nebula_wf_node::ExecutorRegistry;
use nebula_wf_plugin::PluginLoader;
use nebula_wf_trigger::{CronTrigger, FileEventTrigger, ManualTrigger};

#[derive(Parser)]
#[command(name = "nebula-wf", version, about = "Workflow execution engine CLI")]
struct Cli {
    /// Directory scanned for executor plugin libraries.
    #[arg(long, global = true, env = "NEBULA_WF_PLUGINS_DIR")]
    plugins_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a workflow definition file without executing it.
    Validate {
        /// Path to a JSON or YAML workflow definition.
        workflow: PathBuf,
    },
    /// Execute a single workflow definition to completion (C10 manual trigger).
    Run {
        /// Path to a JSON or YAML workflow definition.
        workflow: PathBuf,
        /// Path to a JSON input document; defaults to `{}`.
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Load every workflow definition in a directory and host their
    /// schedule (C8) and file-event (C9) triggers until interrupted.
    Serve {
        /// Directory containing one workflow definition per file.
        workflows_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    let plugins_dir = cli
        .plugins_dir
        .or_else(|| dirs::data_dir().map(|d| d.join("nebula-wf/plugins")))
        .unwrap_or_else(|| PathBuf::from("./plugins"));

    match cli.command {
        Commands::Validate { workflow } => validate(&workflow),
        Commands::Run { workflow, input } => run(&workflow, input.as_deref(), &plugins_dir).await,
        Commands::Serve { workflows_dir } => serve(&workflows_dir, &plugins_dir).await,
    }
}

fn validate(path: &std::path::Path) -> Result<()> {
    let workflow = workflow_file::load(path)?;
    workflow.validate().context("workflow failed validation")?;
    println!("'{}' is valid ({} nodes, {} connections)", workflow.name, workflow.nodes.len(), workflow.connections.len());
    Ok(())
}

fn build_engine(plugins_dir: &std::path::Path) -> Result<(Arc<WorkflowEngine>, Arc<InMemoryWorkflowStore>)> {
    let config = EngineConfig::default();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let workflow_store = Arc::new(InMemoryWorkflowStore::new());
    let execution_store = Arc::new(InMemoryExecutionStore::new());
    let credentials = Arc::new(InMemoryCredentialStore::new());
    let registry = Arc::new(ExecutorRegistry::new());
    let logger = Arc::new(ExecutionLogger::new(clock.clone()));
    logger.add_sink(Arc::new(ConsoleSink::new(config.log_level)));

    if config.plugins_enabled {
        let loader = PluginLoader::new(plugins_dir.to_path_buf());
        let loaded = loader.load_all(&registry).context("loading plugins")?;
        tracing::info!(count = loaded, path = %plugins_dir.display(), "plugins loaded");
    }

    let engine = Arc::new(WorkflowEngine::new(
        workflow_store.clone(),
        execution_store,
        credentials,
        registry,
        logger,
        clock,
    ));
    Ok((engine, workflow_store))
}

async fn run(workflow_path: &std::path::Path, input_path: Option<&std::path::Path>, plugins_dir: &std::path::Path) -> Result<()> {
    let workflow = workflow_file::load(workflow_path)?;
    workflow.validate().context("workflow failed validation")?;
    let workflow_id = workflow.id;

    let (engine, workflow_store) = build_engine(plugins_dir)?;
    workflow_store.upsert(workflow);

    let input = match input_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing {} as JSON", path.display()))?
        }
        None => serde_json::json!({}),
    };

    let execution = ManualTrigger::new(engine).fire(workflow_id, input).await.context("execution failed")?;
    println!("{}", serde_json::to_string_pretty(&execution)?);
    if execution.status != nebula_wf_execution::ExecutionStatus::Success {
        std::process::exit(1);
    }
    Ok(())
}

async fn serve(workflows_dir: &std::path::Path, plugins_dir: &std::path::Path) -> Result<()> {
    let (engine, workflow_store) = build_engine(plugins_dir)?;

    let mut loaded = 0usize;
    for entry in std::fs::read_dir(workflows_dir).with_context(|| format!("reading {}", workflows_dir.display()))? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        match workflow_file::load(&path) {
            Ok(workflow) => {
                if let Err(e) = workflow.validate() {
                    tracing::warn!(path = %path.display(), error = %e, "skipping invalid workflow");
                    continue;
                }
                workflow_store.upsert(workflow);
                loaded += 1;
            }
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable workflow file"),
        }
    }
    tracing::info!(loaded, "workflows loaded from directory");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cron = Arc::new(CronTrigger::new(engine.clone(), clock.clone()));
    cron.start(workflow_store.as_ref()).await;

    let file_events = Arc::new(FileEventTrigger::new(engine.clone(), clock));
    for workflow in workflow_store.find_by_trigger_type(nebula_wf_model::TriggerType::FileEvent).await {
        if !workflow.active {
            continue;
        }
        let Some(trigger_node) = workflow.trigger_nodes().into_iter().next() else {
            continue;
        };
        if let Err(e) = file_events.register(&workflow, trigger_node) {
            tracing::warn!(workflow_id = %workflow.id, error = %e, "skipping file-event registration");
        }
    }

    println!("serving {} workflow(s); press ctrl-c to stop", loaded);
    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    println!("shutting down");
    Ok(())
}
