use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use bootengine::core::{BundledLicenses, DirectoryLicenses, LicenseProvider};
use bootengine::exit_codes;
use bootengine::{
    default_workflow, load_workflow, EngineConfig, InMemoryModuleRegistry, PresetCollector,
    PromptCollector, RunOutcome, RuntimeValues, StopSignal, VariableCollector, WorkflowRunner,
};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "bootengine",
    version,
    about = "Bootstrap projects from a workflow of sandboxed WebAssembly plugins"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a workflow file.
    Run(RunArgs),
    /// Write a starter workflow (JSON).
    Init {
        #[arg(short, long, default_value = "bootengine.json")]
        output: PathBuf,
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Workflow file (.yaml, .yml, .json or .toml).
    workflow: PathBuf,
    /// Module registry (JSON list of {name, category, location}).
    #[arg(short, long, default_value = "modules.json")]
    registry: PathBuf,
    /// Engine configuration (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// JSON object of variable values known up front.
    #[arg(long)]
    values: Option<PathBuf>,
    /// Set one variable, `name=value`. Repeatable.
    #[arg(short = 's', long = "set", value_parser = parse_assignment)]
    set: Vec<(String, String)>,
    /// Never prompt: use the given values and accept confirmations.
    #[arg(short, long)]
    yes: bool,
    /// Directory the project is created in. Defaults to the current directory.
    #[arg(short = 'C', long)]
    dir: Option<PathBuf>,
    /// Directory with license texts overriding the bundled ones.
    #[arg(long)]
    licenses: Option<PathBuf>,
    /// Print the run report as JSON on stdout.
    #[arg(long)]
    report: bool,
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got '{}'", raw)),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Init { output, force } => cmd_init(&output, force).map(|_| exit_codes::OK),
        Command::Run(args) => cmd_run(args).await,
    };
    let code = match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            exit_codes::FAILURE
        }
    };
    // Blocking plugin tasks that were interrupted may still be unwinding;
    // exit without waiting for the runtime to drain them.
    std::process::exit(code);
}

fn cmd_init(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }
    let mut payload =
        serde_json::to_string_pretty(&default_workflow()).context("serialize workflow")?;
    payload.push('\n');
    std::fs::write(output, payload).with_context(|| format!("write {}", output.display()))?;
    println!("wrote {}", output.display());
    Ok(())
}

async fn cmd_run(args: RunArgs) -> Result<i32> {
    let workflow = load_workflow(&args.workflow)?;
    let config = match &args.config {
        Some(path) => EngineConfig::from_toml_file(path)?,
        None => EngineConfig::default(),
    };
    let registry = InMemoryModuleRegistry::from_json_file(&args.registry)?;

    let mut presets = match &args.values {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read {}", path.display()))?;
            serde_json::from_str::<RuntimeValues>(&raw)
                .with_context(|| format!("parse {}", path.display()))?
        }
        None => RuntimeValues::new(),
    };
    for (name, value) in args.set {
        presets.insert(name, value);
    }

    let collector: Arc<dyn VariableCollector> = if args.yes {
        Arc::new(PresetCollector::new(presets))
    } else {
        Arc::new(
            PromptCollector::new(BufReader::new(std::io::stdin()), std::io::stderr())
                .with_presets(presets),
        )
    };
    let licenses: Arc<dyn LicenseProvider> = match args.licenses {
        Some(dir) => Arc::new(DirectoryLicenses::new(dir)),
        None => Arc::new(BundledLicenses),
    };

    let stop = StopSignal::new();
    let on_interrupt = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping after the current operation");
            on_interrupt.trigger();
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(exit_codes::CANCELLED);
            }
        }
    });

    let mut builder = WorkflowRunner::builder(workflow)
        .registry(Arc::new(registry))
        .collector(collector)
        .license_provider(licenses)
        .config(config)
        .stop_signal(stop);
    if let Some(dir) = args.dir {
        builder = builder.base_dir(dir);
    }
    let runner = builder.build()?;

    match runner.run().await {
        Ok(report) => {
            if args.report {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("serialize report")?
                );
            }
            for failure in &report.template_failures {
                eprintln!("warning: template not rendered: {}", failure);
            }
            match report.outcome {
                RunOutcome::Completed => Ok(exit_codes::OK),
                RunOutcome::Declined(reason) => {
                    eprintln!("stopped: {:?}", reason);
                    Ok(exit_codes::DECLINED)
                }
            }
        }
        Err(err) => {
            eprintln!("error: {}", err);
            Ok(err.exit_code())
        }
    }
}
