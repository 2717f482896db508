//! Workflow runner.
//!
//! One run walks a fixed sequence of states:
//!
//! ```text
//! ConfirmingTree -> CollectingVariables -> MaterializingRoot -> RenderingTree -> ExecutingSteps -> Done
//! ```
//!
//! Any state can end in `Failed`. A user decline is not a failure: it ends the
//! run early with [`RunOutcome::Declined`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bootengine_plugin_wasm::{HostBindings, Invocation, PluginError, WasmEngine};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use super::collector::{validate_values, Collected, Decision, VariableCollector};
use super::config::EngineConfig;
use super::license::{render_license, BundledLicenses, LicenseProvider};
use super::process::run_command;
use super::stop_signal::StopSignal;
use crate::domain::{
    check_capability, flatten, populate_content, Category, FsNode, ModuleAction, RenderFailure,
    RuntimeValues, TemplateDirective,
};
use crate::dsl::{Step, Workflow, LICENSE_MODULE, PROJECT_NAME_VAR};
use crate::error::{StepError, WorkflowError};
use crate::plugin::{PluginHost, TemplateBridge, CONFIG_FOLDER_STRUCT, CONFIG_VALUES};
use crate::registry::{ModuleRecord, ModuleRegistry};
use crate::security::CommandGate;

const TREE_CONFIRM_MESSAGE: &str =
    "A folder_struct is declared but no step creates it. Continue anyway?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    ConfirmingTree,
    CollectingVariables,
    MaterializingRoot,
    RenderingTree,
    ExecutingSteps,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclineReason {
    TreeNotConfirmed,
    VariablesDeclined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum RunOutcome {
    Completed,
    Declined(DeclineReason),
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub name: String,
    pub module: String,
    pub action: ModuleAction,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub outcome: RunOutcome,
    pub project_root: Option<PathBuf>,
    pub steps: Vec<StepReport>,
    pub template_failures: Vec<RenderFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn is_completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }
}

/// Everything a step needs once variables are known.
struct RunContext {
    values: Arc<RuntimeValues>,
    values_json: String,
    project_root: PathBuf,
    tree: Option<Vec<FsNode>>,
    host: PluginHost,
    bridge: TemplateBridge,
    gate: CommandGate,
}

/// Workflow runner with builder-based configuration.
///
/// Use [`WorkflowRunner::builder(workflow)`](Self::builder) to obtain a
/// [`WorkflowRunnerBuilder`].
pub struct WorkflowRunner {
    workflow: Workflow,
    registry: Arc<dyn ModuleRegistry>,
    collector: Arc<dyn VariableCollector>,
    licenses: Arc<dyn LicenseProvider>,
    config: EngineConfig,
    base_dir: PathBuf,
    stop: StopSignal,
    engine: WasmEngine,
}

impl WorkflowRunner {
    pub fn builder(workflow: Workflow) -> WorkflowRunnerBuilder {
        WorkflowRunnerBuilder {
            workflow,
            registry: None,
            collector: None,
            licenses: None,
            config: EngineConfig::default(),
            base_dir: None,
            stop: None,
            engine: None,
        }
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    pub async fn run(&self) -> Result<RunReport, WorkflowError> {
        let run_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("workflow_run", run_id = %run_id);
        async {
            let result = self.run_inner(run_id).await;
            match &result {
                Ok(report) => tracing::info!(outcome = ?report.outcome, steps = report.steps.len(), "run finished"),
                Err(e) => tracing::error!(state = ?RunState::Failed, "run failed: {}", e),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_inner(&self, run_id: String) -> Result<RunReport, WorkflowError> {
        let started_at = Utc::now();
        let finish = |outcome, project_root, steps, template_failures| RunReport {
            run_id: run_id.clone(),
            outcome,
            project_root,
            steps,
            template_failures,
            started_at,
            finished_at: Utc::now(),
        };

        if self.workflow.requires_tree_confirmation() {
            tracing::debug!(state = ?RunState::ConfirmingTree);
            if self.collector.confirm(TREE_CONFIRM_MESSAGE)? == Decision::Decline {
                tracing::info!("folder_struct not confirmed, stopping");
                return Ok(finish(
                    RunOutcome::Declined(DeclineReason::TreeNotConfirmed),
                    None,
                    Vec::new(),
                    Vec::new(),
                ));
            }
        }

        tracing::debug!(state = ?RunState::CollectingVariables);
        let Some(values) = self.collect_values()? else {
            tracing::info!("variable collection declined, stopping");
            return Ok(finish(
                RunOutcome::Declined(DeclineReason::VariablesDeclined),
                None,
                Vec::new(),
                Vec::new(),
            ));
        };
        let values = Arc::new(values);

        tracing::debug!(state = ?RunState::MaterializingRoot);
        let project_root = self.materialize_root(&values)?;

        let host = PluginHost::new(self.engine.clone(), &self.config);
        let bridge = TemplateBridge::new(
            self.registry.clone(),
            host.clone(),
            values.clone(),
            self.base_dir.clone(),
        );

        tracing::debug!(state = ?RunState::RenderingTree);
        let (tree, template_failures) = self.render_tree(&bridge).await?;

        let ctx = RunContext {
            values_json: values.to_json()?,
            values,
            project_root: project_root.clone(),
            tree,
            host,
            bridge,
            gate: CommandGate::new(self.workflow.config.unrestricted),
        };

        tracing::debug!(state = ?RunState::ExecutingSteps);
        let mut reports = Vec::with_capacity(self.workflow.steps.len());
        for step in &self.workflow.steps {
            if self.stop.is_triggered() {
                return Err(WorkflowError::Cancelled);
            }
            let started = Instant::now();
            tracing::info!(step = %step.name, module = %step.module, action = %step.action, "step started");
            if let Err(error) = self.execute_step(step, &ctx).await {
                return Err(wrap_step_error(step, error));
            }
            let elapsed_ms = started.elapsed().as_millis() as u64;
            tracing::info!(step = %step.name, elapsed_ms, "step succeeded");
            reports.push(StepReport {
                name: step.name.clone(),
                module: step.module.clone(),
                action: step.action,
                elapsed_ms,
            });
        }

        tracing::debug!(state = ?RunState::Done);
        Ok(finish(
            RunOutcome::Completed,
            Some(project_root),
            reports,
            template_failures,
        ))
    }

    fn collect_values(&self) -> Result<Option<RuntimeValues>, WorkflowError> {
        let vars = &self.workflow.vars;
        if self.workflow.config.create_root && !vars.contains_key(PROJECT_NAME_VAR) {
            return Err(WorkflowError::MissingVariable(PROJECT_NAME_VAR.to_string()));
        }

        let values = match self.collector.collect(vars)? {
            Collected::Values(values) => values,
            Collected::Declined => return Ok(None),
        };
        validate_values(vars, &values)?;

        if self.workflow.config.create_root {
            let name = values
                .get_text(PROJECT_NAME_VAR)
                .filter(|name| !name.trim().is_empty())
                .ok_or_else(|| WorkflowError::MissingVariable(PROJECT_NAME_VAR.to_string()))?;
            if Path::new(name).is_absolute() || name.split(['/', '\\']).any(|p| p == "..") {
                return Err(WorkflowError::InvalidVariable {
                    name: PROJECT_NAME_VAR.to_string(),
                    reason: "must be a relative path inside the base directory".into(),
                });
            }
        }
        tracing::debug!(count = values.len(), "variables collected");
        Ok(Some(values))
    }

    fn materialize_root(&self, values: &RuntimeValues) -> Result<PathBuf, WorkflowError> {
        if !self.workflow.config.create_root {
            return Ok(self.base_dir.clone());
        }
        let name = values
            .get_text(PROJECT_NAME_VAR)
            .ok_or_else(|| WorkflowError::MissingVariable(PROJECT_NAME_VAR.to_string()))?;
        let root = self.base_dir.join(name);
        std::fs::create_dir_all(&root).map_err(|source| WorkflowError::RootCreation {
            path: root.clone(),
            source,
        })?;
        tracing::info!(root = %root.display(), "project root created");
        Ok(root)
    }

    /// Fill template contents. Each render is bounded on its own by the
    /// plugin timeout; the traversal as a whole is not.
    async fn render_tree(
        &self,
        bridge: &TemplateBridge,
    ) -> Result<(Option<Vec<FsNode>>, Vec<RenderFailure>), WorkflowError> {
        let Some(mut tree) = self.workflow.folder_struct.clone() else {
            return Ok((None, Vec::new()));
        };
        let policy = self.config.template_failure_policy;
        let bridge = bridge.clone();
        let watchdog = self.watchdog();
        let runtime = tokio::runtime::Handle::current();
        let task = tokio::task::spawn_blocking(move || {
            let result = populate_content(&mut tree, policy, &mut |d: &TemplateDirective| {
                let bridge = bridge.clone();
                let directive = d.clone();
                let render =
                    tokio::task::spawn_blocking(move || bridge.render_directive(&directive));
                runtime
                    .block_on(watchdog.race(render))
                    .unwrap_or_else(|e| Err(e.to_string()))
            });
            result.map(|failures| (tree, failures))
        });

        let joined = task.await.map_err(|e| WorkflowError::TemplateRender {
            file: "folder_struct".into(),
            message: format!("render task failed: {}", e),
        })?;
        if self.stop.is_triggered() {
            return Err(WorkflowError::Cancelled);
        }
        match joined {
            Ok((tree, failures)) => Ok((Some(tree), failures)),
            Err(failure) => Err(WorkflowError::TemplateRender {
                file: failure.path,
                message: failure.message,
            }),
        }
    }

    async fn execute_step(&self, step: &Step, ctx: &RunContext) -> Result<(), StepError> {
        if step.module == LICENSE_MODULE {
            return self.write_license(ctx);
        }

        let record = self.registry.lookup(&step.module)?;
        if record.category == Category::TemplateEngine {
            return Err(StepError::WrongCategory {
                module: record.name,
                category: record.category,
            });
        }
        check_capability(record.category, step.action)?;

        let out = self.invoke_step_plugin(step, &record, ctx).await?;

        match record.category {
            Category::Filer | Category::Vcs => {
                ensure_success(&out)?;
                Ok(())
            }
            Category::Cmd => {
                ensure_success(&out)?;
                let command = out.output_text();
                let command = command.trim();
                if !ctx.gate.is_allowed(command) {
                    tracing::warn!(command, "command rejected by safety gate");
                    return Err(StepError::CommandRejected(command.to_string()));
                }
                let cwd = self.command_cwd(step, ctx);
                run_command(command, &cwd, self.config.command_timeout(), &self.stop).await
            }
            Category::TemplateEngine => Err(StepError::WrongCategory {
                module: record.name,
                category: record.category,
            }),
        }
    }

    async fn invoke_step_plugin(
        &self,
        step: &Step,
        record: &ModuleRecord,
        ctx: &RunContext,
    ) -> Result<Invocation, StepError> {
        let mut config = HashMap::new();
        config.insert(CONFIG_VALUES.to_string(), ctx.values_json.clone());
        let mut bindings = HostBindings::new();
        if record.category == Category::Filer {
            let wire = ctx.tree.as_deref().map(flatten).unwrap_or_default();
            config.insert(CONFIG_FOLDER_STRUCT.to_string(), serde_json::to_string(&wire)?);
            bindings = bindings.with_renderer(Arc::new(ctx.bridge.clone()));
        }
        let sandbox = ctx.host.step_policy(record.category, &ctx.project_root);
        let payload = if step.params.is_empty() {
            Vec::new()
        } else {
            serde_json::to_vec(&step.params)?
        };

        let host = ctx.host.clone();
        let record = record.clone();
        let action = step.action;
        let task = tokio::task::spawn_blocking(move || -> Result<Invocation, PluginError> {
            let handle = host.open(&record, config, sandbox)?.with_bindings(bindings);
            handle.invoke(action.as_str(), &payload)
        });
        Ok(self.race(task).await??)
    }

    fn watchdog(&self) -> Watchdog {
        Watchdog {
            engine: self.engine.clone(),
            stop: self.stop.clone(),
            timeout: self.config.plugin_timeout(),
        }
    }

    async fn race<T>(&self, task: tokio::task::JoinHandle<T>) -> Result<T, StepError>
    where
        T: Send + 'static,
    {
        self.watchdog().race(task).await
    }

    fn command_cwd(&self, step: &Step, ctx: &RunContext) -> PathBuf {
        match &step.cwd {
            Some(cwd) if !cwd.is_empty() => self.base_dir.join(cwd),
            _ => ctx.project_root.clone(),
        }
    }

    fn write_license(&self, ctx: &RunContext) -> Result<(), StepError> {
        let variable = self.workflow.license_variable();
        let selected = ctx
            .values
            .get_text(variable)
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let Some(id) = selected else {
            tracing::warn!(variable, "no license selected, skipping license step");
            return Ok(());
        };
        let text = render_license(self.licenses.as_ref(), id, &ctx.values)?;
        let path = ctx.project_root.join("LICENSE");
        std::fs::write(&path, text)?;
        tracing::info!(license = id, path = %path.display(), "license written");
        Ok(())
    }
}

/// Bounds one blocking plugin call by the plugin timeout and the stop signal.
#[derive(Clone)]
struct Watchdog {
    engine: WasmEngine,
    stop: StopSignal,
    timeout: Duration,
}

impl Watchdog {
    /// Either bound interrupts running guests.
    async fn race<T>(&self, mut task: tokio::task::JoinHandle<T>) -> Result<T, StepError>
    where
        T: Send + 'static,
    {
        tokio::select! {
            joined = &mut task => joined.map_err(|e| {
                StepError::Execution(PluginError::ExecutionError(format!("plugin task failed: {}", e)))
            }),
            _ = tokio::time::sleep(self.timeout) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "plugin call timed out, interrupting");
                self.engine.interrupt();
                Err(StepError::Timeout(self.timeout))
            }
            _ = self.stop.cancelled() => {
                tracing::warn!("run cancelled, interrupting plugin");
                self.engine.interrupt();
                Err(StepError::Cancelled)
            }
        }
    }
}

fn ensure_success(out: &Invocation) -> Result<(), StepError> {
    if out.is_success() {
        Ok(())
    } else {
        Err(StepError::PluginFailed {
            exit_code: out.exit_code,
            message: out.output_text(),
        })
    }
}

fn wrap_step_error(step: &Step, error: StepError) -> WorkflowError {
    if matches!(error, StepError::Cancelled) {
        return WorkflowError::Cancelled;
    }
    let ctx = error.error_context();
    tracing::error!(
        step = %step.name,
        module = %step.module,
        action = %step.action,
        code = ?ctx.code,
        class = ?ctx.class,
        "step failed: {}",
        ctx.message
    );
    WorkflowError::StepFailed {
        step: step.name.clone(),
        module: step.module.clone(),
        action: step.action.to_string(),
        error: Box::new(error),
    }
}

/// Builder for configuring a [`WorkflowRunner`].
pub struct WorkflowRunnerBuilder {
    workflow: Workflow,
    registry: Option<Arc<dyn ModuleRegistry>>,
    collector: Option<Arc<dyn VariableCollector>>,
    licenses: Option<Arc<dyn LicenseProvider>>,
    config: EngineConfig,
    base_dir: Option<PathBuf>,
    stop: Option<StopSignal>,
    engine: Option<WasmEngine>,
}

impl WorkflowRunnerBuilder {
    pub fn registry(mut self, registry: Arc<dyn ModuleRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn collector(mut self, collector: Arc<dyn VariableCollector>) -> Self {
        self.collector = Some(collector);
        self
    }

    pub fn license_provider(mut self, licenses: Arc<dyn LicenseProvider>) -> Self {
        self.licenses = Some(licenses);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Directory the project root is created in. Defaults to the current directory.
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn engine(mut self, engine: WasmEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn build(self) -> Result<WorkflowRunner, WorkflowError> {
        let registry = self
            .registry
            .ok_or_else(|| WorkflowError::ConfigError("a module registry is required".into()))?;
        let collector = self
            .collector
            .ok_or_else(|| WorkflowError::ConfigError("a variable collector is required".into()))?;
        let base_dir = match self.base_dir {
            Some(dir) => dir,
            None => std::env::current_dir()
                .map_err(|e| WorkflowError::ConfigError(format!("current directory: {}", e)))?,
        };
        let engine = match self.engine {
            Some(engine) => engine,
            None => WasmEngine::new().map_err(|e| WorkflowError::InternalError(e.to_string()))?,
        };
        Ok(WorkflowRunner {
            workflow: self.workflow,
            registry,
            collector,
            licenses: self
                .licenses
                .unwrap_or_else(|| Arc::new(BundledLicenses)),
            config: self.config,
            base_dir,
            stop: self.stop.unwrap_or_default(),
            engine,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collector::PresetCollector;
    use crate::dsl::{default_workflow, ValueType, VariableDef};
    use crate::registry::InMemoryModuleRegistry;

    fn runner(workflow: Workflow, values: RuntimeValues, base: &Path) -> WorkflowRunner {
        WorkflowRunner::builder(workflow)
            .registry(Arc::new(InMemoryModuleRegistry::new()))
            .collector(Arc::new(PresetCollector::new(values)))
            .base_dir(base)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_registry_and_collector() {
        let err = WorkflowRunner::builder(Workflow::default()).build().err().unwrap();
        assert!(matches!(err, WorkflowError::ConfigError(_)));

        let err = WorkflowRunner::builder(Workflow::default())
            .registry(Arc::new(InMemoryModuleRegistry::new()))
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("collector"));
    }

    #[tokio::test]
    async fn test_create_root_without_project_name_var() {
        let dir = tempfile::tempdir().unwrap();
        let mut wf = default_workflow();
        wf.vars.shift_remove(PROJECT_NAME_VAR);
        let values = RuntimeValues::new().with("project_name", "demo");

        let err = runner(wf, values, dir.path()).run().await.unwrap_err();
        assert!(matches!(err, WorkflowError::MissingVariable(ref v) if v == "project_name"));
        assert!(!dir.path().join("demo").exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_empty_workflow_completes_in_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let report = runner(Workflow::default(), RuntimeValues::new(), dir.path())
            .run()
            .await
            .unwrap();
        assert!(report.is_completed());
        assert_eq!(report.project_root.as_deref(), Some(dir.path()));
        assert!(report.steps.is_empty());
        assert!(!report.run_id.is_empty());
    }

    #[tokio::test]
    async fn test_tree_declined() {
        let dir = tempfile::tempdir().unwrap();
        let mut wf = default_workflow();
        wf.steps.clear();
        let runner = WorkflowRunner::builder(wf)
            .registry(Arc::new(InMemoryModuleRegistry::new()))
            .collector(Arc::new(
                PresetCollector::new(RuntimeValues::new().with("project_name", "demo"))
                    .with_confirm(Decision::Decline),
            ))
            .base_dir(dir.path())
            .build()
            .unwrap();
        let report = runner.run().await.unwrap();
        assert_eq!(
            report.outcome,
            RunOutcome::Declined(DeclineReason::TreeNotConfirmed)
        );
        assert!(!dir.path().join("demo").exists());
    }

    #[tokio::test]
    async fn test_required_variable_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut wf = Workflow::default();
        wf.vars.insert(
            "author".into(),
            VariableDef::new(ValueType::String).required(),
        );
        let err = runner(wf, RuntimeValues::new(), dir.path())
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::MissingVariable(ref v) if v == "author"));
    }

    #[tokio::test]
    async fn test_project_name_must_stay_inside_base() {
        let dir = tempfile::tempdir().unwrap();
        let mut wf = default_workflow();
        wf.steps.clear();
        wf.folder_struct = None;
        let values = RuntimeValues::new()
            .with("project_name", "../escape")
            .with("license", "unlicense");
        let err = runner(wf, values, dir.path()).run().await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidVariable { .. }));
    }

    #[tokio::test]
    async fn test_license_step() {
        let dir = tempfile::tempdir().unwrap();
        let mut wf = default_workflow();
        wf.folder_struct = None;
        wf.steps = vec![Step::new("license", LICENSE_MODULE, ModuleAction::CreateFile)];
        let values = RuntimeValues::new()
            .with("project_name", "demo")
            .with("license", "mit")
            .with("owner", "Jane");
        let report = runner(wf, values, dir.path()).run().await.unwrap();
        assert_eq!(report.steps.len(), 1);
        let text = std::fs::read_to_string(dir.path().join("demo/LICENSE")).unwrap();
        assert!(text.contains("Jane"));
    }

    #[tokio::test]
    async fn test_license_step_without_owner_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut wf = default_workflow();
        wf.folder_struct = None;
        wf.steps = vec![Step::new("license", LICENSE_MODULE, ModuleAction::CreateFile)];
        let values = RuntimeValues::new()
            .with("project_name", "demo")
            .with("license", "mit");
        let err = runner(wf, values, dir.path()).run().await.unwrap_err();
        assert_eq!(err.failed_step(), Some("license"));
        assert!(matches!(err.step_error(), Some(StepError::License(_))));
    }

    #[tokio::test]
    async fn test_license_step_skipped_without_selection() {
        let dir = tempfile::tempdir().unwrap();
        let wf = Workflow {
            steps: vec![Step::new("license", LICENSE_MODULE, ModuleAction::CreateFile)],
            ..Workflow::default()
        };
        let report = runner(wf, RuntimeValues::new(), dir.path())
            .run()
            .await
            .unwrap();
        assert!(report.is_completed());
        assert!(!dir.path().join("LICENSE").exists());
    }

    #[tokio::test]
    async fn test_unknown_module_fails_step() {
        let dir = tempfile::tempdir().unwrap();
        let wf = Workflow {
            steps: vec![Step::new("git init", "git", ModuleAction::Init)],
            ..Workflow::default()
        };
        let err = runner(wf, RuntimeValues::new(), dir.path())
            .run()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::StepFailed { ref step, ref module, ref action, .. }
                if step == "git init" && module == "git" && action == "init"
        ));
        assert!(matches!(err.step_error(), Some(StepError::ModuleNotFound(_))));
    }

    #[tokio::test]
    async fn test_cancelled_before_steps() {
        let dir = tempfile::tempdir().unwrap();
        let wf = Workflow {
            steps: vec![Step::new("git init", "git", ModuleAction::Init)],
            ..Workflow::default()
        };
        let runner = runner(wf, RuntimeValues::new(), dir.path());
        runner.stop_signal().trigger();
        let err = runner.run().await.unwrap_err();
        assert!(matches!(err, WorkflowError::Cancelled));
    }
}
