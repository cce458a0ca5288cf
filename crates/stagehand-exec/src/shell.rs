use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    process::Stdio,
    sync::Arc,
};

use async_trait::async_trait;
use stagehand_model::{RunnerConfig, SecretConfig, Stage, Step};
use stagehand_remote::{ExternalSecrets, RunnerError, SecretProvider, StageRunner};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::{
    error::ExecError,
    util::{kill_graceful, shell_command},
};

/// Runs every command of every step through the host shell.
///
/// Each stage gets its own workspace directory, `<root>/<stage id>`. Steps run
/// in order and the first failing command fails the stage.
pub struct ShellRunner {
    root: PathBuf,
    environ: BTreeMap<String, String>,
    symlinks: BTreeMap<String, String>,
    secrets: Option<Arc<dyn SecretProvider>>,
}

impl ShellRunner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            environ: BTreeMap::new(),
            symlinks: BTreeMap::new(),
            secrets: None,
        }
    }

    /// Runner settings plus the external secret resolver, when one is configured.
    pub fn from_config(runner: &RunnerConfig, secret: &SecretConfig) -> Result<Self, ExecError> {
        let mut shell = Self::new(&runner.root)
            .with_environ(runner.environ.clone())
            .with_symlinks(runner.symlinks.clone());
        if let Some(external) =
            ExternalSecrets::from_config(secret).map_err(|e| ExecError::SecretResolver(e.to_string()))?
        {
            info!(target: "stagehand::exec", endpoint = external.endpoint(), "using external secrets");
            shell = shell.with_secrets(Arc::new(external));
        }
        Ok(shell)
    }

    /// Variables added to every command; step variables take precedence.
    pub fn with_environ(mut self, environ: BTreeMap<String, String>) -> Self {
        self.environ = environ;
        self
    }

    /// Links created inside each workspace: link path (relative) to target.
    pub fn with_symlinks(mut self, symlinks: BTreeMap<String, String>) -> Self {
        self.symlinks = symlinks;
        self
    }

    pub fn with_secrets(mut self, secrets: Arc<dyn SecretProvider>) -> Self {
        self.secrets = Some(secrets);
        self
    }

    #[inline]
    pub fn has_secrets(&self) -> bool {
        self.secrets.is_some()
    }

    pub fn workspace(&self, stage: &Stage) -> PathBuf {
        self.root.join(stage.id.to_string())
    }

    async fn prepare(&self, workspace: &Path) -> Result<(), ExecError> {
        let wrap = |path: &Path, e: std::io::Error| ExecError::Workspace {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        tokio::fs::create_dir_all(workspace)
            .await
            .map_err(|e| wrap(workspace, e))?;

        for (link, target) in &self.symlinks {
            let link = workspace.join(link);
            if let Some(parent) = link.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| wrap(parent, e))?;
            }
            cfg_if::cfg_if! {
                if #[cfg(target_family = "unix")] {
                    tokio::fs::symlink(target, &link).await.map_err(|e| wrap(&link, e))?;
                } else {
                    warn!(link = %link.display(), target, "symlinks are not supported on this platform");
                }
            }
        }
        Ok(())
    }

    fn environ(&self, stage: &Stage, step: &Step) -> BTreeMap<String, String> {
        let mut env = self.environ.clone();
        env.insert("CI".into(), "true".into());
        env.insert("STAGEHAND_STAGE_ID".into(), stage.id.to_string());
        env.insert("STAGEHAND_STAGE_NAME".into(), stage.name.clone());
        env.insert("STAGEHAND_REPO".into(), stage.repo.slug.clone());
        env.insert("STAGEHAND_EVENT".into(), stage.event.clone());
        env.insert("STAGEHAND_STEP".into(), step.name.clone());
        env.extend(step.environ.iter().map(|(k, v)| (k.clone(), v.clone())));
        env
    }

    /// Resolve the step's secrets into environment variables.
    async fn resolve_secrets(
        &self,
        stage: &Stage,
        step: &Step,
        env: &mut BTreeMap<String, String>,
    ) -> Result<(), ExecError> {
        if step.secrets.is_empty() {
            return Ok(());
        }
        let Some(provider) = &self.secrets else {
            warn!(target: "stagehand::exec", step = %step.name, "step needs secrets but no resolver is configured");
            return Ok(());
        };
        for name in &step.secrets {
            let value = provider.find(name, stage).await.map_err(|e| ExecError::Secret {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            match value {
                Some(value) => {
                    env.insert(name.to_ascii_uppercase(), value);
                }
                None => debug!(target: "stagehand::exec", step = %step.name, secret = %name, "secret not found"),
            }
        }
        Ok(())
    }

    async fn run_command(
        &self,
        ctx: &CancellationToken,
        workspace: &Path,
        step: &Step,
        env: &BTreeMap<String, String>,
        script: &str,
    ) -> Result<(), ExecError> {
        let mut cmd = shell_command(script);
        cmd.current_dir(workspace)
            .envs(env)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        trace!(target: "stagehand::exec", step = %step.name, %script, "spawn");
        let mut child = cmd.spawn().map_err(|e| ExecError::Spawn {
            step: step.name.clone(),
            reason: e.to_string(),
        })?;

        tokio::select! {
            status = child.wait() => {
                let status = status?;
                if status.success() {
                    return Ok(());
                }
                match status.code() {
                    Some(code) => {
                        debug!(target: "stagehand::exec", step = %step.name, code, "exit non-zero");
                        Err(ExecError::NonZeroExit { step: step.name.clone(), code })
                    }
                    None => Err(ExecError::KilledBySignal { step: step.name.clone() }),
                }
            }
            _ = ctx.cancelled() => {
                debug!(target: "stagehand::exec", step = %step.name, "cancelled; killing child");
                if let Err(e) = kill_graceful(&mut child).await {
                    warn!(target: "stagehand::exec", error = %e, "failed to kill child");
                }
                Err(ExecError::Cancelled)
            }
        }
    }

    /// Run all steps of `stage` in its workspace.
    pub async fn execute(&self, ctx: &CancellationToken, stage: &Stage) -> Result<(), ExecError> {
        let workspace = self.workspace(stage);
        self.prepare(&workspace).await?;

        for step in &stage.steps {
            if ctx.is_cancelled() {
                return Err(ExecError::Cancelled);
            }
            info!(target: "stagehand::exec", stage = stage.id, step = %step.name, "running step");
            let mut env = self.environ(stage, step);
            self.resolve_secrets(stage, step, &mut env).await?;
            for script in &step.commands {
                self.run_command(ctx, &workspace, step, &env, script).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl StageRunner for ShellRunner {
    async fn run(&self, ctx: CancellationToken, stage: &Stage) -> Result<(), RunnerError> {
        Ok(self.execute(&ctx, stage).await?)
    }
}
