//! Single-flight supervisor for operator scripts.
//!
//! [`ScriptSupervisor`] owns the script catalog and the process-wide
//! [`ScriptRun`] state. At most one script runs at a time: `execute`
//! claims an atomic flag before spawning the run task, and the flag is only
//! released after the task has ended (normally or by panicking). Every
//! runner event is appended to the run log and forwarded to live
//! subscribers as `script_log`, and each run ends with exactly one
//! `script_finished`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use indexmap::IndexMap;
use llmdash_core::error::CoreError;
use llmdash_core::scripting::catalog::{CatalogError, ScriptCatalog, ScriptDefinition, ScriptSummary};
use llmdash_core::scripting::executor::{CommandExecutor, ShellExecutor};
use llmdash_core::scripting::runner::{CommandRunner, RunOutcome};
use llmdash_core::scripting::status::ScriptRun;
use llmdash_events::{DashboardEvent, EventBroadcaster};

/// Final log line of every run that reached the end of its command list.
const COMPLETED_MESSAGE: &str = "Script execution completed";

pub struct ScriptSupervisor<E = ShellExecutor> {
    running: AtomicBool,
    run: Mutex<ScriptRun>,
    catalog: RwLock<Arc<ScriptCatalog>>,
    catalog_path: PathBuf,
    runner: CommandRunner<E>,
    command_timeout: Duration,
    broadcaster: Arc<EventBroadcaster>,
}

impl<E: CommandExecutor + 'static> ScriptSupervisor<E> {
    pub fn new(
        catalog: ScriptCatalog,
        catalog_path: PathBuf,
        runner: CommandRunner<E>,
        command_timeout: Duration,
        broadcaster: Arc<EventBroadcaster>,
    ) -> Self {
        Self {
            running: AtomicBool::new(false),
            run: Mutex::new(ScriptRun::default()),
            catalog: RwLock::new(Arc::new(catalog)),
            catalog_path,
            runner,
            command_timeout,
            broadcaster,
        }
    }

    /// Start `script_id` in the background.
    ///
    /// Returns as soon as the run task is spawned. Fails with
    /// [`CoreError::AlreadyRunning`] while another run is in progress
    /// (whatever the requested id) and with [`CoreError::ScriptNotFound`]
    /// for unknown ids.
    pub fn execute(self: &Arc<Self>, script_id: &str) -> Result<(), CoreError> {
        let script = self.catalog().get(script_id).cloned();
        let Some(script) = script else {
            if self.is_running() {
                return Err(CoreError::AlreadyRunning);
            }
            tracing::warn!(script_id, "Script not found");
            return Err(CoreError::ScriptNotFound(script_id.to_string()));
        };

        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!(script_id, "Another script is already running");
            return Err(CoreError::AlreadyRunning);
        }

        self.lock_run().start(&script.name);
        tracing::info!(script_id, name = %script.name, commands = script.commands.len(), "Script started");

        let this = Arc::clone(self);
        let script_id = script_id.to_string();
        tokio::spawn(async move {
            let task = {
                let this = Arc::clone(&this);
                tokio::spawn(async move { this.run_script(&script).await })
            };

            let success = match task.await {
                Ok(outcome) => outcome == RunOutcome::Success,
                Err(e) => {
                    tracing::error!(script_id = %script_id, error = %e, "Script task aborted");
                    this.log(format!("Script execution failed: {e}"));
                    false
                }
            };
            this.finish(&script_id, success);
        });

        Ok(())
    }

    /// Snapshot of the current run state.
    pub fn status(&self) -> ScriptRun {
        self.lock_run().clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Name and description of every catalog script.
    pub fn list_scripts(&self) -> IndexMap<String, ScriptSummary> {
        self.catalog().summaries()
    }

    /// Re-read the catalog file and swap it in. On failure the previous
    /// catalog stays in effect. Returns the number of scripts loaded.
    pub async fn reload_catalog(&self) -> Result<usize, CatalogError> {
        let catalog = ScriptCatalog::load(&self.catalog_path).await?;
        let count = catalog.len();
        *self.catalog.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(catalog);
        tracing::info!(path = %self.catalog_path.display(), scripts = count, "Script catalog reloaded");
        Ok(count)
    }

    fn catalog(&self) -> Arc<ScriptCatalog> {
        Arc::clone(&self.catalog.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn lock_run(&self) -> MutexGuard<'_, ScriptRun> {
        self.run.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run_script(&self, script: &ScriptDefinition) -> RunOutcome {
        let outcome = self
            .runner
            .run(&script.commands, self.command_timeout, |event| {
                self.log(event.log_message())
            })
            .await;
        self.log(COMPLETED_MESSAGE);
        outcome
    }

    /// Append a line to the run log and stream it to subscribers.
    fn log(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(message = %message, "Script log");
        self.lock_run().logs.push(message.clone());
        self.broadcaster.publish(DashboardEvent::script_log(message));
    }

    fn finish(&self, script_id: &str, success: bool) {
        self.lock_run().finish();
        self.running.store(false, Ordering::Release);
        tracing::info!(script_id, success, "Script finished");
        self.broadcaster
            .publish(DashboardEvent::ScriptFinished { success });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
