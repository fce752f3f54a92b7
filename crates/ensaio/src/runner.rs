//! The per-step pipeline: resolve, pre-validate, dispatch, verify, record.
//!
//! Steps run strictly in sequence; every probe and action is awaited
//! immediately, and step N+1 never starts before step N's verifier has
//! returned or raised. A fatal failure (unresolved blocking target,
//! unaccepted navigation) aborts the remaining steps; there is no
//! partial rollback or resume.

use crate::diagnostics::DiagnosticsCapturer;
use crate::dispatch::{dispatch, SETTLE_DELAY_MS};
use crate::driver::PageDriver;
use crate::recorder::{OutcomeRecorder, RunReport};
use crate::result::EnsaioResult;
use crate::script::Script;
use crate::step::Step;
use crate::validate::navigation::NavState;
use crate::validate::{validate_after, validate_before};
use std::path::PathBuf;
use std::time::Duration;

/// Runner knobs
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Root directory for diagnostic artifacts
    pub artifacts_dir: PathBuf,
    /// Delay applied after each dispatched action
    pub settle_delay: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: PathBuf::from("ensaio-artifacts"),
            settle_delay: Duration::from_millis(SETTLE_DELAY_MS),
        }
    }
}

impl RunnerConfig {
    /// Set the artifacts directory
    #[must_use]
    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = dir.into();
        self
    }

    /// Set the settle delay
    #[must_use]
    pub const fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

/// Executes a script against a page driver
pub struct StepRunner<'d> {
    driver: &'d dyn PageDriver,
    config: RunnerConfig,
}

impl std::fmt::Debug for StepRunner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepRunner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<'d> StepRunner<'d> {
    /// Runner over a driver with default configuration
    #[must_use]
    pub fn new(driver: &'d dyn PageDriver) -> Self {
        Self {
            driver,
            config: RunnerConfig::default(),
        }
    }

    /// Runner with explicit configuration
    #[must_use]
    pub fn with_config(driver: &'d dyn PageDriver, config: RunnerConfig) -> Self {
        Self { driver, config }
    }

    /// Run all steps of a script and produce the report.
    ///
    /// Never returns an error: failures are folded into the report, with
    /// the fatal one (if any) recorded as the abort reason.
    pub async fn run(&self, script: &Script) -> RunReport {
        let diagnostics = DiagnosticsCapturer::new(&self.config.artifacts_dir, &script.name);
        let mut recorder = OutcomeRecorder::new(&script.name);
        let mut fatal = None;

        tracing::info!(run = %script.name, steps = script.steps.len(), "run started");

        for mut step in script.to_steps() {
            let result = self.execute_step(&mut step, &diagnostics).await;
            recorder.record(&step);
            if let Err(e) = result {
                tracing::error!(step = step.number, "run aborted: {e}");
                fatal = Some(e.to_string());
                break;
            }
        }

        let report = recorder.finish(fatal);
        tracing::info!(run = %report.name, passed = report.passed, "run finished");
        report
    }

    /// One trip through the pipeline for a single step
    async fn execute_step(
        &self,
        step: &mut Step,
        diagnostics: &DiagnosticsCapturer,
    ) -> EnsaioResult<()> {
        tracing::debug!(
            step = step.number,
            action = step.action.name(),
            step_target = %step.target,
            "step started"
        );

        let prepared = validate_before(step, self.driver, diagnostics).await?;
        let before = NavState::capture(self.driver).await?;

        if let Err(e) = dispatch(step, &prepared, self.driver, self.config.settle_delay).await {
            if e.is_fatal() {
                diagnostics
                    .capture(self.driver, step.number, step.action.name(), &e.to_string())
                    .await;
            }
            return Err(e);
        }

        validate_after(step, self.driver, &before).await
    }
}
