//! Step outcome recording and the run report.
//!
//! The recorder freezes each step's outcome as it finishes and aggregates
//! the run verdict the surrounding tooling consumes: a run passes when no
//! fatal failure aborted it; warning-only findings are counted but do not
//! fail the run.

use crate::step::{Step, StepOutcome};
use serde::Serialize;
use std::collections::BTreeMap;

/// Status of one recorded step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Verified successfully with no findings
    Passed,
    /// Verified successfully, warnings recorded
    PassedWithWarnings,
    /// Verification ran and did not accept the effect
    Failed,
}

/// Frozen outcome of one step
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// Step ordinal
    pub number: u32,
    /// Action name
    pub action: String,
    /// Raw target description
    pub target: String,
    /// Whether resolution found a visible candidate
    pub target_found: Option<bool>,
    /// Whether the effect was verified
    pub action_succeeded: Option<bool>,
    /// Status derived from the outcome
    pub status: StepStatus,
    /// Warnings in the order recorded
    pub warnings: Vec<String>,
    /// Diagnostic details (strategy, verification method, ...)
    pub details: BTreeMap<String, serde_json::Value>,
}

/// Aggregated result of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Run name from the script
    pub name: String,
    /// Per-step records in execution order
    pub steps: Vec<StepRecord>,
    /// Fatal failure that aborted the run, if any
    pub fatal: Option<String>,
    /// Whether the run passed (no fatal failure)
    pub passed: bool,
}

impl RunReport {
    /// Steps whose verification did not accept the effect
    #[must_use]
    pub fn failed_steps(&self) -> Vec<u32> {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Failed)
            .map(|s| s.number)
            .collect()
    }

    /// Total warnings across all steps
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.steps.iter().map(|s| s.warnings.len()).sum()
    }

    /// Serialize the report to pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Accumulates step records during a run
#[derive(Debug)]
pub struct OutcomeRecorder {
    name: String,
    steps: Vec<StepRecord>,
}

impl OutcomeRecorder {
    /// Recorder for a named run
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Freeze a step's outcome.
    ///
    /// An unset `action_succeeded` at this point is a pipeline defect: the
    /// step is recorded as failed with an explicit warning rather than
    /// silently counted as passed.
    pub fn record(&mut self, step: &Step) {
        let StepOutcome {
            target_found,
            action_succeeded,
            mut warnings,
            details,
        } = step.outcome.clone();

        let status = match action_succeeded {
            Some(true) if warnings.is_empty() => StepStatus::Passed,
            Some(true) => StepStatus::PassedWithWarnings,
            Some(false) => StepStatus::Failed,
            None => {
                warnings.push("step finished without a verification verdict".to_string());
                StepStatus::Failed
            }
        };

        tracing::info!(
            step = step.number,
            action = step.action.name(),
            ?status,
            "step recorded"
        );

        self.steps.push(StepRecord {
            number: step.number,
            action: step.action.name().to_string(),
            target: step.target.clone(),
            target_found,
            action_succeeded,
            status,
            warnings,
            details,
        });
    }

    /// Finish the run and produce the report
    #[must_use]
    pub fn finish(self, fatal: Option<String>) -> RunReport {
        RunReport {
            name: self.name,
            passed: fatal.is_none(),
            steps: self.steps,
            fatal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{ActionKind, Step};

    fn verified_step(number: u32) -> Step {
        let mut step = Step::new(number, ActionKind::Click, "Confirmar");
        step.outcome.target_found = Some(true);
        step.outcome.action_succeeded = Some(true);
        step
    }

    #[test]
    fn test_clean_run_passes() {
        let mut recorder = OutcomeRecorder::new("sales-flow");
        recorder.record(&verified_step(1));
        recorder.record(&verified_step(2));

        let report = recorder.finish(None);
        assert!(report.passed);
        assert_eq!(report.steps.len(), 2);
        assert!(report.failed_steps().is_empty());
        assert_eq!(report.warning_count(), 0);
    }

    #[test]
    fn test_fatal_fails_the_run() {
        let mut recorder = OutcomeRecorder::new("sales-flow");
        recorder.record(&verified_step(1));

        let report = recorder.finish(Some("Step 2: target not found".to_string()));
        assert!(!report.passed);
        assert_eq!(report.fatal.as_deref(), Some("Step 2: target not found"));
    }

    #[test]
    fn test_warnings_do_not_fail_the_run() {
        let mut step = verified_step(1);
        step.outcome.warn("filter panel did not open");

        let mut recorder = OutcomeRecorder::new("run");
        recorder.record(&step);
        let report = recorder.finish(None);

        assert!(report.passed);
        assert_eq!(report.steps[0].status, StepStatus::PassedWithWarnings);
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn test_unset_verdict_is_a_defect() {
        let mut step = Step::new(1, ActionKind::Click, "Confirmar");
        step.outcome.target_found = Some(true);

        let mut recorder = OutcomeRecorder::new("run");
        recorder.record(&step);
        let report = recorder.finish(None);

        assert_eq!(report.steps[0].status, StepStatus::Failed);
        assert!(report.steps[0]
            .warnings
            .iter()
            .any(|w| w.contains("without a verification verdict")));
    }

    #[test]
    fn test_report_serializes() {
        let mut recorder = OutcomeRecorder::new("run");
        recorder.record(&verified_step(1));
        let json = recorder.finish(None).to_json().unwrap();
        assert!(json.contains("\"passed\": true"));
    }
}
