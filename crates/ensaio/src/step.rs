//! Step data model: one instruction in a declarative test script.
//!
//! A [`Step`] is created by the runner when it begins executing the
//! instruction, is mutated in place by the pre/post validators (outcome
//! fields), and is frozen once the outcome recorder reads it. Steps are
//! never revisited.

use serde::Serialize;
use std::collections::BTreeMap;

/// What a step does to the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Click a resolved element
    Click,
    /// Fill a logical field located by its label
    Fill,
    /// Hover over a resolved element
    Hover,
    /// Navigate through the application menu
    GoTo,
    /// Open the filter panel of the current view
    OpenFilters,
    /// Open a record from a list view
    OpenRecord,
    /// Anything else; dispatched as a no-op and assumed to succeed
    Other,
}

impl ActionKind {
    /// Lower-case action name used in reports and artifact paths
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Fill => "fill",
            Self::Hover => "hover",
            Self::GoTo => "goto",
            Self::OpenFilters => "open_filters",
            Self::OpenRecord => "open_record",
            Self::Other => "other",
        }
    }

    /// Blocking kinds abort the run when their target cannot be resolved
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        matches!(
            self,
            Self::Click | Self::Fill | Self::OpenFilters | Self::OpenRecord
        )
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Where a step's probes and actions are scoped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecContext {
    /// The whole document
    #[default]
    Default,
    /// The currently visible modal/dialog surface only
    Modal,
}

/// Per-step verdict fields, embedded in [`Step`].
///
/// `target_found` is written by the pre-action validator and
/// `action_succeeded` by the post-action verifier. `action_succeeded` must
/// not be read before both have run; the recorder treats an unset value as
/// a defect in the pipeline itself.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StepOutcome {
    /// Whether resolution produced a visible candidate
    pub target_found: Option<bool>,
    /// Whether the action's effect was verified
    pub action_succeeded: Option<bool>,
    /// Non-fatal findings, in the order they were recorded
    pub warnings: Vec<String>,
    /// Diagnostic key/value pairs (winning strategy, verification method, ...)
    pub details: BTreeMap<String, serde_json::Value>,
}

impl StepOutcome {
    /// Append a warning and log it
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.warnings.push(message);
    }

    /// Record a diagnostic detail
    pub fn set_detail(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        self.details.insert(key.to_string(), value.into());
    }
}

/// One instruction in a test script
#[derive(Debug, Clone, Serialize)]
pub struct Step {
    /// Ordinal number (1-based, immutable)
    pub number: u32,
    /// Action kind
    pub action: ActionKind,
    /// Raw target description as authored
    pub target: String,
    /// Value for fill steps when not embedded in the target as `label = value`
    pub value: Option<String>,
    /// Execution context requested by the step
    pub context: ExecContext,
    /// A static step is expected to cause no state change; verification
    /// failures are downgraded to warnings and never abort the run.
    pub is_static: bool,
    /// Accumulated verdicts
    pub outcome: StepOutcome,
}

impl Step {
    /// Create a step with an empty outcome
    #[must_use]
    pub fn new(number: u32, action: ActionKind, target: impl Into<String>) -> Self {
        Self {
            number,
            action,
            target: target.into(),
            value: None,
            context: ExecContext::Default,
            is_static: false,
            outcome: StepOutcome::default(),
        }
    }

    /// Set the fill value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the execution context
    #[must_use]
    pub const fn with_context(mut self, context: ExecContext) -> Self {
        self.context = context;
        self
    }

    /// Mark the step as static (state-preserving)
    #[must_use]
    pub const fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// Split a fill target into its `label = value` pairing.
    ///
    /// The explicit `value` field wins over an embedded `=`; with neither,
    /// the whole target is the label and the value is empty.
    #[must_use]
    pub fn field_pairing(&self) -> (String, String) {
        if let Some(ref value) = self.value {
            return (self.target.trim().to_string(), value.clone());
        }
        match self.target.split_once('=') {
            Some((label, value)) => (label.trim().to_string(), value.trim().to_string()),
            None => (self.target.trim().to_string(), String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocking_kinds() {
        assert!(ActionKind::Click.is_blocking());
        assert!(ActionKind::Fill.is_blocking());
        assert!(ActionKind::OpenFilters.is_blocking());
        assert!(ActionKind::OpenRecord.is_blocking());
        assert!(!ActionKind::Hover.is_blocking());
        assert!(!ActionKind::GoTo.is_blocking());
        assert!(!ActionKind::Other.is_blocking());
    }

    #[test]
    fn test_field_pairing_embedded() {
        let step = Step::new(1, ActionKind::Fill, "Cliente = Azure Interior");
        assert_eq!(
            step.field_pairing(),
            ("Cliente".to_string(), "Azure Interior".to_string())
        );
    }

    #[test]
    fn test_field_pairing_explicit_value_wins() {
        let step = Step::new(1, ActionKind::Fill, "Cliente").with_value("Deco Addict");
        assert_eq!(
            step.field_pairing(),
            ("Cliente".to_string(), "Deco Addict".to_string())
        );
    }

    #[test]
    fn test_field_pairing_label_only() {
        let step = Step::new(1, ActionKind::Fill, "Notas");
        assert_eq!(step.field_pairing(), ("Notas".to_string(), String::new()));
    }

    #[test]
    fn test_outcome_accumulates_warnings_in_order() {
        let mut outcome = StepOutcome::default();
        outcome.warn("first");
        outcome.warn("second");
        assert_eq!(outcome.warnings, vec!["first", "second"]);
    }

    #[test]
    fn test_outcome_detail_roundtrip() {
        let mut outcome = StepOutcome::default();
        outcome.set_detail("resolution_strategy", "css selector");
        assert_eq!(
            outcome.details.get("resolution_strategy"),
            Some(&serde_json::Value::from("css selector"))
        );
    }
}
