//! Step-script loading.
//!
//! Scripts are YAML documents naming the run and its steps:
//!
//! ```yaml
//! name: "sales-confirm"
//! base_address: "https://erp.local/web"
//! steps:
//!   - action: goto
//!     target: "Vendas > Pedidos"
//!   - action: open_record
//!     target: "S00042"
//!   - action: fill
//!     target: "Cliente = Azure Interior"
//!   - action: click
//!     target: "Confirmar"
//!     context: modal
//!   - action: hover
//!     target: "Entrega"
//!     static: true
//! ```
//!
//! Validation runs at load time; a malformed script never reaches the
//! browser.

use crate::result::{EnsaioError, EnsaioResult};
use crate::step::{ActionKind, ExecContext, Step};
use serde::Deserialize;
use std::path::Path;

/// Action names accepted in scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSpec {
    /// Click a target
    Click,
    /// Fill a labeled field
    Fill,
    /// Hover over a target
    Hover,
    /// Navigate through the application menu
    Goto,
    /// Open the filter panel
    OpenFilters,
    /// Open a record from a list view
    OpenRecord,
    /// Unverified action, assumed to succeed
    Other,
}

impl ActionSpec {
    const fn kind(self) -> ActionKind {
        match self {
            Self::Click => ActionKind::Click,
            Self::Fill => ActionKind::Fill,
            Self::Hover => ActionKind::Hover,
            Self::Goto => ActionKind::GoTo,
            Self::OpenFilters => ActionKind::OpenFilters,
            Self::OpenRecord => ActionKind::OpenRecord,
            Self::Other => ActionKind::Other,
        }
    }

    /// Whether a script step of this kind must name a target
    const fn requires_target(self) -> bool {
        !matches!(self, Self::OpenFilters | Self::Other)
    }
}

/// One step as authored in the script
#[derive(Debug, Clone, Deserialize)]
pub struct StepSpec {
    /// Action kind
    pub action: ActionSpec,
    /// Target description
    #[serde(default)]
    pub target: Option<String>,
    /// Fill value when not embedded in the target
    #[serde(default)]
    pub value: Option<String>,
    /// Execution context
    #[serde(default)]
    pub context: ContextSpec,
    /// Expected to cause no state change
    #[serde(rename = "static", default)]
    pub is_static: bool,
}

/// Execution context names accepted in scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextSpec {
    /// Whole document
    #[default]
    Default,
    /// Currently visible modal only
    Modal,
}

impl ContextSpec {
    const fn context(self) -> ExecContext {
        match self {
            Self::Default => ExecContext::Default,
            Self::Modal => ExecContext::Modal,
        }
    }
}

/// A loaded step script
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    /// Run name, used for report and artifact namespacing
    pub name: String,
    /// Address the runner opens before the first step
    #[serde(default)]
    pub base_address: Option<String>,
    /// Steps in execution order
    pub steps: Vec<StepSpec>,
}

impl Script {
    /// Parse a script from YAML
    pub fn from_yaml(yaml: &str) -> EnsaioResult<Self> {
        let script: Self =
            serde_yaml_ng::from_str(yaml).map_err(|e| EnsaioError::script(e.to_string()))?;
        script.validate()?;
        Ok(script)
    }

    /// Load and parse a script file
    pub fn from_file(path: impl AsRef<Path>) -> EnsaioResult<Self> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&yaml)
    }

    fn validate(&self) -> EnsaioResult<()> {
        if self.name.trim().is_empty() {
            return Err(EnsaioError::script("script name must not be empty"));
        }
        if self.steps.is_empty() {
            return Err(EnsaioError::script("script has no steps"));
        }
        for (idx, spec) in self.steps.iter().enumerate() {
            let has_target = spec
                .target
                .as_deref()
                .is_some_and(|t| !t.trim().is_empty());
            if spec.action.requires_target() && !has_target {
                return Err(EnsaioError::script(format!(
                    "step {} requires a target",
                    idx + 1
                )));
            }
        }
        Ok(())
    }

    /// Materialize numbered steps for the runner
    #[must_use]
    pub fn to_steps(&self) -> Vec<Step> {
        self.steps
            .iter()
            .enumerate()
            .map(|(idx, spec)| {
                let target = match spec.target.as_deref() {
                    Some(t) => t.to_string(),
                    // The filter control answers to its legacy name
                    None if spec.action == ActionSpec::OpenFilters => "filtros".to_string(),
                    None => String::new(),
                };
                let mut step = Step::new(idx as u32 + 1, spec.action.kind(), target)
                    .with_context(spec.context.context())
                    .with_static(spec.is_static);
                step.value = spec.value.clone();
                step
            })
            .collect()
    }
}
