//! Pre-action validation: does the target exist and is it interactable?
//!
//! Runs before dispatch, mutates `step.outcome.target_found`, and decides
//! what the dispatcher will do. Blocking action kinds abort the run when
//! resolution yields no visible candidate; non-blocking kinds record a
//! warning and skip execution. The diagnostics capturer runs before any
//! blocking failure propagates.

use crate::diagnostics::DiagnosticsCapturer;
use crate::driver::{ElementHandle, FieldHandle, PageDriver};
use crate::resolve::TargetResolver;
use crate::result::{EnsaioError, EnsaioResult};
use crate::step::{ActionKind, Step};
use crate::validate::navigation::MenuPath;

/// What the dispatcher should execute for a validated step
#[derive(Debug, Clone)]
pub enum PreparedAction {
    /// Interact with a resolved element (click, hover, open record/filters)
    Interact {
        /// Winning candidate
        handle: ElementHandle,
    },
    /// Fill a resolved field with a value
    FillField {
        /// Field resolved through its label
        field: FieldHandle,
        /// Value to write
        value: String,
    },
    /// Walk the application menu to a destination
    Navigate {
        /// Parsed destination
        path: MenuPath,
    },
    /// Nothing to dispatch (missing non-blocking target, already at the
    /// destination, unknown action kind)
    Skip,
}

/// Validate a step before dispatch.
///
/// Mutates the step's outcome; raises [`EnsaioError::TargetNotFound`] for
/// blocking kinds whose target is missing, unless the step is static.
pub async fn validate_before(
    step: &mut Step,
    driver: &dyn PageDriver,
    diagnostics: &DiagnosticsCapturer,
) -> EnsaioResult<PreparedAction> {
    match step.action {
        ActionKind::Click | ActionKind::OpenFilters | ActionKind::OpenRecord => {
            resolve_element(step, driver, diagnostics).await
        }
        ActionKind::Hover => {
            let resolver = TargetResolver::new(driver);
            let desc = resolver.describe(&step.target, step.context);
            let result = resolver.resolve(&desc).await?;
            match result.selected() {
                Some(handle) => {
                    step.outcome.target_found = Some(true);
                    record_strategy(step, &result);
                    Ok(PreparedAction::Interact {
                        handle: handle.clone(),
                    })
                }
                None => {
                    step.outcome.target_found = Some(false);
                    step.outcome
                        .warn(format!("hover target '{}' not found, skipping", step.target));
                    Ok(PreparedAction::Skip)
                }
            }
        }
        ActionKind::Fill => validate_fill(step, driver, diagnostics).await,
        ActionKind::GoTo => validate_goto(step, driver).await,
        ActionKind::Other => {
            let resolver = TargetResolver::new(driver);
            if step.target.trim().is_empty() {
                step.outcome.target_found = Some(true);
            } else {
                let desc = resolver.describe(&step.target, step.context);
                let result = resolver.resolve(&desc).await?;
                step.outcome.target_found = Some(result.selected().is_some());
                if result.selected().is_none() {
                    step.outcome
                        .warn(format!("target '{}' not found", step.target));
                } else {
                    record_strategy(step, &result);
                }
            }
            Ok(PreparedAction::Skip)
        }
    }
}

async fn resolve_element(
    step: &mut Step,
    driver: &dyn PageDriver,
    diagnostics: &DiagnosticsCapturer,
) -> EnsaioResult<PreparedAction> {
    let resolver = TargetResolver::new(driver);
    let desc = resolver.describe(&step.target, step.context);
    let result = resolver.resolve(&desc).await?;

    if let Some(handle) = result.selected() {
        step.outcome.target_found = Some(true);
        record_strategy(step, &result);
        return Ok(PreparedAction::Interact {
            handle: handle.clone(),
        });
    }

    step.outcome.target_found = Some(false);
    blocking_miss(step, driver, diagnostics).await
}

async fn validate_fill(
    step: &mut Step,
    driver: &dyn PageDriver,
    diagnostics: &DiagnosticsCapturer,
) -> EnsaioResult<PreparedAction> {
    let (label, value) = step.field_pairing();
    if let Some(field) = driver.find_field_by_label(&label, step.context).await? {
        step.outcome.target_found = Some(true);
        step.outcome.set_detail("field_name", field.field_name.clone());
        step.outcome
            .set_detail("field_kind", format!("{:?}", field.kind).to_lowercase());
        return Ok(PreparedAction::FillField { field, value });
    }

    step.outcome.target_found = Some(false);
    blocking_miss(step, driver, diagnostics).await
}

async fn validate_goto(step: &mut Step, driver: &dyn PageDriver) -> EnsaioResult<PreparedAction> {
    let path = MenuPath::parse(&step.target);
    if path.top.is_empty() {
        step.outcome.target_found = Some(false);
        step.outcome.warn("goto step has an empty destination");
        return Ok(PreparedAction::Skip);
    }

    if already_at_destination(driver, &path).await? {
        step.outcome.target_found = Some(true);
        step.outcome.set_detail("navigation", "already there");
        return Ok(PreparedAction::Skip);
    }

    step.outcome.target_found = Some(true);
    Ok(PreparedAction::Navigate { path })
}

/// The destination counts as current when its application is active and
/// any requested sub-path already shows in the address or title
async fn already_at_destination(driver: &dyn PageDriver, path: &MenuPath) -> EnsaioResult<bool> {
    if !driver.is_current_application(&path.top).await? {
        return Ok(false);
    }
    match path.sub {
        None => Ok(true),
        Some(ref sub) => {
            let address = driver.current_address().await?.to_lowercase();
            let title = driver.current_title().await?.to_lowercase();
            Ok(address.contains(sub.as_str()) || title.contains(sub.as_str()))
        }
    }
}

async fn blocking_miss(
    step: &mut Step,
    driver: &dyn PageDriver,
    diagnostics: &DiagnosticsCapturer,
) -> EnsaioResult<PreparedAction> {
    let reason = format!(
        "target not found for {}: '{}'",
        step.action.name(),
        step.target
    );

    if step.is_static {
        step.outcome
            .warn(format!("{reason} (static step, continuing)"));
        return Ok(PreparedAction::Skip);
    }

    diagnostics
        .capture(driver, step.number, step.action.name(), &reason)
        .await;
    Err(EnsaioError::TargetNotFound {
        step: step.number,
        action: step.action.name(),
        target: step.target.clone(),
    })
}

fn record_strategy(step: &mut Step, result: &crate::resolve::ResolutionResult) {
    if let Some(ref strategy) = result.strategy {
        step.outcome
            .set_detail("resolution_strategy", strategy.label());
    }
}
