//! Post-action verification: did the action's *effect* occur?
//!
//! A state machine keyed by action kind; each kind has its own acceptance
//! heuristic and the first rule that matches wins. The verification layer
//! favors false positives over flaky false failures: unexpected errors
//! while probing are caught, recorded as warnings, and treated as assumed
//! success. Resolution, in contrast, fails fast.

use crate::driver::{PageDriver, Scope};
use crate::probe::Probe;
use crate::resolve::is_filter_vocabulary;
use crate::result::{EnsaioError, EnsaioResult};
use crate::step::{ActionKind, Step};
use crate::validate::navigation::{accept_navigation, assert_page_identity, MenuPath, NavState};

/// Verdict produced once per step; never retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationVerdict {
    /// An acceptance rule matched
    Succeeded,
    /// The acceptance check ran and did not match
    Failed,
    /// No heuristic applies or verification itself errored; success assumed
    AssumedSucceeded,
}

impl VerificationVerdict {
    /// Label recorded in the step details
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::AssumedSucceeded => "assumed succeeded",
        }
    }
}

/// Markers that show the filter panel is open
pub const FILTER_PANEL_MARKERS: &[&str] =
    &[".o_filter_menu .dropdown-menu", ".o_filter_menu .o_dropdown_menu"];

/// Expanded-state probe for the filter control
pub const FILTER_EXPANDED_PROBE: &str = ".o_control_panel button[aria-expanded=\"true\"]";

/// Verify a step after dispatch.
///
/// Mutates `step.outcome.action_succeeded` and may raise
/// [`EnsaioError::AssertionFailed`] for non-static steps. Static steps
/// never raise: would-be fatal outcomes become warnings and the step is
/// forced to succeed.
pub async fn validate_after(
    step: &mut Step,
    driver: &dyn PageDriver,
    before: &NavState,
) -> EnsaioResult<()> {
    let normalized = step.target.trim().to_lowercase();
    let result = match step.action {
        ActionKind::GoTo => verify_goto(step, driver, before).await,
        ActionKind::OpenFilters => verify_filters(step, driver).await,
        ActionKind::Click if is_filter_vocabulary(&normalized) => {
            verify_filters(step, driver).await
        }
        ActionKind::Click | ActionKind::Fill | ActionKind::OpenRecord => verify_trusting(step),
        ActionKind::Hover | ActionKind::Other => {
            set_verdict(step, VerificationVerdict::AssumedSucceeded);
            Ok(())
        }
    };

    if let Err(e) = result {
        if step.is_static {
            step.outcome
                .warn(format!("verification downgraded on static step: {e}"));
            set_verdict(step, VerificationVerdict::AssumedSucceeded);
        } else if e.is_fatal() {
            step.outcome.action_succeeded = Some(false);
            return Err(e);
        } else {
            step.outcome
                .warn(format!("verification error, assuming success: {e}"));
            set_verdict(step, VerificationVerdict::AssumedSucceeded);
        }
    }

    if step.is_static {
        step.outcome.action_succeeded = Some(true);
    }
    Ok(())
}

fn set_verdict(step: &mut Step, verdict: VerificationVerdict) {
    step.outcome.action_succeeded = Some(!matches!(verdict, VerificationVerdict::Failed));
    step.outcome.set_detail("verdict", verdict.as_str());
}

/// Navigation: ordered acceptance rules, then the strict identity assertion
async fn verify_goto(
    step: &mut Step,
    driver: &dyn PageDriver,
    before: &NavState,
) -> EnsaioResult<()> {
    let path = MenuPath::parse(&step.target);
    let already_there = step
        .outcome
        .details
        .get("navigation")
        .and_then(serde_json::Value::as_str)
        == Some("already there");

    match accept_navigation(driver, &path, before, already_there).await? {
        Some(method) => {
            step.outcome.set_detail("verification_method", method);
            assert_page_identity(driver, &path, step.number).await?;
            set_verdict(step, VerificationVerdict::Succeeded);
            Ok(())
        }
        None => {
            let address = driver.current_address().await.unwrap_or_default();
            let title = driver.current_title().await.unwrap_or_default();
            Err(EnsaioError::AssertionFailed {
                step: step.number,
                message: format!(
                    "navigation to '{}' could not be confirmed (address: '{address}', title: '{title}')",
                    step.target
                ),
            })
        }
    }
}

/// Filter panel: visible dropdown marker or expanded control. A miss is a
/// UI variation, not a functional bug; it warns and never aborts.
async fn verify_filters(step: &mut Step, driver: &dyn PageDriver) -> EnsaioResult<()> {
    for marker in FILTER_PANEL_MARKERS {
        let probe = Probe::Css((*marker).to_string());
        if driver.query_visible(&probe, &Scope::Document).await?.is_some() {
            step.outcome.set_detail("verification_method", "filter panel visible");
            set_verdict(step, VerificationVerdict::Succeeded);
            return Ok(());
        }
    }

    let probe = Probe::Css(FILTER_EXPANDED_PROBE.to_string());
    if driver.query_visible(&probe, &Scope::Document).await?.is_some() {
        step.outcome
            .set_detail("verification_method", "control expanded");
        set_verdict(step, VerificationVerdict::Succeeded);
        return Ok(());
    }

    step.outcome
        .warn("filter panel did not open after the action");
    set_verdict(step, VerificationVerdict::Failed);
    Ok(())
}

/// Weak verifier for actions without a reliable generic side-effect
/// signature: trust resolution instead of re-probing state
fn verify_trusting(step: &mut Step) -> EnsaioResult<()> {
    if step.outcome.target_found == Some(true) {
        step.outcome
            .set_detail("verification_method", "target was resolved");
        set_verdict(step, VerificationVerdict::Succeeded);
    } else {
        step.outcome
            .warn(format!("{} executed without a resolved target", step.action));
        set_verdict(step, VerificationVerdict::Failed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{FakeElement, FakePage};
    use crate::validate::navigation::APP_PICKER_MARKER;

    fn before_state(address: &str) -> NavState {
        NavState {
            address: address.to_string(),
            title: String::new(),
        }
    }

    #[tokio::test]
    async fn test_goto_accepts_address_change() {
        let page = FakePage::new();
        page.set_address("https://erp.local/web#menu_id=88");
        page.set_title("Compras");

        let mut step = Step::new(1, ActionKind::GoTo, "Compras");
        validate_after(&mut step, &page, &before_state("https://erp.local/web"))
            .await
            .unwrap();

        assert_eq!(step.outcome.action_succeeded, Some(true));
        assert_eq!(
            step.outcome.details.get("verification_method"),
            Some(&serde_json::Value::from("address changed"))
        );
    }

    #[tokio::test]
    async fn test_goto_app_picker_open() {
        let page = FakePage::new();
        page.set_address("https://erp.local/web");
        page.add(FakeElement::new("picker", "div").matching(APP_PICKER_MARKER));

        let mut step = Step::new(2, ActionKind::GoTo, "Dashboard");
        validate_after(&mut step, &page, &before_state("https://erp.local/web"))
            .await
            .unwrap();

        assert_eq!(step.outcome.action_succeeded, Some(true));
        assert_eq!(
            step.outcome.details.get("verification_method"),
            Some(&serde_json::Value::from("app picker open"))
        );
    }

    #[tokio::test]
    async fn test_goto_unconfirmed_raises_with_state() {
        let page = FakePage::new();
        page.set_address("https://erp.local/web");
        page.set_title("Pedidos");

        let mut step = Step::new(3, ActionKind::GoTo, "Compras");
        let err = validate_after(&mut step, &page, &before_state("https://erp.local/web"))
            .await
            .unwrap_err();

        assert_eq!(step.outcome.action_succeeded, Some(false));
        let msg = err.to_string();
        assert!(msg.contains("https://erp.local/web"));
        assert!(msg.contains("Pedidos"));
    }

    #[tokio::test]
    async fn test_goto_unconfirmed_static_downgrades() {
        let page = FakePage::new();
        page.set_address("https://erp.local/web");

        let mut step = Step::new(4, ActionKind::GoTo, "Compras").with_static(true);
        validate_after(&mut step, &page, &before_state("https://erp.local/web"))
            .await
            .unwrap();

        assert_eq!(step.outcome.action_succeeded, Some(true));
        assert!(!step.outcome.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_goto_identity_failure_after_coarse_success() {
        // Coarse check passes via "application active", but the sub-path is
        // nowhere in title, address or breadcrumb.
        let page = FakePage::new();
        page.set_address("https://erp.local/web");
        page.set_title("Vendas");
        page.set_active_application("Vendas");

        let mut step = Step::new(5, ActionKind::GoTo, "Vendas > Pedidos");
        let err = validate_after(&mut step, &page, &before_state("https://erp.local/web"))
            .await
            .unwrap_err();

        assert!(matches!(err, EnsaioError::AssertionFailed { step: 5, .. }));
        assert_eq!(step.outcome.action_succeeded, Some(false));
        assert_eq!(
            step.outcome.details.get("verification_method"),
            Some(&serde_json::Value::from("application active"))
        );
    }

    #[tokio::test]
    async fn test_already_there_verifies_end_to_end() {
        let page = FakePage::new();
        page.set_address("https://erp.local/web");
        page.set_title("Vendas");
        page.set_active_application("Vendas");

        let mut step = Step::new(6, ActionKind::GoTo, "Vendas");
        step.outcome.set_detail("navigation", "already there");
        validate_after(&mut step, &page, &before_state("https://erp.local/web"))
            .await
            .unwrap();

        assert_eq!(step.outcome.action_succeeded, Some(true));
        assert_eq!(
            step.outcome.details.get("verification_method"),
            Some(&serde_json::Value::from("already there"))
        );
    }

    #[tokio::test]
    async fn test_filters_panel_visible() {
        let page = FakePage::new();
        page.add(FakeElement::new("panel", "div").matching(".o_filter_menu .dropdown-menu"));

        let mut step = Step::new(7, ActionKind::OpenFilters, "Filtros");
        step.outcome.target_found = Some(true);
        validate_after(&mut step, &page, &before_state("")).await.unwrap();

        assert_eq!(step.outcome.action_succeeded, Some(true));
    }

    #[tokio::test]
    async fn test_filters_expanded_attribute() {
        let page = FakePage::new();
        page.add(FakeElement::new("ctl", "button").matching(FILTER_EXPANDED_PROBE));

        let mut step = Step::new(8, ActionKind::OpenFilters, "Filters");
        step.outcome.target_found = Some(true);
        validate_after(&mut step, &page, &before_state("")).await.unwrap();

        assert_eq!(step.outcome.action_succeeded, Some(true));
        assert_eq!(
            step.outcome.details.get("verification_method"),
            Some(&serde_json::Value::from("control expanded"))
        );
    }

    #[tokio::test]
    async fn test_filters_miss_warns_without_aborting() {
        let page = FakePage::new();

        let mut step = Step::new(9, ActionKind::OpenFilters, "Filtros");
        step.outcome.target_found = Some(true);
        validate_after(&mut step, &page, &before_state("")).await.unwrap();

        assert_eq!(step.outcome.action_succeeded, Some(false));
        assert!(!step.outcome.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_click_filter_vocabulary_collapses_to_filters_check() {
        let page = FakePage::new();
        page.add(FakeElement::new("panel", "div").matching(".o_filter_menu .dropdown-menu"));

        let mut step = Step::new(10, ActionKind::Click, "menu de filtros");
        step.outcome.target_found = Some(true);
        validate_after(&mut step, &page, &before_state("")).await.unwrap();

        assert_eq!(
            step.outcome.details.get("verification_method"),
            Some(&serde_json::Value::from("filter panel visible"))
        );
    }

    #[tokio::test]
    async fn test_click_trusts_resolution() {
        let page = FakePage::new();

        let mut step = Step::new(11, ActionKind::Click, "Confirmar");
        step.outcome.target_found = Some(true);
        validate_after(&mut step, &page, &before_state("")).await.unwrap();

        assert_eq!(step.outcome.action_succeeded, Some(true));
    }

    #[tokio::test]
    async fn test_static_step_never_fails_verification() {
        let page = FakePage::new();

        let mut step = Step::new(12, ActionKind::Click, "Confirmar").with_static(true);
        step.outcome.target_found = Some(false);
        validate_after(&mut step, &page, &before_state("")).await.unwrap();

        assert_eq!(step.outcome.action_succeeded, Some(true));
    }

    #[tokio::test]
    async fn test_unexpected_probe_error_assumes_success() {
        let page = FakePage::new();
        page.set_address("https://erp.local/web");
        page.fail_evaluations();

        let mut step = Step::new(13, ActionKind::GoTo, "Compras");
        validate_after(&mut step, &page, &before_state("https://erp.local/web"))
            .await
            .unwrap();

        assert_eq!(step.outcome.action_succeeded, Some(true));
        assert!(step
            .outcome
            .warnings
            .iter()
            .any(|w| w.contains("assuming success")));
    }

    #[tokio::test]
    async fn test_hover_is_assumed_successful() {
        let page = FakePage::new();

        let mut step = Step::new(14, ActionKind::Hover, "Tooltip origin");
        step.outcome.target_found = Some(false);
        validate_after(&mut step, &page, &before_state("")).await.unwrap();

        assert_eq!(step.outcome.action_succeeded, Some(true));
        assert_eq!(
            step.outcome.details.get("verdict"),
            Some(&serde_json::Value::from("assumed succeeded"))
        );
    }
}
