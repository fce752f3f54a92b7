//! Navigation acceptance heuristics.
//!
//! The web client is a single-page application: the address does not always
//! change on navigation, so GoTo verification walks an ordered list of
//! acceptance rules from strongest to weakest evidence. On success a
//! stricter page-identity assertion runs; failing that one means navigation
//! landed somewhere, just not where the step asked.

use crate::driver::{PageDriver, Scope};
use crate::probe::Probe;
use crate::result::{EnsaioError, EnsaioResult};

/// A parsed GoTo destination: `"Vendas > Pedidos"` names the top-level
/// application and an optional sub-path inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuPath {
    /// Destination as authored
    pub raw: String,
    /// Top-level application name, lower-cased
    pub top: String,
    /// Sub-path inside the application, lower-cased
    pub sub: Option<String>,
}

impl MenuPath {
    /// Parse a destination string on `>` separators
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut segments = raw
            .split('>')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let top = segments.next().unwrap_or_default();
        let sub = segments.next();
        Self {
            raw: raw.trim().to_string(),
            top,
            sub,
        }
    }
}

/// Address and title captured immediately before dispatch
#[derive(Debug, Clone)]
pub struct NavState {
    /// Page address
    pub address: String,
    /// Document title
    pub title: String,
}

impl NavState {
    /// Read the current state from the driver
    pub async fn capture(driver: &dyn PageDriver) -> EnsaioResult<Self> {
        Ok(Self {
            address: driver.current_address().await?,
            title: driver.current_title().await?,
        })
    }
}

/// Well-known destinations whose accepted evidence is an address fragment
pub const KNOWN_LOCATIONS: &[(&str, &str)] = &[("portal", "/my"), ("website", "/shop")];

/// Names the top-level landing screen answers to
pub const LANDING_NAMES: &[&str] = &["home", "dashboard", "início", "menu principal"];

/// Names the storefront answers to
pub const STOREFRONT_NAMES: &[&str] = &["website", "loja"];

/// Marker present while the application picker is open
pub const APP_PICKER_MARKER: &str = ".o_home_menu";

/// Fallback indicators for the landing screen
pub const DASHBOARD_MARKERS: &[&str] = &[".o_dashboard", ".oe_dashboard", ".o_home_menu .o_apps"];

/// Active application name in the navbar
pub const MENU_BRAND: &str = ".o_main_navbar .o_menu_brand";

/// Active-styled entry in the navbar sections
pub const ACTIVE_MENU_ENTRY: &str = ".o_main_navbar a.active";

/// Breadcrumb of the current view
pub const BREADCRUMB: &str = ".o_control_panel .breadcrumb";

/// Weakest acceptance signal: the content area rendered something
pub const CONTENT_AREA_PROBE: &str =
    "((document.querySelector('.o_action_manager') || {}).children || []).length > 0";

async fn marker_visible(driver: &dyn PageDriver, selector: &str) -> EnsaioResult<bool> {
    Ok(driver
        .query_visible(&Probe::Css(selector.to_string()), &Scope::Document)
        .await?
        .is_some())
}

async fn marker_text(driver: &dyn PageDriver, selector: &str) -> EnsaioResult<Option<String>> {
    Ok(driver
        .query_visible(&Probe::Css(selector.to_string()), &Scope::Document)
        .await?
        .map(|h| h.text.trim().to_lowercase()))
}

fn is_landing(top: &str) -> bool {
    LANDING_NAMES.contains(&top)
}

fn is_storefront(top: &str) -> bool {
    STOREFRONT_NAMES.contains(&top)
}

fn known_location(top: &str) -> Option<&'static str> {
    KNOWN_LOCATIONS
        .iter()
        .find(|(name, _)| *name == top)
        .map(|(_, fragment)| *fragment)
}

/// Walk the coarse acceptance rules in order. Returns the method string of
/// the first rule that matched, or `None` when no rule accepted.
pub async fn accept_navigation(
    driver: &dyn PageDriver,
    path: &MenuPath,
    before: &NavState,
    already_there: bool,
) -> EnsaioResult<Option<&'static str>> {
    let address = driver.current_address().await?;

    if address != before.address {
        return Ok(Some("address changed"));
    }

    if let Some(fragment) = known_location(&path.top) {
        if address.contains(fragment) {
            return Ok(Some("known address fragment"));
        }
    }

    if is_landing(&path.top) {
        if marker_visible(driver, APP_PICKER_MARKER).await? {
            return Ok(Some("app picker open"));
        }
        for marker in DASHBOARD_MARKERS {
            if marker_visible(driver, marker).await? {
                return Ok(Some("dashboard indicator"));
            }
        }
    }

    if already_there {
        return Ok(Some("already there"));
    }

    if driver.is_current_application(&path.top).await? {
        return Ok(Some("application active"));
    }

    for selector in [MENU_BRAND, ACTIVE_MENU_ENTRY] {
        if let Some(text) = marker_text(driver, selector).await? {
            if text == path.top {
                return Ok(Some("active menu entry"));
            }
        }
    }

    let populated = driver.evaluate_in_page(CONTENT_AREA_PROBE).await?;
    if populated.as_bool().unwrap_or(false) {
        return Ok(Some("content area populated"));
    }

    Ok(None)
}

/// Strict page-identity assertion, run only after a coarse rule accepted.
///
/// Distinct rules per destination family; a mismatch here is never
/// downgraded for non-static steps, because it means navigation passed the
/// coarse heuristic while landing on the wrong destination.
pub async fn assert_page_identity(
    driver: &dyn PageDriver,
    path: &MenuPath,
    step: u32,
) -> EnsaioResult<()> {
    let address = driver.current_address().await?;
    let title = driver.current_title().await?.to_lowercase();

    if is_landing(&path.top) {
        if marker_visible(driver, APP_PICKER_MARKER).await? {
            return Ok(());
        }
        for marker in DASHBOARD_MARKERS {
            if marker_visible(driver, marker).await? {
                return Ok(());
            }
        }
        return Err(EnsaioError::AssertionFailed {
            step,
            message: format!(
                "expected the landing screen for '{}' but no picker or dashboard marker is present (address: {address})",
                path.raw
            ),
        });
    }

    if path.top == "portal" {
        if address.contains("/my") {
            return Ok(());
        }
        return Err(EnsaioError::AssertionFailed {
            step,
            message: format!("expected the customer portal but address is '{address}'"),
        });
    }

    if is_storefront(&path.top) {
        if address.contains("/shop") {
            return Ok(());
        }
        return Err(EnsaioError::AssertionFailed {
            step,
            message: format!("expected the storefront but address is '{address}'"),
        });
    }

    let brand = marker_text(driver, MENU_BRAND).await?;
    let top_evidence = driver.is_current_application(&path.top).await?
        || brand.as_deref() == Some(path.top.as_str())
        || title.contains(&path.top)
        || address.to_lowercase().contains(&path.top);
    if !top_evidence {
        return Err(EnsaioError::AssertionFailed {
            step,
            message: format!(
                "navigation accepted but '{}' is not the active application (title: '{title}', address: {address})",
                path.top
            ),
        });
    }

    if let Some(ref sub) = path.sub {
        let breadcrumb = marker_text(driver, BREADCRUMB).await?;
        let sub_evidence = title.contains(sub.as_str())
            || address.to_lowercase().contains(sub.as_str())
            || breadcrumb.is_some_and(|b| b.contains(sub.as_str()));
        if !sub_evidence {
            return Err(EnsaioError::AssertionFailed {
                step,
                message: format!(
                    "navigation reached '{}' but sub-path '{sub}' is absent from title, address and breadcrumb",
                    path.top
                ),
            });
        }
    }

    Ok(())
}
