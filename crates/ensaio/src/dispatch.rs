//! Action dispatch: one UI action per step, then a settle delay.
//!
//! The dispatcher performs exactly the side effects of the underlying
//! action and waits a fixed short delay for the client's asynchronous
//! rendering to catch up before verification starts. Retries, if any,
//! belong to the caller.

use crate::driver::{FieldKind, PageDriver, Scope};
use crate::probe::Probe;
use crate::resolve::alias_locator;
use crate::result::{EnsaioError, EnsaioResult};
use crate::step::{ActionKind, Step};
use crate::validate::before::PreparedAction;
use crate::validate::navigation::MenuPath;
use std::time::Duration;

/// Delay after each dispatched action, letting debounced rendering settle
pub const SETTLE_DELAY_MS: u64 = 800;

/// Navbar section that holds an application's sub-menus
const MENU_SECTIONS: &str = ".o_menu_sections";

/// Execute the prepared action for a step.
///
/// `settle_delay` is applied only when something was actually dispatched.
pub async fn dispatch(
    step: &Step,
    prepared: &PreparedAction,
    driver: &dyn PageDriver,
    settle_delay: Duration,
) -> EnsaioResult<()> {
    match prepared {
        PreparedAction::Skip => return Ok(()),
        PreparedAction::Interact { handle } => match step.action {
            ActionKind::Hover => driver.hover(handle).await?,
            _ => driver.click(handle).await?,
        },
        PreparedAction::FillField { field, value } => match field.kind {
            FieldKind::Select => driver.select_option(&field.element, value).await?,
            FieldKind::Checkbox => driver.click(&field.element).await?,
            FieldKind::Text => driver.fill(&field.element, value).await?,
        },
        PreparedAction::Navigate { path } => navigate_menu(step, path, driver).await?,
    }

    tokio::time::sleep(settle_delay).await;
    Ok(())
}

/// Walk the application menu: open the apps menu, click the top-level
/// entry, then the sub-entry if one was requested
async fn navigate_menu(step: &Step, path: &MenuPath, driver: &dyn PageDriver) -> EnsaioResult<()> {
    if let Some((_, locator)) = alias_locator("apps menu button") {
        let probe = Probe::Css(locator.to_string());
        if let Some(toggle) = driver.query_visible(&probe, &Scope::Document).await? {
            driver.click(&toggle).await?;
        }
    }

    let top = click_menu_entry(driver, &path.top, &Scope::Document).await?;
    if !top {
        return Err(EnsaioError::TargetNotFound {
            step: step.number,
            action: step.action.name(),
            target: path.top.clone(),
        });
    }

    if let Some(ref sub) = path.sub {
        let scope = match driver
            .query_visible(&Probe::Css(MENU_SECTIONS.to_string()), &Scope::Document)
            .await?
        {
            Some(sections) => Scope::Within(sections),
            None => Scope::Document,
        };
        if !click_menu_entry(driver, sub, &scope).await? {
            return Err(EnsaioError::TargetNotFound {
                step: step.number,
                action: step.action.name(),
                target: sub.clone(),
            });
        }
    }

    Ok(())
}

async fn click_menu_entry(
    driver: &dyn PageDriver,
    name: &str,
    scope: &Scope,
) -> EnsaioResult<bool> {
    let probes = [
        Probe::LinkText(name.to_string()),
        Probe::RoleText {
            role: "menuitem".to_string(),
            text: name.to_string(),
        },
    ];
    for probe in probes {
        if let Some(entry) = driver.query_visible(&probe, scope).await? {
            driver.click(&entry).await?;
            return Ok(true);
        }
    }
    Ok(false)
}
