//! Target resolution: turning a human-authored target description into a
//! concrete, queryable element handle.
//!
//! Strategies are tried in fixed precedence order and the first one that
//! yields a visible element wins:
//!
//! 1. alias table lookup (canonical locator, no ambiguity)
//! 2. raw CSS selector, queried directly
//! 3. free-text probe templates: button text, link text, title attribute,
//!    ARIA role
//!
//! The filter vocabulary bypasses the text templates entirely and walks a
//! dedicated selector list, ending in a scan of the search-region buttons
//! by class/title substring, because the web client's filter control has no stable
//! accessible name.
//!
//! A `modal` execution context re-scopes every probe to the currently
//! visible dialog surface; when no dialog is visible resolution fails
//! immediately, regardless of document-wide matches.

use crate::driver::{ElementHandle, PageDriver, Scope};
use crate::probe::Probe;
use crate::result::EnsaioResult;
use crate::step::ExecContext;
use crate::target::{TargetClass, TargetDescription};

/// Which rule produced the winning candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Alias table entry, by alias phrase
    Alias(&'static str),
    /// Raw CSS selector from the script
    CssSelector,
    /// One of the free-text probe templates
    Template(&'static str),
    /// Dedicated filter-control selector list, by tier index
    FilterSelector(usize),
    /// Search-region button scan fallback
    FilterScan,
}

impl Strategy {
    /// Human-readable label recorded in step details
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Alias(phrase) => format!("alias: {phrase}"),
            Self::CssSelector => "css selector".to_string(),
            Self::Template(name) => format!("template: {name}"),
            Self::FilterSelector(tier) => format!("filter selector tier {tier}"),
            Self::FilterScan => "filter button scan".to_string(),
        }
    }
}

/// Ordered candidates plus the winning strategy
#[derive(Debug, Clone)]
pub struct ResolutionResult {
    /// Candidates in strategy precedence order
    pub candidates: Vec<ElementHandle>,
    /// Strategy that produced the first candidate, if any
    pub strategy: Option<Strategy>,
}

impl ResolutionResult {
    /// Empty result
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            candidates: Vec::new(),
            strategy: None,
        }
    }

    fn single(handle: ElementHandle, strategy: Strategy) -> Self {
        Self {
            candidates: vec![handle],
            strategy: Some(strategy),
        }
    }

    /// First visible candidate in precedence order.
    ///
    /// A result whose candidates are all invisible is indistinguishable
    /// from an empty one at the validation boundary.
    #[must_use]
    pub fn selected(&self) -> Option<&ElementHandle> {
        self.candidates.iter().find(|c| c.visible)
    }
}

/// Alias table: common natural-language descriptions mapped to canonical
/// locators. Ordered; first phrase match wins.
pub const ALIASES: &[(&str, &str)] = &[
    ("apps menu button", ".o_navbar_apps_menu button"),
    ("botão de aplicativos", ".o_navbar_apps_menu button"),
    ("home menu", ".o_menu_toggle"),
    ("back button", ".o_form_button_back"),
    ("botão voltar", ".o_form_button_back"),
    ("save button", ".o_form_button_save"),
    ("botão salvar", ".o_form_button_save"),
    ("discard button", ".o_form_button_cancel"),
    ("create button", ".o_list_button_add"),
    ("search input", ".o_searchview_input"),
];

/// Legacy filter vocabulary. The enumerated variants are exact; nothing is
/// inferred beyond this list.
pub const FILTER_VOCABULARY: &[&str] = &["filtros", "filters", "menu de filtros"];

/// Dedicated selector tiers for the filter control
pub const FILTER_SELECTORS: &[&str] = &[
    ".o_filter_menu > button",
    ".o_filter_menu .dropdown-toggle",
    ".o_search_options button.o_filter_menu_button",
];

/// Search-region scan: class/title heuristics over all buttons in the
/// control panel
pub const FILTER_SCAN_SELECTORS: &[&str] = &[
    ".o_control_panel button[class*=\"filter\"]",
    ".o_control_panel button[title*=\"filter\" i]",
    ".o_control_panel button[title*=\"filtro\" i]",
];

/// Selectors that locate the currently visible modal/dialog surface
pub const MODAL_SURFACES: &[&str] = &[".o_dialog .modal-content", ".modal.show", "[role=dialog]"];

/// Free-text probe templates, in precedence order
fn text_templates(text: &str) -> [(&'static str, Probe); 4] {
    [
        ("button text", Probe::ButtonText(text.to_string())),
        ("link text", Probe::LinkText(text.to_string())),
        ("title attribute", Probe::TitleContains(text.to_string())),
        (
            "aria role",
            Probe::RoleText {
                role: "button".to_string(),
                text: text.to_string(),
            },
        ),
    ]
}

/// Look up an alias phrase, returning its canonical locator
#[must_use]
pub fn alias_locator(text: &str) -> Option<(&'static str, &'static str)> {
    ALIASES
        .iter()
        .find(|(phrase, _)| *phrase == text)
        .map(|(phrase, locator)| (*phrase, *locator))
}

/// Whether the text is one of the legacy filter-control names
#[must_use]
pub fn is_filter_vocabulary(text: &str) -> bool {
    FILTER_VOCABULARY.contains(&text)
}

/// Multi-strategy resolver over a page driver
pub struct TargetResolver<'d> {
    driver: &'d dyn PageDriver,
}

impl std::fmt::Debug for TargetResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetResolver").finish_non_exhaustive()
    }
}

impl<'d> TargetResolver<'d> {
    /// Wrap a driver
    #[must_use]
    pub fn new(driver: &'d dyn PageDriver) -> Self {
        Self { driver }
    }

    /// Derive and classify the description for a raw target
    #[must_use]
    pub fn describe(&self, raw: &str, context: ExecContext) -> TargetDescription {
        let mut desc = TargetDescription::derive(raw, context);
        if alias_locator(&desc.text).is_some() {
            desc.mark_alias();
        }
        desc
    }

    /// Resolve a description to candidates.
    ///
    /// Probes run strictly in sequence; the first visible match
    /// short-circuits the rest.
    pub async fn resolve(&self, desc: &TargetDescription) -> EnsaioResult<ResolutionResult> {
        let scope = match self.scope_for(desc.context).await? {
            Some(scope) => scope,
            None => {
                tracing::debug!(step_target = %desc.raw, "no visible modal, resolution fails");
                return Ok(ResolutionResult::empty());
            }
        };

        if let Some((phrase, locator)) = alias_locator(&desc.text) {
            let probe = Probe::Css(locator.to_string());
            if let Some(handle) = self.try_probe(&probe, &scope).await? {
                return Ok(ResolutionResult::single(handle, Strategy::Alias(phrase)));
            }
            return Ok(ResolutionResult::empty());
        }

        if is_filter_vocabulary(&desc.text) {
            return self.resolve_filter_control(&scope).await;
        }

        if desc.class == TargetClass::RawSelector {
            let probe = Probe::Css(desc.raw.clone());
            if let Some(handle) = self.try_probe(&probe, &scope).await? {
                return Ok(ResolutionResult::single(handle, Strategy::CssSelector));
            }
            return Ok(ResolutionResult::empty());
        }

        for (name, probe) in text_templates(&desc.text) {
            if let Some(handle) = self.try_probe(&probe, &scope).await? {
                return Ok(ResolutionResult::single(handle, Strategy::Template(name)));
            }
        }
        Ok(ResolutionResult::empty())
    }

    /// Filter control: dedicated selector tiers, then the button scan
    async fn resolve_filter_control(&self, scope: &Scope) -> EnsaioResult<ResolutionResult> {
        for (tier, selector) in FILTER_SELECTORS.iter().enumerate() {
            let probe = Probe::Css((*selector).to_string());
            if let Some(handle) = self.try_probe(&probe, scope).await? {
                return Ok(ResolutionResult::single(
                    handle,
                    Strategy::FilterSelector(tier),
                ));
            }
        }
        for selector in FILTER_SCAN_SELECTORS {
            let probe = Probe::Css((*selector).to_string());
            if let Some(handle) = self.try_probe(&probe, scope).await? {
                return Ok(ResolutionResult::single(handle, Strategy::FilterScan));
            }
        }
        Ok(ResolutionResult::empty())
    }

    /// Locate the scope for the requested context. `None` means a modal was
    /// requested but none is visible.
    async fn scope_for(&self, context: ExecContext) -> EnsaioResult<Option<Scope>> {
        match context {
            ExecContext::Default => Ok(Some(Scope::Document)),
            ExecContext::Modal => {
                for selector in MODAL_SURFACES {
                    let probe = Probe::Css((*selector).to_string());
                    if let Some(surface) =
                        self.driver.query_visible(&probe, &Scope::Document).await?
                    {
                        return Ok(Some(Scope::Within(surface)));
                    }
                }
                Ok(None)
            }
        }
    }

    async fn try_probe(&self, probe: &Probe, scope: &Scope) -> EnsaioResult<Option<ElementHandle>> {
        let found = self.driver.query_visible(probe, scope).await?;
        tracing::debug!(
            probe = %probe,
            scope = scope.label(),
            hit = found.is_some(),
            "probe"
        );
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{FakeElement, FakePage};

    fn resolver(page: &FakePage) -> TargetResolver<'_> {
        TargetResolver::new(page)
    }

    #[tokio::test]
    async fn test_alias_short_circuits_text_probing() {
        let page = FakePage::new();
        // A button whose text would also match the alias phrase as free text
        page.add(FakeElement::button("decoy", "Apps menu button"));
        page.add(
            FakeElement::new("apps", "button").matching(".o_navbar_apps_menu button"),
        );

        let r = resolver(&page);
        let desc = r.describe("Apps Menu Button", ExecContext::Default);
        let result = r.resolve(&desc).await.unwrap();

        assert_eq!(
            result.strategy,
            Some(Strategy::Alias("apps menu button"))
        );
        assert_eq!(result.selected().unwrap().id, "apps");
    }

    #[tokio::test]
    async fn test_alias_miss_does_not_fall_through() {
        // Alias classification is authoritative; a dangling alias resolves
        // to nothing even when free text would match something.
        let page = FakePage::new();
        page.add(FakeElement::button("decoy", "save button"));

        let r = resolver(&page);
        let desc = r.describe("save button", ExecContext::Default);
        let result = r.resolve(&desc).await.unwrap();

        assert!(result.selected().is_none());
    }

    #[tokio::test]
    async fn test_raw_selector_strategy() {
        let page = FakePage::new();
        page.add(FakeElement::new("back", "button").matching(".o_form_button_back"));

        let r = resolver(&page);
        let desc = r.describe(".o_form_button_back", ExecContext::Default);
        let result = r.resolve(&desc).await.unwrap();

        assert_eq!(result.strategy, Some(Strategy::CssSelector));
        assert_eq!(result.selected().unwrap().id, "back");
    }

    #[tokio::test]
    async fn test_free_text_strict_no_cross_language_match() {
        let page = FakePage::new();
        page.add(FakeElement::button("confirm", "Confirm"));

        let r = resolver(&page);
        let desc = r.describe("Confirmar", ExecContext::Default);
        let result = r.resolve(&desc).await.unwrap();

        assert!(result.selected().is_none());
        assert!(result.strategy.is_none());
    }

    #[tokio::test]
    async fn test_template_order_button_beats_link() {
        let page = FakePage::new();
        page.add(FakeElement::link("as-link", "Pedidos"));
        page.add(FakeElement::button("as-button", "Pedidos"));

        let r = resolver(&page);
        let desc = r.describe("Pedidos", ExecContext::Default);
        let result = r.resolve(&desc).await.unwrap();

        assert_eq!(result.strategy, Some(Strategy::Template("button text")));
        assert_eq!(result.selected().unwrap().id, "as-button");
    }

    #[tokio::test]
    async fn test_title_attribute_template() {
        let page = FakePage::new();
        page.add(
            FakeElement::new("export", "button").with_attribute("title", "Exportar tudo"),
        );

        let r = resolver(&page);
        let desc = r.describe("exportar", ExecContext::Default);
        let result = r.resolve(&desc).await.unwrap();

        assert_eq!(result.strategy, Some(Strategy::Template("title attribute")));
    }

    #[tokio::test]
    async fn test_invisible_match_is_not_found() {
        let page = FakePage::new();
        page.add(FakeElement::button("ghost", "Confirmar").hidden());

        let r = resolver(&page);
        let desc = r.describe("Confirmar", ExecContext::Default);
        let result = r.resolve(&desc).await.unwrap();

        assert!(result.selected().is_none());
    }

    #[tokio::test]
    async fn test_modal_context_requires_visible_modal() {
        let page = FakePage::new();
        page.add(FakeElement::button("doc-confirm", "Confirmar"));

        let r = resolver(&page);
        let desc = r.describe("Confirmar", ExecContext::Modal);
        let result = r.resolve(&desc).await.unwrap();

        // Document-wide match exists, but no modal is visible
        assert!(result.selected().is_none());
    }

    #[tokio::test]
    async fn test_modal_context_scopes_to_dialog() {
        let page = FakePage::new();
        page.add(FakeElement::new("dlg", "div").matching(".o_dialog .modal-content"));
        page.add(FakeElement::button("doc-confirm", "Confirmar"));
        page.add(FakeElement::button("dlg-confirm", "Confirmar").inside("dlg"));

        let r = resolver(&page);
        let desc = r.describe("Confirmar", ExecContext::Modal);
        let result = r.resolve(&desc).await.unwrap();

        assert_eq!(result.selected().unwrap().id, "dlg-confirm");
    }

    #[tokio::test]
    async fn test_filter_vocabulary_uses_dedicated_tiers() {
        let page = FakePage::new();
        // A "Filtros" button exists, but the vocabulary path must ignore it
        // and use the dedicated selector list instead.
        page.add(FakeElement::button("text-decoy", "Filtros"));
        page.add(FakeElement::new("ctl", "button").matching(".o_filter_menu .dropdown-toggle"));

        let r = resolver(&page);
        let desc = r.describe("Filtros", ExecContext::Default);
        let result = r.resolve(&desc).await.unwrap();

        assert_eq!(result.strategy, Some(Strategy::FilterSelector(1)));
        assert_eq!(result.selected().unwrap().id, "ctl");
    }

    #[tokio::test]
    async fn test_filter_scan_fallback() {
        let page = FakePage::new();
        page.add(
            FakeElement::new("scan-hit", "button")
                .matching(".o_control_panel button[title*=\"filtro\" i]"),
        );

        let r = resolver(&page);
        let desc = r.describe("menu de filtros", ExecContext::Default);
        let result = r.resolve(&desc).await.unwrap();

        assert_eq!(result.strategy, Some(Strategy::FilterScan));
    }

    #[tokio::test]
    async fn test_filter_vocabulary_exhausted() {
        let page = FakePage::new();

        let r = resolver(&page);
        let desc = r.describe("filters", ExecContext::Default);
        let result = r.resolve(&desc).await.unwrap();

        assert!(result.selected().is_none());
    }
}
