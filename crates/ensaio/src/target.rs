//! Target descriptions: the normalized view of a step's raw target.
//!
//! Derived per step, never persisted. Classification decides which
//! resolution strategies apply: a raw selector is queried directly, a known
//! alias maps to a canonical locator, free text goes through the probe
//! templates.

use crate::step::ExecContext;
use regex::Regex;

/// How the raw target text was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetClass {
    /// Structural CSS selector authored directly in the script
    RawSelector,
    /// Matches an entry in the resolver's alias table
    KnownAlias,
    /// Natural-language text probed through the selector templates
    FreeText,
}

/// Normalized view of a step's raw target
#[derive(Debug, Clone)]
pub struct TargetDescription {
    /// Trimmed original text, preserved for CSS queries (selectors are
    /// case-sensitive where lower-casing would corrupt them)
    pub raw: String,
    /// Lower-cased trimmed text used for classification and text probes
    pub text: String,
    /// Classification outcome
    pub class: TargetClass,
    /// Execution context the step requested
    pub context: ExecContext,
}

impl TargetDescription {
    /// Derive a description from a step's raw target.
    ///
    /// Alias classification is upgraded later by the resolver, which owns
    /// the alias table; this constructor only separates selectors from
    /// free text.
    #[must_use]
    pub fn derive(raw: &str, context: ExecContext) -> Self {
        let raw = raw.trim().to_string();
        let text = raw.to_lowercase();
        let class = if is_raw_selector(&text) {
            TargetClass::RawSelector
        } else {
            TargetClass::FreeText
        };
        Self {
            raw,
            text,
            class,
            context,
        }
    }

    /// Upgrade a free-text description to a known alias
    pub fn mark_alias(&mut self) {
        if self.class == TargetClass::FreeText {
            self.class = TargetClass::KnownAlias;
        }
    }

    /// Whether the description should be queried as a CSS selector
    #[must_use]
    pub fn is_raw_selector(&self) -> bool {
        self.class == TargetClass::RawSelector
    }
}

/// Heuristic: does the text look like a CSS selector rather than prose?
///
/// Positive signals: a leading structural marker (`.`, `#`, `[`), a
/// child combinator, or a `tag.class` / `tag#id` / `tag[attr]` prefix.
#[must_use]
pub fn is_raw_selector(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    if text.starts_with('.') || text.starts_with('#') || text.starts_with('[') {
        return true;
    }
    if text.contains('>') {
        // A combinator is only structural when the segments are selectors
        // themselves; "vendas > pedidos" is a menu path, not CSS.
        return text
            .split('>')
            .all(|segment| is_raw_selector(segment.trim()) || is_bare_tag(segment.trim()));
    }
    structural_prefix().is_match(text)
}

fn is_bare_tag(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && structural_tags().contains(&segment)
}

fn structural_tags() -> &'static [&'static str] {
    &[
        "div", "span", "button", "a", "input", "select", "textarea", "table", "thead", "tbody",
        "tr", "td", "th", "ul", "ol", "li", "nav", "header", "footer", "form", "label",
    ]
}

fn structural_prefix() -> Regex {
    // tag immediately followed by a class, id, or attribute qualifier
    Regex::new(r"^[a-z][a-z0-9-]*[.#\[][\w-]").unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_leading_markers_are_selectors() {
        assert!(is_raw_selector(".o_form_button_back"));
        assert!(is_raw_selector("#login"));
        assert!(is_raw_selector("[data-menu-xmlid]"));
    }

    #[test]
    fn test_tag_qualified_prefixes_are_selectors() {
        assert!(is_raw_selector("button.btn-primary"));
        assert!(is_raw_selector("div#content"));
        assert!(is_raw_selector("input[name=login]"));
    }

    #[test]
    fn test_structural_combinators_are_selectors() {
        assert!(is_raw_selector(".o_list_view > tbody"));
        assert!(is_raw_selector("div > span.badge"));
        assert!(is_raw_selector("ul > li"));
    }

    #[test]
    fn test_menu_paths_are_not_selectors() {
        assert!(!is_raw_selector("vendas > pedidos"));
        assert!(!is_raw_selector("configurações > usuários"));
    }

    #[test]
    fn test_prose_is_free_text() {
        assert!(!is_raw_selector("confirmar"));
        assert!(!is_raw_selector("apps menu button"));
        assert!(!is_raw_selector("menu de filtros"));
        assert!(!is_raw_selector(""));
    }

    #[test]
    fn test_derive_normalizes_and_keeps_raw() {
        let desc = TargetDescription::derive("  Confirmar  ", ExecContext::Default);
        assert_eq!(desc.raw, "Confirmar");
        assert_eq!(desc.text, "confirmar");
        assert_eq!(desc.class, TargetClass::FreeText);
    }

    #[test]
    fn test_derive_selector_keeps_case() {
        let desc = TargetDescription::derive("[data-field=parceiroId]", ExecContext::Default);
        assert_eq!(desc.class, TargetClass::RawSelector);
        assert_eq!(desc.raw, "[data-field=parceiroId]");
    }

    #[test]
    fn test_mark_alias_only_upgrades_free_text() {
        let mut desc = TargetDescription::derive("apps menu button", ExecContext::Default);
        desc.mark_alias();
        assert_eq!(desc.class, TargetClass::KnownAlias);

        let mut selector = TargetDescription::derive(".o_app", ExecContext::Default);
        selector.mark_alias();
        assert_eq!(selector.class, TargetClass::RawSelector);
    }

    proptest! {
        #[test]
        fn prop_classification_never_panics(raw in ".*") {
            let _ = TargetDescription::derive(&raw, ExecContext::Default);
        }

        #[test]
        fn prop_derive_is_idempotent(raw in ".*") {
            let once = TargetDescription::derive(&raw, ExecContext::Default);
            let twice = TargetDescription::derive(&once.raw, ExecContext::Default);
            prop_assert_eq!(once.text, twice.text);
            prop_assert_eq!(once.class, twice.class);
        }
    }
}
