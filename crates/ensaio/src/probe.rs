//! Probes: the locator vocabulary the resolver sends to a page driver.
//!
//! A probe is one concrete way of asking the document for an element. The
//! resolver tries probes in a fixed order; each driver interprets them
//! against its own document representation.

use serde::Serialize;

/// One element query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Probe {
    /// Raw CSS selector, passed through untouched
    Css(String),
    /// `<button>` whose visible text equals the given text
    ///
    /// Text comparison is an exact match after trimming and lower-casing.
    /// "Confirmar" does not match a "Confirm" button.
    ButtonText(String),
    /// `<a>` whose visible text equals the given text
    LinkText(String),
    /// Any element whose `title` attribute contains the given text
    TitleContains(String),
    /// Element with the given ARIA role and equal text
    RoleText {
        /// ARIA role (e.g. "button", "menuitem")
        role: String,
        /// Text to match exactly
        text: String,
    },
}

impl Probe {
    /// Short label used in outcome details and debug logs
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Css(_) => "css",
            Self::ButtonText(_) => "button text",
            Self::LinkText(_) => "link text",
            Self::TitleContains(_) => "title attribute",
            Self::RoleText { .. } => "aria role",
        }
    }

    /// Render as a JavaScript expression yielding the first matching element
    /// (or `null`), querying from the whole document
    #[must_use]
    pub fn as_js(&self) -> String {
        self.as_js_in("document")
    }

    /// Render as a JavaScript expression querying from `root`, any
    /// expression that evaluates to a document or element. Used by drivers
    /// that query through page evaluation and re-scope probes to a modal
    /// surface.
    #[must_use]
    pub fn as_js_in(&self, root: &str) -> String {
        let norm = "((e) => (e.textContent || '').trim().toLowerCase())";
        match self {
            Self::Css(selector) => {
                format!("{root}.querySelector({})", js_string(selector))
            }
            Self::ButtonText(text) => format!(
                "[...{root}.querySelectorAll('button')].find((e) => {norm}(e) === {}) || null",
                js_string(&text.trim().to_lowercase())
            ),
            Self::LinkText(text) => format!(
                "[...{root}.querySelectorAll('a')].find((e) => {norm}(e) === {}) || null",
                js_string(&text.trim().to_lowercase())
            ),
            Self::TitleContains(text) => format!(
                "{root}.querySelector(`[title*={} i]`)",
                js_string(text.trim())
            ),
            Self::RoleText { role, text } => format!(
                "[...{root}.querySelectorAll(`[role={}]`)].find((e) => {norm}(e) === {}) || null",
                js_string(role),
                js_string(&text.trim().to_lowercase())
            ),
        }
    }
}

impl std::fmt::Display for Probe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css:{s}"),
            Self::ButtonText(t) => write!(f, "button:{t}"),
            Self::LinkText(t) => write!(f, "link:{t}"),
            Self::TitleContains(t) => write!(f, "title~:{t}"),
            Self::RoleText { role, text } => write!(f, "role[{role}]:{text}"),
        }
    }
}

fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_probe_js() {
        let probe = Probe::Css(".o_form_button_back".to_string());
        assert_eq!(
            probe.as_js(),
            "document.querySelector(\".o_form_button_back\")"
        );
    }

    #[test]
    fn test_button_text_probe_normalizes() {
        let probe = Probe::ButtonText("  Confirmar ".to_string());
        let js = probe.as_js();
        assert!(js.contains("\"confirmar\""));
        assert!(js.contains("querySelectorAll('button')"));
    }

    #[test]
    fn test_js_string_escapes_quotes() {
        let probe = Probe::Css("button[title=\"Salvar\"]".to_string());
        assert!(probe.as_js().contains("\\\"Salvar\\\""));
    }

    #[test]
    fn test_scoped_rendering() {
        let probe = Probe::LinkText("Pedidos".to_string());
        let js = probe.as_js_in("__scope");
        assert!(js.contains("__scope.querySelectorAll('a')"));
    }

    #[test]
    fn test_labels() {
        assert_eq!(Probe::Css(String::new()).label(), "css");
        assert_eq!(
            Probe::RoleText {
                role: "button".to_string(),
                text: "Salvar".to_string()
            }
            .label(),
            "aria role"
        );
    }
}
