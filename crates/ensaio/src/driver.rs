//! PageDriver: the boundary between the engine and a live browser page.
//!
//! The engine consumes a small set of primitives (visible-element query,
//! click/fill/hover, address and title reads, in-page evaluation, field
//! lookup by label, markup serialization). Everything above this trait is
//! backend-independent; the CDP implementation lives in [`crate::cdp`]
//! behind the `browser` feature, and [`FakePage`] is the deterministic
//! in-memory implementation used by the test suite.

use crate::probe::Probe;
use crate::result::{EnsaioError, EnsaioResult};
use crate::step::ExecContext;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

/// Handle to a matched element, with the metadata the engine needs for
/// tie-breaking and verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementHandle {
    /// Driver-scoped identifier
    pub id: String,
    /// Tag name, lower-case
    pub tag: String,
    /// Visible text content, trimmed
    pub text: String,
    /// Whether the element is currently visible
    pub visible: bool,
    /// Attribute snapshot taken at query time
    pub attributes: BTreeMap<String, String>,
}

impl ElementHandle {
    /// Create a handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
            text: String::new(),
            visible: true,
            attributes: BTreeMap::new(),
        }
    }

    /// Attribute value, if captured
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// What kind of widget a labeled field resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Plain text or number input
    Text,
    /// Dropdown with fixed options
    Select,
    /// Checkbox or toggle
    Checkbox,
}

/// A logical form field resolved through its label association
#[derive(Debug, Clone, Serialize)]
pub struct FieldHandle {
    /// The input element itself
    pub element: ElementHandle,
    /// Technical field name the label maps to
    pub field_name: String,
    /// Widget kind, drives how fill is dispatched
    pub kind: FieldKind,
}

/// Scope for a probe: the whole document or one container element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Query the whole document
    Document,
    /// Query only descendants of the given container
    Within(ElementHandle),
}

impl Scope {
    /// Label used in debug logs
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Within(_) => "modal",
        }
    }
}

/// Async page primitives consumed by the engine.
///
/// All calls are awaited immediately and sequentially; implementations
/// carry their own bounded waits and surface a hung primitive as an error,
/// never as a silent soft timeout.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// First visible element matching the probe inside the scope, in
    /// document order
    async fn query_visible(
        &self,
        probe: &Probe,
        scope: &Scope,
    ) -> EnsaioResult<Option<ElementHandle>>;

    /// Click an element
    async fn click(&self, handle: &ElementHandle) -> EnsaioResult<()>;

    /// Replace an input's value
    async fn fill(&self, handle: &ElementHandle, value: &str) -> EnsaioResult<()>;

    /// Hover over an element
    async fn hover(&self, handle: &ElementHandle) -> EnsaioResult<()>;

    /// Pick an option from a select widget
    async fn select_option(&self, handle: &ElementHandle, value: &str) -> EnsaioResult<()>;

    /// Current page address
    async fn current_address(&self) -> EnsaioResult<String>;

    /// Current document title
    async fn current_title(&self) -> EnsaioResult<String>;

    /// Evaluate a probe expression in the page and return its JSON value
    async fn evaluate_in_page(&self, expression: &str) -> EnsaioResult<serde_json::Value>;

    /// Resolve a logical field through its label association
    async fn find_field_by_label(
        &self,
        label: &str,
        context: ExecContext,
    ) -> EnsaioResult<Option<FieldHandle>>;

    /// Whether the named top-level application is the active one
    async fn is_current_application(&self, name: &str) -> EnsaioResult<bool>;

    /// Serialize the current document markup
    async fn serialize_markup(&self) -> EnsaioResult<String>;
}

// ============================================================================
// FakePage: deterministic in-memory driver for tests
// ============================================================================

/// One element registered on a [`FakePage`]
#[derive(Debug, Clone)]
pub struct FakeElement {
    handle: ElementHandle,
    /// CSS selectors this element answers to
    selectors: Vec<String>,
    /// Container element id, if nested (modal surface, search region, ...)
    container: Option<String>,
}

impl FakeElement {
    /// Element with a tag and id
    #[must_use]
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            handle: ElementHandle::new(id, tag),
            selectors: Vec::new(),
            container: None,
        }
    }

    /// Shorthand for a visible button with text
    #[must_use]
    pub fn button(id: impl Into<String>, text: impl Into<String>) -> Self {
        let mut el = Self::new(id, "button");
        el.handle.text = text.into();
        el
    }

    /// Shorthand for a visible link with text
    #[must_use]
    pub fn link(id: impl Into<String>, text: impl Into<String>) -> Self {
        let mut el = Self::new(id, "a");
        el.handle.text = text.into();
        el
    }

    /// Register a CSS selector this element matches
    #[must_use]
    pub fn matching(mut self, selector: impl Into<String>) -> Self {
        self.selectors.push(selector.into());
        self
    }

    /// Set the visible text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.handle.text = text.into();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.handle.attributes.insert(name.into(), value.into());
        self
    }

    /// Mark the element as hidden
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.handle.visible = false;
        self
    }

    /// Nest the element inside a container element
    #[must_use]
    pub fn inside(mut self, container_id: impl Into<String>) -> Self {
        self.container = Some(container_id.into());
        self
    }

    fn matches(&self, probe: &Probe) -> bool {
        let h = &self.handle;
        let text_eq = |t: &str| h.text.trim().to_lowercase() == t.trim().to_lowercase();
        match probe {
            Probe::Css(selector) => self.selectors.iter().any(|s| s == selector),
            Probe::ButtonText(t) => h.tag == "button" && text_eq(t),
            Probe::LinkText(t) => h.tag == "a" && text_eq(t),
            Probe::TitleContains(t) => h
                .attribute("title")
                .is_some_and(|title| title.to_lowercase().contains(&t.trim().to_lowercase())),
            Probe::RoleText { role, text } => {
                h.attribute("role") == Some(role.as_str()) && text_eq(text)
            }
        }
    }
}

#[derive(Debug, Default)]
struct FakeState {
    elements: Vec<FakeElement>,
    address: String,
    title: String,
    active_application: Option<String>,
    fields: Vec<(String, FieldHandle)>,
    eval_true: Vec<String>,
    markup: String,
    fail_evaluate: bool,
    /// Log of driver calls, for asserting dispatch side effects
    actions: Vec<String>,
}

/// Deterministic in-memory [`PageDriver`].
///
/// Elements are registered with the selectors and metadata they answer to;
/// probes match against that registry in insertion (document) order.
#[derive(Debug, Default)]
pub struct FakePage {
    state: std::sync::Mutex<FakeState>,
}

impl FakePage {
    /// Empty page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element
    pub fn add(&self, element: FakeElement) -> &Self {
        self.state.lock().unwrap().elements.push(element);
        self
    }

    /// Set the current address
    pub fn set_address(&self, address: impl Into<String>) -> &Self {
        self.state.lock().unwrap().address = address.into();
        self
    }

    /// Set the document title
    pub fn set_title(&self, title: impl Into<String>) -> &Self {
        self.state.lock().unwrap().title = title.into();
        self
    }

    /// Set the active top-level application
    pub fn set_active_application(&self, name: impl Into<String>) -> &Self {
        self.state.lock().unwrap().active_application = Some(name.into());
        self
    }

    /// Register a labeled field
    pub fn add_field(&self, label: impl Into<String>, field: FieldHandle) -> &Self {
        self.state
            .lock()
            .unwrap()
            .fields
            .push((label.into(), field));
        self
    }

    /// Make an in-page expression evaluate to true
    pub fn set_eval_true(&self, expression: impl Into<String>) -> &Self {
        self.state.lock().unwrap().eval_true.push(expression.into());
        self
    }

    /// Make every evaluate call fail, for exercising the verification
    /// error-downgrade path
    pub fn fail_evaluations(&self) -> &Self {
        self.state.lock().unwrap().fail_evaluate = true;
        self
    }

    /// Set the markup returned by [`PageDriver::serialize_markup`]
    pub fn set_markup(&self, markup: impl Into<String>) -> &Self {
        self.state.lock().unwrap().markup = markup.into();
        self
    }

    /// Driver calls performed so far ("click:id", "fill:id=value", ...)
    #[must_use]
    pub fn actions(&self) -> Vec<String> {
        self.state.lock().unwrap().actions.clone()
    }

    fn log(&self, action: String) {
        self.state.lock().unwrap().actions.push(action);
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn query_visible(
        &self,
        probe: &Probe,
        scope: &Scope,
    ) -> EnsaioResult<Option<ElementHandle>> {
        let state = self.state.lock().unwrap();
        let container = match scope {
            Scope::Document => None,
            Scope::Within(handle) => Some(handle.id.as_str()),
        };
        Ok(state
            .elements
            .iter()
            .filter(|el| match container {
                None => true,
                Some(id) => el.container.as_deref() == Some(id),
            })
            .find(|el| el.handle.visible && el.matches(probe))
            .map(|el| el.handle.clone()))
    }

    async fn click(&self, handle: &ElementHandle) -> EnsaioResult<()> {
        self.log(format!("click:{}", handle.id));
        Ok(())
    }

    async fn fill(&self, handle: &ElementHandle, value: &str) -> EnsaioResult<()> {
        self.log(format!("fill:{}={value}", handle.id));
        Ok(())
    }

    async fn hover(&self, handle: &ElementHandle) -> EnsaioResult<()> {
        self.log(format!("hover:{}", handle.id));
        Ok(())
    }

    async fn select_option(&self, handle: &ElementHandle, value: &str) -> EnsaioResult<()> {
        self.log(format!("select:{}={value}", handle.id));
        Ok(())
    }

    async fn current_address(&self) -> EnsaioResult<String> {
        Ok(self.state.lock().unwrap().address.clone())
    }

    async fn current_title(&self) -> EnsaioResult<String> {
        Ok(self.state.lock().unwrap().title.clone())
    }

    async fn evaluate_in_page(&self, expression: &str) -> EnsaioResult<serde_json::Value> {
        let state = self.state.lock().unwrap();
        if state.fail_evaluate {
            return Err(EnsaioError::driver("evaluation failed: node detached"));
        }
        Ok(serde_json::Value::Bool(
            state.eval_true.iter().any(|e| e == expression),
        ))
    }

    async fn find_field_by_label(
        &self,
        label: &str,
        _context: ExecContext,
    ) -> EnsaioResult<Option<FieldHandle>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .fields
            .iter()
            .find(|(l, _)| l.trim().to_lowercase() == label.trim().to_lowercase())
            .map(|(_, field)| field.clone()))
    }

    async fn is_current_application(&self, name: &str) -> EnsaioResult<bool> {
        let state = self.state.lock().unwrap();
        Ok(state
            .active_application
            .as_deref()
            .is_some_and(|app| app.to_lowercase() == name.trim().to_lowercase()))
    }

    async fn serialize_markup(&self) -> EnsaioResult<String> {
        Ok(self.state.lock().unwrap().markup.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_query_matches_registered_selector() {
        let page = FakePage::new();
        page.add(FakeElement::new("back", "button").matching(".o_form_button_back"));

        let found = page
            .query_visible(
                &Probe::Css(".o_form_button_back".to_string()),
                &Scope::Document,
            )
            .await
            .unwrap();
        assert_eq!(found.unwrap().id, "back");
    }

    #[tokio::test]
    async fn test_hidden_elements_are_never_returned() {
        let page = FakePage::new();
        page.add(FakeElement::button("save", "Salvar").hidden());

        let found = page
            .query_visible(&Probe::ButtonText("Salvar".to_string()), &Scope::Document)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_button_text_is_strict() {
        let page = FakePage::new();
        page.add(FakeElement::button("confirm", "Confirm"));

        let found = page
            .query_visible(
                &Probe::ButtonText("Confirmar".to_string()),
                &Scope::Document,
            )
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_document_order_wins_on_ties() {
        let page = FakePage::new();
        page.add(FakeElement::button("first", "Ok"));
        page.add(FakeElement::button("second", "Ok"));

        let found = page
            .query_visible(&Probe::ButtonText("Ok".to_string()), &Scope::Document)
            .await
            .unwrap();
        assert_eq!(found.unwrap().id, "first");
    }

    #[tokio::test]
    async fn test_scoped_query_only_sees_container_children() {
        let page = FakePage::new();
        let modal = ElementHandle::new("dlg", "div");
        page.add(FakeElement::button("outside", "Confirmar"));
        page.add(FakeElement::button("inside", "Confirmar").inside("dlg"));

        let found = page
            .query_visible(
                &Probe::ButtonText("Confirmar".to_string()),
                &Scope::Within(modal),
            )
            .await
            .unwrap();
        assert_eq!(found.unwrap().id, "inside");
    }

    #[tokio::test]
    async fn test_field_lookup_is_case_insensitive() {
        let page = FakePage::new();
        page.add_field(
            "Cliente",
            FieldHandle {
                element: ElementHandle::new("partner", "input"),
                field_name: "partner_id".to_string(),
                kind: FieldKind::Text,
            },
        );

        let field = page
            .find_field_by_label("cliente", ExecContext::Default)
            .await
            .unwrap();
        assert_eq!(field.unwrap().field_name, "partner_id");
    }

    #[tokio::test]
    async fn test_action_log_records_dispatches() {
        let page = FakePage::new();
        let handle = ElementHandle::new("save", "button");
        page.click(&handle).await.unwrap();
        page.fill(&handle, "x").await.unwrap();
        assert_eq!(page.actions(), vec!["click:save", "fill:save=x"]);
    }
}
