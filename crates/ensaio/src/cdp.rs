//! Real browser control over the Chrome DevTools Protocol.
//!
//! Enabled with the `browser` feature. Element interaction goes through
//! in-page evaluation: matched elements are tagged with a synthetic
//! attribute so later actions can address them without holding remote
//! object references across calls.

use crate::driver::{ElementHandle, FieldHandle, FieldKind, PageDriver, Scope};
use crate::probe::Probe;
use crate::result::{EnsaioError, EnsaioResult};
use crate::step::ExecContext;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Attribute used to address elements across evaluate calls
const HANDLE_ATTR: &str = "data-ensaio-id";

/// Launch options for the managed browser
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Run without a visible window
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Explicit chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable inside containers)
    pub sandbox: bool,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            chromium_path: None,
            sandbox: true,
        }
    }
}

/// A launched browser plus the page the engine drives
#[derive(Debug)]
pub struct BrowserSession {
    browser: Browser,
    #[allow(dead_code)]
    handler: tokio::task::JoinHandle<()>,
    page: Arc<Mutex<Page>>,
}

impl BrowserSession {
    /// Launch a browser and open a blank page
    pub async fn launch(options: &BrowserOptions) -> EnsaioResult<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(options.viewport_width, options.viewport_height);

        if !options.headless {
            builder = builder.with_head();
        }
        if !options.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = options.chromium_path {
            builder = builder.chrome_executable(path);
        }

        let config = builder
            .build()
            .map_err(|e| EnsaioError::BrowserLaunchError { message: e })?;

        let (browser, mut events) =
            Browser::launch(config)
                .await
                .map_err(|e| EnsaioError::BrowserLaunchError {
                    message: e.to_string(),
                })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| EnsaioError::driver(e.to_string()))?;

        Ok(Self {
            browser,
            handler,
            page: Arc::new(Mutex::new(page)),
        })
    }

    /// Navigate the page to an address
    pub async fn goto(&self, address: &str) -> EnsaioResult<()> {
        let page = self.page.lock().await;
        page.goto(address)
            .await
            .map_err(|e| EnsaioError::driver(format!("navigation to {address} failed: {e}")))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| EnsaioError::driver(e.to_string()))?;
        Ok(())
    }

    /// Driver bound to this session's page
    #[must_use]
    pub fn driver(&self) -> CdpDriver {
        CdpDriver {
            page: Arc::clone(&self.page),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Close the browser
    pub async fn close(mut self) -> EnsaioResult<()> {
        self.browser
            .close()
            .await
            .map_err(|e| EnsaioError::driver(e.to_string()))?;
        Ok(())
    }
}

/// [`PageDriver`] over a CDP page
#[derive(Debug)]
pub struct CdpDriver {
    page: Arc<Mutex<Page>>,
    next_handle: AtomicU64,
}

impl CdpDriver {
    async fn eval(&self, expression: &str) -> EnsaioResult<serde_json::Value> {
        let page = self.page.lock().await;
        let result = page
            .evaluate(expression)
            .await
            .map_err(|e| EnsaioError::driver(e.to_string()))?;
        result
            .into_value()
            .map_err(|e| EnsaioError::driver(e.to_string()))
    }

    /// JS expression resolving the query root for a scope
    fn root_js(scope: &Scope) -> String {
        match scope {
            Scope::Document => "document".to_string(),
            Scope::Within(handle) => format!(
                "document.querySelector('[{HANDLE_ATTR}=\"{}\"]')",
                handle.id
            ),
        }
    }

    /// JS expression acting on a previously tagged element
    async fn with_element(&self, handle: &ElementHandle, body: &str) -> EnsaioResult<()> {
        let script = format!(
            "(() => {{ \
                const el = document.querySelector('[{HANDLE_ATTR}=\"{}\"]'); \
                if (!el) return false; \
                {body} \
                return true; \
            }})()",
            handle.id
        );
        let found = self.eval(&script).await?;
        if found.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(EnsaioError::driver(format!(
                "stale element handle '{}'",
                handle.id
            )))
        }
    }

    fn parse_handle(value: &serde_json::Value) -> Option<ElementHandle> {
        let obj = value.as_object()?;
        let mut attributes = BTreeMap::new();
        if let Some(attrs) = obj.get("attrs").and_then(serde_json::Value::as_object) {
            for (name, v) in attrs {
                if let Some(s) = v.as_str() {
                    attributes.insert(name.clone(), s.to_string());
                }
            }
        }
        Some(ElementHandle {
            id: obj.get("id")?.as_str()?.to_string(),
            tag: obj.get("tag")?.as_str()?.to_string(),
            text: obj
                .get("text")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string(),
            visible: obj
                .get("visible")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false),
            attributes,
        })
    }
}

#[async_trait]
impl PageDriver for CdpDriver {
    async fn query_visible(
        &self,
        probe: &Probe,
        scope: &Scope,
    ) -> EnsaioResult<Option<ElementHandle>> {
        let id = format!("ensaio-{}", self.next_handle.fetch_add(1, Ordering::Relaxed));
        let script = format!(
            "(() => {{ \
                const root = {root}; \
                if (!root) return null; \
                const el = {probe_js}; \
                if (!el) return null; \
                const style = window.getComputedStyle(el); \
                const visible = el.getClientRects().length > 0 && style.visibility !== 'hidden'; \
                if (!visible) return null; \
                el.setAttribute('{HANDLE_ATTR}', '{id}'); \
                const attrs = {{}}; \
                for (const a of el.attributes) attrs[a.name] = a.value; \
                return {{ id: '{id}', tag: el.tagName.toLowerCase(), \
                          text: (el.textContent || '').trim(), visible: true, attrs }}; \
            }})()",
            root = Self::root_js(scope),
            probe_js = probe.as_js_in("root"),
        );
        let value = self.eval(&script).await?;
        Ok(Self::parse_handle(&value))
    }

    async fn click(&self, handle: &ElementHandle) -> EnsaioResult<()> {
        self.with_element(handle, "el.click();").await
    }

    async fn fill(&self, handle: &ElementHandle, value: &str) -> EnsaioResult<()> {
        let body = format!(
            "el.focus(); el.value = {value}; \
             el.dispatchEvent(new Event('input', {{bubbles: true}})); \
             el.dispatchEvent(new Event('change', {{bubbles: true}}));",
            value = serde_json::Value::from(value)
        );
        self.with_element(handle, &body).await
    }

    async fn hover(&self, handle: &ElementHandle) -> EnsaioResult<()> {
        self.with_element(
            handle,
            "el.dispatchEvent(new MouseEvent('mouseover', {bubbles: true})); \
             el.dispatchEvent(new MouseEvent('mouseenter', {bubbles: true}));",
        )
        .await
    }

    async fn select_option(&self, handle: &ElementHandle, value: &str) -> EnsaioResult<()> {
        let body = format!(
            "const wanted = {value}; \
             const opt = [...el.options].find((o) => \
                 o.value === wanted || o.textContent.trim() === wanted); \
             if (opt) {{ el.value = opt.value; \
                 el.dispatchEvent(new Event('change', {{bubbles: true}})); }}",
            value = serde_json::Value::from(value)
        );
        self.with_element(handle, &body).await
    }

    async fn current_address(&self) -> EnsaioResult<String> {
        let value = self.eval("window.location.href").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn current_title(&self) -> EnsaioResult<String> {
        let value = self.eval("document.title").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn evaluate_in_page(&self, expression: &str) -> EnsaioResult<serde_json::Value> {
        self.eval(expression).await
    }

    async fn find_field_by_label(
        &self,
        label: &str,
        context: ExecContext,
    ) -> EnsaioResult<Option<FieldHandle>> {
        let root = match context {
            ExecContext::Default => "document".to_string(),
            ExecContext::Modal => {
                "(document.querySelector('.o_dialog .modal-content') || document)".to_string()
            }
        };
        let id = format!("ensaio-{}", self.next_handle.fetch_add(1, Ordering::Relaxed));
        let script = format!(
            "(() => {{ \
                const root = {root}; \
                const wanted = {label}; \
                const lab = [...root.querySelectorAll('label')].find((l) => \
                    (l.textContent || '').trim().toLowerCase() === wanted); \
                if (!lab) return null; \
                let input = null; \
                const forId = lab.getAttribute('for'); \
                if (forId) input = root.querySelector('#' + CSS.escape(forId)); \
                if (!input) {{ \
                    const row = lab.closest('.o_field_widget, tr, .o_row') || lab.parentElement; \
                    if (row) input = row.querySelector('input, textarea, select'); \
                }} \
                if (!input) return null; \
                input.setAttribute('{HANDLE_ATTR}', '{id}'); \
                const tag = input.tagName.toLowerCase(); \
                const type = (input.getAttribute('type') || '').toLowerCase(); \
                const kind = tag === 'select' ? 'select' \
                    : type === 'checkbox' ? 'checkbox' : 'text'; \
                return {{ id: '{id}', tag, kind, \
                          name: input.getAttribute('name') || forId || wanted }}; \
            }})()",
            label = serde_json::Value::from(label.trim().to_lowercase()),
        );
        let value = self.eval(&script).await?;
        let Some(obj) = value.as_object() else {
            return Ok(None);
        };

        let mut element = ElementHandle::new(
            obj.get("id")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default(),
            obj.get("tag")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("input"),
        );
        element.visible = true;

        let kind = match obj.get("kind").and_then(serde_json::Value::as_str) {
            Some("select") => FieldKind::Select,
            Some("checkbox") => FieldKind::Checkbox,
            _ => FieldKind::Text,
        };
        Ok(Some(FieldHandle {
            element,
            field_name: obj
                .get("name")
                .and_then(serde_json::Value::as_str)
                .unwrap_or(label)
                .to_string(),
            kind,
        }))
    }

    async fn is_current_application(&self, name: &str) -> EnsaioResult<bool> {
        let script = format!(
            "(() => {{ \
                const brand = document.querySelector('.o_main_navbar .o_menu_brand'); \
                if (!brand) return false; \
                return (brand.textContent || '').trim().toLowerCase() === {name}; \
            }})()",
            name = serde_json::Value::from(name.trim().to_lowercase()),
        );
        let value = self.eval(&script).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn serialize_markup(&self) -> EnsaioResult<String> {
        let value = self.eval("document.documentElement.outerHTML").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}
