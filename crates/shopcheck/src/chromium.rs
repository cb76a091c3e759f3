//! Chromium session over CDP.
//!
//! Element handles are realised by tagging matched nodes with a
//! `data-shopcheck-id` attribute; every later action re-finds the node through
//! that attribute and reports [`ShopError::Detached`] when it is gone.

#![allow(clippy::significant_drop_tightening, clippy::missing_errors_doc)]

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::handler::viewport::Viewport as CdpViewport;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BrowserSettings;
use crate::locator::Selector;
use crate::result::{ShopError, ShopResult};
use crate::session::{ElementHandle, PageState, Session, SessionProvider};

const HANDLE_ATTR: &str = "data-shopcheck-id";

/// Counts outstanding fetch/XHR requests in every new document
const NETWORK_TRACKER: &str = r"(() => {
  if (window.__shopcheckInFlight !== undefined) return;
  window.__shopcheckInFlight = 0;
  const done = () => { window.__shopcheckInFlight = Math.max(0, window.__shopcheckInFlight - 1); };
  const origFetch = window.fetch;
  if (origFetch) {
    window.fetch = function (...args) {
      window.__shopcheckInFlight++;
      return origFetch.apply(this, args).finally(done);
    };
  }
  const origSend = XMLHttpRequest.prototype.send;
  XMLHttpRequest.prototype.send = function (...args) {
    window.__shopcheckInFlight++;
    this.addEventListener('loadend', done, { once: true });
    return origSend.apply(this, args);
  };
})();";

const PAGE_STATE: &str = r"(() => ({
  ready: document.readyState === 'complete',
  in_flight: window.__shopcheckInFlight || 0,
  animations: document.getAnimations
    ? document.getAnimations().filter(a => a.playState === 'running').length
    : 0,
}))()";

#[derive(Deserialize)]
struct Located {
    id: String,
    tag: String,
}

fn session_err(e: impl fmt::Display) -> ShopError {
    ShopError::session(e.to_string())
}

fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn handle_css(id: &str) -> String {
    format!("[{HANDLE_ATTR}=\"{id}\"]")
}

fn handle_lookup(handle: &ElementHandle) -> String {
    format!("document.querySelector({})", js_str(&handle_css(&handle.id)))
}

/// Script that tags and reports every match of `selector` beneath `scope`.
///
/// Evaluates to `null` when the scope element is no longer attached.
fn locate_script(selector: &Selector, scope: Option<&ElementHandle>) -> String {
    let scope_expr = scope.map_or_else(|| "document".to_string(), handle_lookup);
    format!(
        "(() => {{ const scope = {scope_expr}; if (!scope) return null; \
         return {matches}.map(el => {{ \
           if (!el.hasAttribute('{HANDLE_ATTR}')) {{ \
             window.__shopcheckSeq = (window.__shopcheckSeq || 0) + 1; \
             el.setAttribute('{HANDLE_ATTR}', 'sc' + window.__shopcheckSeq); \
           }} \
           return {{ id: el.getAttribute('{HANDLE_ATTR}'), tag: el.tagName.toLowerCase() }}; \
         }}); }})()",
        matches = selector.to_js("scope"),
    )
}

/// Script that evaluates `body` with `el` bound to the handle's element.
///
/// Evaluates to `null` when detached, otherwise a one-element array.
fn element_script(handle: &ElementHandle, body: &str) -> String {
    format!(
        "(() => {{ const el = {}; if (!el) return null; return [({body})]; }})()",
        handle_lookup(handle)
    )
}

/// A tab in a dedicated Chromium instance
pub struct ChromiumSession {
    page: Page,
    browser: Mutex<Option<Browser>>,
    handler: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for ChromiumSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChromiumSession").finish_non_exhaustive()
    }
}

impl ChromiumSession {
    /// Launch a browser and open one blank tab
    ///
    /// # Errors
    ///
    /// [`ShopError::BrowserLaunch`] when the browser cannot start.
    pub async fn launch(settings: &BrowserSettings) -> ShopResult<Self> {
        let mut builder = BrowserConfig::builder();
        if !settings.headless {
            builder = builder.with_head();
        }
        if settings.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = settings.chromium_path {
            builder = builder.chrome_executable(path);
        }
        if let Some(vp) = settings.viewport {
            builder = builder.window_size(vp.width, vp.height).viewport(CdpViewport {
                width: vp.width,
                height: vp.height,
                ..CdpViewport::default()
            });
        }

        let config = builder
            .build()
            .map_err(|message| ShopError::BrowserLaunch { message })?;
        let (browser, mut handler) =
            Browser::launch(config)
                .await
                .map_err(|e| ShopError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ShopError::BrowserLaunch {
                message: e.to_string(),
            })?;
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(NETWORK_TRACKER))
            .await
            .map_err(session_err)?;
        info!(headless = settings.headless, "chromium session opened");

        Ok(Self {
            page,
            browser: Mutex::new(Some(browser)),
            handler: Mutex::new(Some(handle)),
        })
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> ShopResult<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(session_err)?
            .into_value()
            .map_err(session_err)
    }

    async fn on_element<T: DeserializeOwned>(
        &self,
        handle: &ElementHandle,
        body: &str,
    ) -> ShopResult<T> {
        let wrapped: Option<(T,)> = self.eval(element_script(handle, body)).await?;
        wrapped.map(|(v,)| v).ok_or_else(|| ShopError::Detached {
            handle: handle.id.clone(),
        })
    }

    async fn find(&self, handle: &ElementHandle) -> ShopResult<chromiumoxide::element::Element> {
        self.page
            .find_element(handle_css(&handle.id))
            .await
            .map_err(|_| ShopError::Detached {
                handle: handle.id.clone(),
            })
    }
}

#[async_trait]
impl Session for ChromiumSession {
    async fn goto(&self, url: &str) -> ShopResult<()> {
        debug!(url, "navigating");
        self.page
            .goto(url)
            .await
            .map_err(|e| ShopError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn url(&self) -> ShopResult<String> {
        Ok(self.page.url().await.map_err(session_err)?.unwrap_or_default())
    }

    async fn title(&self) -> ShopResult<String> {
        Ok(self
            .page
            .get_title()
            .await
            .map_err(session_err)?
            .unwrap_or_default())
    }

    async fn locate(
        &self,
        selector: &Selector,
        scope: Option<&ElementHandle>,
    ) -> ShopResult<Vec<ElementHandle>> {
        let found: Option<Vec<Located>> = self.eval(locate_script(selector, scope)).await?;
        match found {
            Some(items) => Ok(items
                .into_iter()
                .map(|l| ElementHandle::new(l.id, l.tag))
                .collect()),
            None => Err(ShopError::Detached {
                handle: scope.map(|s| s.id.clone()).unwrap_or_default(),
            }),
        }
    }

    async fn click(&self, element: &ElementHandle) -> ShopResult<()> {
        let el = self.find(element).await?;
        el.scroll_into_view().await.map_err(session_err)?;
        el.click().await.map_err(session_err)?;
        Ok(())
    }

    async fn fill(&self, element: &ElementHandle, value: &str) -> ShopResult<()> {
        let body = format!(
            "(el.focus(), el.value = {}, \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})), \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})), true)",
            js_str(value)
        );
        self.on_element::<bool>(element, &body).await.map(|_| ())
    }

    async fn text_content(&self, element: &ElementHandle) -> ShopResult<String> {
        self.on_element(element, "(el.innerText || el.textContent || '').trim()")
            .await
    }

    async fn input_value(&self, element: &ElementHandle) -> ShopResult<String> {
        self.on_element(element, "String(el.value ?? '')").await
    }

    async fn is_visible(&self, element: &ElementHandle) -> ShopResult<bool> {
        self.on_element(
            element,
            "!!(el.offsetWidth || el.offsetHeight || el.getClientRects().length) && \
             getComputedStyle(el).visibility !== 'hidden'",
        )
        .await
    }

    async fn is_enabled(&self, element: &ElementHandle) -> ShopResult<bool> {
        self.on_element(
            element,
            "!el.disabled && el.getAttribute('aria-disabled') !== 'true'",
        )
        .await
    }

    async fn select_option(&self, element: &ElementHandle, value: &str) -> ShopResult<()> {
        let body = format!(
            "(() => {{ const v = {}; \
               const opt = Array.from(el.options || []) \
                 .find(o => o.value === v || o.text.trim() === v); \
               if (!opt) return false; \
               el.value = opt.value; \
               el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
               return true; }})()",
            js_str(value)
        );
        if self.on_element::<bool>(element, &body).await? {
            Ok(())
        } else {
            Err(ShopError::session(format!(
                "no option '{value}' in {element}"
            )))
        }
    }

    async fn press_key(&self, element: &ElementHandle, key: &str) -> ShopResult<()> {
        let el = self.find(element).await?;
        el.focus().await.map_err(session_err)?;
        el.press_key(key).await.map_err(session_err)?;
        Ok(())
    }

    async fn go_back(&self) -> ShopResult<()> {
        let _: bool = self.eval("(history.back(), true)".to_string()).await?;
        self.page.wait_for_navigation().await.map_err(session_err)?;
        Ok(())
    }

    async fn page_state(&self) -> ShopResult<PageState> {
        self.eval(PAGE_STATE.to_string()).await
    }

    async fn screenshot(&self) -> ShopResult<Vec<u8>> {
        use base64::Engine;

        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let shot = self.page.execute(params).await.map_err(session_err)?;
        base64::engine::general_purpose::STANDARD
            .decode(&shot.data)
            .map_err(session_err)
    }

    async fn close(&self) -> ShopResult<()> {
        let browser = self.browser.lock().await.take();
        let Some(mut browser) = browser else {
            return Ok(());
        };
        let closed = browser.close().await.map(|_| ()).map_err(session_err);
        if let Err(e) = browser.wait().await {
            warn!(error = %e, "browser process did not exit cleanly");
        }
        if let Some(handler) = self.handler.lock().await.take() {
            handler.abort();
        }
        debug!("chromium session closed");
        closed
    }
}

/// Launches one Chromium instance per session
#[derive(Debug, Clone)]
pub struct ChromiumProvider {
    settings: Arc<BrowserSettings>,
}

impl ChromiumProvider {
    /// Provider using `settings` for every launch
    #[must_use]
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }
}

#[async_trait]
impl SessionProvider for ChromiumProvider {
    async fn open(&self) -> ShopResult<Arc<dyn Session>> {
        let session = ChromiumSession::launch(&self.settings).await?;
        Ok(Arc::new(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_script_scopes_to_handle() {
        let scope = ElementHandle::new("sc4", "div");
        let script = locate_script(&Selector::css(".cart-item"), Some(&scope));
        assert!(script.contains(r#"document.querySelector("[data-shopcheck-id=\"sc4\"]")"#));
        assert!(script.contains("scope.querySelectorAll(\".cart-item\")"));
        assert!(script.contains("if (!scope) return null"));
    }

    #[test]
    fn test_locate_script_defaults_to_document() {
        let script = locate_script(&Selector::css("#Email"), None);
        assert!(script.contains("const scope = document;"));
    }

    #[test]
    fn test_element_script_wraps_value() {
        let script = element_script(&ElementHandle::new("sc1", "input"), "el.value");
        assert!(script.contains("return [(el.value)]"));
        assert!(script.contains("if (!el) return null"));
    }
}
