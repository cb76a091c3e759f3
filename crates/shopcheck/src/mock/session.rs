//! In-memory [`Session`] over a [`MockSite`].

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use super::dom::{MockElement, MockPage};
use crate::locator::Selector;
use crate::result::{ShopError, ShopResult};
use crate::session::{ElementHandle, PageState, Session, SessionProvider};

/// What a user interaction did to the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteEffect {
    /// Nothing observable beyond the element itself
    None,
    /// The page re-rendered in place; old handles are detached
    Rerender,
    /// Navigated to a new path
    Navigate(String),
}

/// Server and client behavior behind a [`MockSession`]
pub trait MockSite: Send {
    /// Render the page at `path` (including any query string); `None` is a 404
    fn render(&self, path: &str) -> Option<MockPage>;

    /// Handle a click on element `key`
    fn click(&mut self, path: &str, key: &str) -> SiteEffect;

    /// Handle typing into element `key`
    fn fill(&mut self, path: &str, key: &str, value: &str) -> SiteEffect;

    /// Handle choosing an option on a select
    fn select(&mut self, path: &str, key: &str, value: &str) -> SiteEffect {
        self.fill(path, key, value)
    }

    /// Handle a key press on element `key`
    fn press_key(&mut self, _path: &str, _key: &str, _name: &str) -> SiteEffect {
        SiteEffect::None
    }
}

/// Single-page site built from a fixed list of elements
#[derive(Debug, Clone)]
pub struct StaticSite {
    title: String,
    elements: Vec<MockElement>,
    values: HashMap<String, String>,
    created: Instant,
}

impl StaticSite {
    /// Create an empty page with a title
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            elements: Vec::new(),
            values: HashMap::new(),
            created: Instant::now(),
        }
    }

    /// Add an element
    #[must_use]
    pub fn with(mut self, element: MockElement) -> Self {
        self.elements.push(element);
        self
    }
}

impl Default for StaticSite {
    fn default() -> Self {
        Self::new("Mock")
    }
}

impl MockSite for StaticSite {
    fn render(&self, _path: &str) -> Option<MockPage> {
        let age = self.created.elapsed();
        let mut page = MockPage::new(self.title.clone());
        for el in &self.elements {
            if el.appears_after.is_some_and(|d| age < d) {
                continue;
            }
            if el.disappears_after.is_some_and(|d| age >= d) {
                continue;
            }
            let mut el = el.clone();
            if let Some(v) = self.values.get(&el.key) {
                el.value = Some(v.clone());
            }
            page.push(el);
        }
        Some(page)
    }

    fn click(&mut self, _path: &str, key: &str) -> SiteEffect {
        self.elements
            .iter()
            .find(|e| e.key == key)
            .and_then(|e| e.navigates_to.clone())
            .map_or(SiteEffect::None, SiteEffect::Navigate)
    }

    fn fill(&mut self, _path: &str, key: &str, value: &str) -> SiteEffect {
        let _ = self.values.insert(key.to_string(), value.to_string());
        SiteEffect::None
    }

    fn press_key(&mut self, path: &str, key: &str, name: &str) -> SiteEffect {
        if name == "Enter" {
            self.click(path, key)
        } else {
            SiteEffect::None
        }
    }
}

struct Inner {
    origin: String,
    site: Box<dyn MockSite>,
    path: Option<String>,
    back_stack: Vec<String>,
    generation: u64,
    history: Vec<String>,
    busy_after_effect: u32,
    busy_remaining: u32,
    scripted_states: VecDeque<PageState>,
    fail_next: Option<String>,
    action_latency: Duration,
    stalls: HashMap<&'static str, Duration>,
    closed: bool,
}

impl Inner {
    fn check(&mut self, call: String) -> ShopResult<()> {
        self.history.push(call);
        if self.closed {
            return Err(ShopError::session("session closed"));
        }
        if let Some(message) = self.fail_next.take() {
            return Err(ShopError::session(message));
        }
        Ok(())
    }

    fn current_path(&self) -> ShopResult<&str> {
        self.path
            .as_deref()
            .ok_or_else(|| ShopError::session("no page loaded"))
    }

    fn page(&self) -> ShopResult<MockPage> {
        let path = self.current_path()?;
        self.site.render(path).ok_or_else(|| ShopError::Navigation {
            url: format!("{}{path}", self.origin),
            message: "404 Not Found".to_string(),
        })
    }

    fn handle(&self, key: &str, tag: &str) -> ElementHandle {
        ElementHandle::new(format!("{}:{key}", self.generation), tag)
    }

    /// Resolve a handle to its element key, failing if it is stale
    fn key_of(&self, handle: &ElementHandle, page: &MockPage) -> ShopResult<String> {
        let detached = || ShopError::Detached {
            handle: handle.id.clone(),
        };
        let (generation, key) = handle.id.split_once(':').ok_or_else(detached)?;
        if generation != self.generation.to_string() || page.get(key).is_none() {
            return Err(detached());
        }
        Ok(key.to_string())
    }

    fn navigate(&mut self, path: String) -> ShopResult<()> {
        if self.site.render(&path).is_none() {
            return Err(ShopError::Navigation {
                url: format!("{}{path}", self.origin),
                message: "404 Not Found".to_string(),
            });
        }
        if let Some(previous) = self.path.replace(path) {
            self.back_stack.push(previous);
        }
        self.generation += 1;
        self.busy_remaining = self.busy_after_effect;
        Ok(())
    }

    fn apply(&mut self, effect: SiteEffect) -> ShopResult<()> {
        match effect {
            SiteEffect::None => Ok(()),
            SiteEffect::Rerender => {
                self.generation += 1;
                self.busy_remaining = self.busy_after_effect;
                Ok(())
            }
            SiteEffect::Navigate(path) => self.navigate(path),
        }
    }
}

/// Mock session for unit and scenario testing.
///
/// Records every call in a history, like a flight recorder, so tests can
/// assert on what the layer above actually did.
pub struct MockSession {
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for MockSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSession").finish_non_exhaustive()
    }
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSession {
    /// Origin used by [`MockSession::new`]
    pub const DEFAULT_ORIGIN: &'static str = "https://shop.test";

    /// Session over an empty static page
    #[must_use]
    pub fn new() -> Self {
        Self::with_site(Self::DEFAULT_ORIGIN, StaticSite::default())
    }

    /// Session over any site, served at `origin`
    #[must_use]
    pub fn with_site(origin: impl Into<String>, site: impl MockSite + 'static) -> Self {
        Self {
            inner: Mutex::new(Inner {
                origin: origin.into().trim_end_matches('/').to_string(),
                site: Box::new(site),
                path: None,
                back_stack: Vec::new(),
                generation: 0,
                history: Vec::new(),
                busy_after_effect: 0,
                busy_remaining: 0,
                scripted_states: VecDeque::new(),
                fail_next: None,
                action_latency: Duration::ZERO,
                stalls: HashMap::new(),
                closed: false,
            }),
        }
    }

    /// Session over a static page that is already loaded at `/`
    #[must_use]
    pub fn loaded(site: StaticSite) -> Self {
        let session = Self::with_site(Self::DEFAULT_ORIGIN, site);
        if let Ok(mut inner) = session.inner.lock() {
            inner.path = Some("/".to_string());
            inner.generation = 1;
        }
        session
    }

    /// Report one in-flight request for the next `polls` page-state checks
    /// after every navigation or re-render
    #[must_use]
    pub fn with_network_latency(self, polls: u32) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.busy_after_effect = polls;
        }
        self
    }

    /// Delay every click, fill, select and key press
    #[must_use]
    pub fn with_action_latency(self, latency: Duration) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.action_latency = latency;
        }
        self
    }

    /// Block every `method` call (`goto`, `locate`, `is_visible`,
    /// `page_state`) for `duration` before it answers
    #[must_use]
    pub fn stall_on(self, method: &'static str, duration: Duration) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            let _ = inner.stalls.insert(method, duration);
        }
        self
    }

    /// Queue page states returned ahead of the computed ones
    pub fn script_page_states(&self, states: impl IntoIterator<Item = PageState>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.scripted_states.extend(states);
        }
    }

    /// Make the next command fail with a transport error
    pub fn fail_next_command(&self, message: impl Into<String>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_next = Some(message.into());
        }
    }

    /// Call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|inner| inner.history.clone())
            .unwrap_or_default()
    }

    /// Check if a method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.history().iter().any(|c| c.starts_with(method))
    }

    /// Number of calls starting with `method`
    #[must_use]
    pub fn call_count(&self, method: &str) -> usize {
        self.history()
            .iter()
            .filter(|c| c.starts_with(method))
            .count()
    }

    fn lock(&self) -> ShopResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| ShopError::session("mock session state poisoned"))
    }

    async fn latency(&self) -> ShopResult<()> {
        let latency = self.lock()?.action_latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        Ok(())
    }

    async fn stall(&self, method: &str) -> ShopResult<()> {
        let stall = self.lock()?.stalls.get(method).copied();
        if let Some(duration) = stall {
            tokio::time::sleep(duration).await;
        }
        Ok(())
    }

    fn with_element<T>(
        &self,
        call: String,
        element: &ElementHandle,
        f: impl FnOnce(&mut Inner, &MockPage, &str) -> ShopResult<T>,
    ) -> ShopResult<T> {
        let mut inner = self.lock()?;
        inner.check(call)?;
        let page = inner.page()?;
        let key = inner.key_of(element, &page)?;
        f(&mut inner, &page, &key)
    }
}

#[async_trait]
impl Session for MockSession {
    async fn goto(&self, url: &str) -> ShopResult<()> {
        self.stall("goto").await?;
        let mut inner = self.lock()?;
        inner.check(format!("goto:{url}"))?;
        let path = url
            .strip_prefix(inner.origin.as_str())
            .ok_or_else(|| ShopError::Navigation {
                url: url.to_string(),
                message: format!("host not served by mock ({})", inner.origin),
            })?;
        let path = if path.is_empty() { "/" } else { path };
        inner.navigate(path.to_string())
    }

    async fn url(&self) -> ShopResult<String> {
        let mut inner = self.lock()?;
        inner.check("url".to_string())?;
        Ok(match &inner.path {
            Some(path) => format!("{}{path}", inner.origin),
            None => "about:blank".to_string(),
        })
    }

    async fn title(&self) -> ShopResult<String> {
        let mut inner = self.lock()?;
        inner.check("title".to_string())?;
        Ok(inner.page()?.title)
    }

    async fn locate(
        &self,
        selector: &Selector,
        scope: Option<&ElementHandle>,
    ) -> ShopResult<Vec<ElementHandle>> {
        self.stall("locate").await?;
        let mut inner = self.lock()?;
        inner.check(format!("locate:{selector}"))?;
        let page = inner.page()?;
        let scope_key = scope.map(|s| inner.key_of(s, &page)).transpose()?;
        Ok(page
            .query(selector, scope_key.as_deref())
            .into_iter()
            .filter_map(|key| page.get(&key).map(|el| inner.handle(&key, &el.tag)))
            .collect())
    }

    async fn click(&self, element: &ElementHandle) -> ShopResult<()> {
        self.latency().await?;
        self.with_element(format!("click:{}", element.id), element, |inner, _, key| {
            let path = inner.current_path()?.to_string();
            let effect = inner.site.click(&path, key);
            inner.apply(effect)
        })
    }

    async fn fill(&self, element: &ElementHandle, value: &str) -> ShopResult<()> {
        self.latency().await?;
        self.with_element(format!("fill:{}={value}", element.id), element, |inner, _, key| {
            let path = inner.current_path()?.to_string();
            let effect = inner.site.fill(&path, key, value);
            inner.apply(effect)
        })
    }

    async fn text_content(&self, element: &ElementHandle) -> ShopResult<String> {
        self.with_element(format!("text:{}", element.id), element, |_, page, key| {
            Ok(page.full_text(key))
        })
    }

    async fn input_value(&self, element: &ElementHandle) -> ShopResult<String> {
        self.with_element(format!("value:{}", element.id), element, |_, page, key| {
            Ok(page
                .get(key)
                .and_then(|e| e.value.clone())
                .unwrap_or_default())
        })
    }

    async fn is_visible(&self, element: &ElementHandle) -> ShopResult<bool> {
        self.stall("is_visible").await?;
        self.with_element(format!("visible:{}", element.id), element, |_, page, key| {
            Ok(page.is_visible(key))
        })
    }

    async fn is_enabled(&self, element: &ElementHandle) -> ShopResult<bool> {
        self.with_element(format!("enabled:{}", element.id), element, |_, page, key| {
            Ok(page.get(key).is_some_and(|e| e.enabled))
        })
    }

    async fn select_option(&self, element: &ElementHandle, value: &str) -> ShopResult<()> {
        self.latency().await?;
        self.with_element(format!("select:{}={value}", element.id), element, |inner, _, key| {
            let path = inner.current_path()?.to_string();
            let effect = inner.site.select(&path, key, value);
            inner.apply(effect)
        })
    }

    async fn press_key(&self, element: &ElementHandle, key_name: &str) -> ShopResult<()> {
        self.latency().await?;
        self.with_element(format!("press:{}={key_name}", element.id), element, |inner, _, key| {
            let path = inner.current_path()?.to_string();
            let effect = inner.site.press_key(&path, key, key_name);
            inner.apply(effect)
        })
    }

    async fn go_back(&self) -> ShopResult<()> {
        let mut inner = self.lock()?;
        inner.check("go_back".to_string())?;
        if let Some(previous) = inner.back_stack.pop() {
            inner.path = Some(previous);
            inner.generation += 1;
            inner.busy_remaining = inner.busy_after_effect;
        }
        Ok(())
    }

    async fn page_state(&self) -> ShopResult<PageState> {
        self.stall("page_state").await?;
        let mut inner = self.lock()?;
        inner.check("page_state".to_string())?;
        if let Some(state) = inner.scripted_states.pop_front() {
            return Ok(state);
        }
        if inner.busy_remaining > 0 {
            inner.busy_remaining -= 1;
            return Ok(PageState {
                ready: true,
                in_flight: 1,
                animations: 0,
            });
        }
        Ok(PageState::settled())
    }

    async fn screenshot(&self) -> ShopResult<Vec<u8>> {
        let mut inner = self.lock()?;
        inner.check("screenshot".to_string())?;
        Ok(b"\x89PNG\r\n\x1a\n".to_vec())
    }

    async fn close(&self) -> ShopResult<()> {
        let mut inner = self.lock()?;
        inner.history.push("close".to_string());
        inner.closed = true;
        Ok(())
    }
}

/// [`SessionProvider`] handing out a fresh [`MockSession`] per open, each
/// over a new site from `factory`
pub struct MockProvider<F> {
    origin: String,
    factory: F,
    opened: AtomicUsize,
}

impl<F> std::fmt::Debug for MockProvider<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("origin", &self.origin)
            .field("opened", &self.opened.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<F, S> MockProvider<F>
where
    F: Fn() -> S + Send + Sync,
    S: MockSite + 'static,
{
    /// Serve sites from `factory` at `origin`
    #[must_use]
    pub fn new(origin: impl Into<String>, factory: F) -> Self {
        Self {
            origin: origin.into(),
            factory,
            opened: AtomicUsize::new(0),
        }
    }

    /// Sessions opened so far
    #[must_use]
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl<F, S> SessionProvider for MockProvider<F>
where
    F: Fn() -> S + Send + Sync,
    S: MockSite + 'static,
{
    async fn open(&self) -> ShopResult<Arc<dyn Session>> {
        let _ = self.opened.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(MockSession::with_site(
            self.origin.clone(),
            (self.factory)(),
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn site() -> StaticSite {
        StaticSite::new("Static")
            .with(MockElement::new("btn", "button").matching(".go").navigates_to("/next"))
            .with(MockElement::new("q", "input").matching("#Query"))
    }

    #[tokio::test]
    async fn test_goto_and_url() {
        let session = MockSession::with_site("https://shop.test/", site());
        assert_eq!(session.url().await.unwrap(), "about:blank");
        session.goto("https://shop.test").await.unwrap();
        assert_eq!(session.url().await.unwrap(), "https://shop.test/");
        assert_eq!(session.title().await.unwrap(), "Static");
    }

    #[tokio::test]
    async fn test_foreign_host_is_navigation_error() {
        let session = MockSession::with_site("https://shop.test", site());
        let err = session.goto("https://elsewhere.test/").await.unwrap_err();
        assert!(matches!(err, ShopError::Navigation { .. }));
    }

    #[tokio::test]
    async fn test_click_navigates_and_detaches_old_handles() {
        let session = MockSession::loaded(site());
        let btn = session
            .locate(&Selector::css(".go"), None)
            .await
            .unwrap()
            .remove(0);
        session.click(&btn).await.unwrap();
        assert_eq!(session.url().await.unwrap(), "https://shop.test/next");

        let err = session.text_content(&btn).await.unwrap_err();
        assert!(matches!(err, ShopError::Detached { .. }));

        session.go_back().await.unwrap();
        assert_eq!(session.url().await.unwrap(), "https://shop.test/");
    }

    #[tokio::test]
    async fn test_fill_persists_value() {
        let session = MockSession::loaded(site());
        let input = session
            .locate(&Selector::css("#Query"), None)
            .await
            .unwrap()
            .remove(0);
        session.fill(&input, "iphone").await.unwrap();
        assert_eq!(session.input_value(&input).await.unwrap(), "iphone");
        assert!(session.was_called("fill"));
    }

    #[tokio::test]
    async fn test_injected_transport_failure() {
        let session = MockSession::loaded(site());
        session.fail_next_command("socket closed");
        let err = session.locate(&Selector::css(".go"), None).await.unwrap_err();
        assert!(matches!(err, ShopError::Session { .. }));
        assert!(session.locate(&Selector::css(".go"), None).await.is_ok());
    }

    #[tokio::test]
    async fn test_closed_session_rejects_commands() {
        let session = MockSession::loaded(site());
        session.close().await.unwrap();
        assert!(session.url().await.is_err());
    }

    #[tokio::test]
    async fn test_network_latency_reports_busy_polls() {
        let session = MockSession::with_site("https://shop.test", site()).with_network_latency(2);
        session.goto("https://shop.test/").await.unwrap();
        assert_eq!(session.page_state().await.unwrap().in_flight, 1);
        assert_eq!(session.page_state().await.unwrap().in_flight, 1);
        assert!(session.page_state().await.unwrap().is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_appearing_element() {
        let site = StaticSite::new("Late").with(
            MockElement::new("late", "div")
                .matching(".late")
                .appears_after(Duration::from_millis(300)),
        );
        let session = MockSession::loaded(site);
        assert!(session
            .locate(&Selector::css(".late"), None)
            .await
            .unwrap()
            .is_empty());
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(
            session.locate(&Selector::css(".late"), None).await.unwrap().len(),
            1
        );
    }
}
