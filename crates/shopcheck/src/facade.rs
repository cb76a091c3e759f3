//! Action Facade
//!
//! Typed browser operations with uniform failure handling. Every public
//! method performs one externally visible step under the driver's command
//! lock:
//!
//! 1. resolve the element through the [`QueryEngine`]
//! 2. check it can take the action (visible, enabled)
//! 3. act under a ceiling
//! 4. wait for quiescence when the action can change the page
//!
//! Failures map onto [`ShopError`]: absence to `NotFound`, an elapsed
//! ceiling to `ActionTimeout`, a hidden element to `NotVisible`, a disabled
//! control to `Disabled`. Nothing here sleeps for a fixed time.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{join_url, Timeouts};
use crate::locator::SelectorSpec;
use crate::query::{Probe, QueryEngine, Resolution};
use crate::result::{ShopError, ShopResult};
use crate::session::{Driver, ElementHandle};
use crate::wait::{self, WaitOptions};

/// Per-call overrides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOptions {
    /// Resolution budget and action ceiling; `None` uses the configured
    /// defaults
    pub timeout: Option<Duration>,
    /// Search beneath this element instead of the whole document
    pub scope: Option<ElementHandle>,
}

impl ActionOptions {
    /// Options with an explicit timeout
    #[must_use]
    pub fn timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            scope: None,
        }
    }

    /// Options scoped beneath `scope`
    #[must_use]
    pub fn within(scope: ElementHandle) -> Self {
        Self {
            timeout: None,
            scope: Some(scope),
        }
    }

    /// Set the timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Browser operations shared by every page object
#[derive(Debug, Clone)]
pub struct Actions {
    driver: Driver,
    base_url: String,
    timeouts: Timeouts,
}

impl Actions {
    /// Create a facade over `driver`
    #[must_use]
    pub fn new(driver: Driver, base_url: impl Into<String>, timeouts: Timeouts) -> Self {
        Self {
            driver,
            base_url: base_url.into(),
            timeouts,
        }
    }

    /// The shared driver
    #[must_use]
    pub const fn driver(&self) -> &Driver {
        &self.driver
    }

    /// Storefront origin
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Configured timeouts
    #[must_use]
    pub const fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    fn engine(&self) -> QueryEngine<'_> {
        QueryEngine::new(self.driver.session()).with_poll_interval(self.timeouts.poll_interval())
    }

    fn budget(&self, options: &ActionOptions) -> Duration {
        options
            .timeout
            .unwrap_or_else(|| self.timeouts.default_timeout())
    }

    fn ceiling(&self, options: &ActionOptions) -> Duration {
        options.timeout.unwrap_or_else(|| self.timeouts.action())
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    /// Open a site path (or absolute URL) and wait for quiescence
    ///
    /// # Errors
    ///
    /// [`ShopError::Navigation`] when the page fails or does not load within
    /// the navigation timeout; [`ShopError::QuiescenceTimeout`].
    pub async fn navigate_to(&self, path: &str) -> ShopResult<()> {
        let url = join_url(&self.base_url, path);
        let _guard = self.driver.lock().await;
        info!(url = %url, "navigate");
        let limit = self.timeouts.navigation();
        match tokio::time::timeout(limit, self.driver.session().goto(&url)).await {
            Ok(loaded) => loaded?,
            Err(_) => {
                return Err(ShopError::Navigation {
                    url,
                    message: format!("no load event within {}ms", limit.as_millis()),
                })
            }
        }
        self.settle().await
    }

    /// Navigate back in history
    ///
    /// # Errors
    ///
    /// Session failures; [`ShopError::QuiescenceTimeout`].
    pub async fn go_back(&self) -> ShopResult<()> {
        let _guard = self.driver.lock().await;
        info!("navigate back");
        self.driver.session().go_back().await?;
        self.settle().await
    }

    /// Current URL
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn current_url(&self) -> ShopResult<String> {
        let _guard = self.driver.lock().await;
        self.driver.session().url().await
    }

    /// Document title
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn title(&self) -> ShopResult<String> {
        let _guard = self.driver.lock().await;
        self.driver.session().title().await
    }

    /// Wait until the page is quiescent
    ///
    /// # Errors
    ///
    /// [`ShopError::QuiescenceTimeout`] at the configured ceiling.
    pub async fn wait_for_quiescence(&self) -> ShopResult<()> {
        let _guard = self.driver.lock().await;
        self.settle().await
    }

    async fn settle(&self) -> ShopResult<()> {
        let waited = wait::wait_for_quiescence(self.driver.session(), self.timeouts.quiescence()).await?;
        debug!(waited_ms = waited.as_millis() as u64, "quiescent");
        Ok(())
    }

    // =========================================================================
    // ELEMENT ACTIONS
    // =========================================================================

    /// Click an element and wait for quiescence
    ///
    /// # Errors
    ///
    /// `NotFound`, `NotVisible`, `Disabled`, `ActionTimeout`, or
    /// `QuiescenceTimeout`.
    pub async fn click(&self, spec: &SelectorSpec) -> ShopResult<()> {
        self.click_with(spec, &ActionOptions::default()).await
    }

    /// [`Actions::click`] with per-call options
    ///
    /// # Errors
    ///
    /// See [`Actions::click`].
    pub async fn click_with(&self, spec: &SelectorSpec, options: &ActionOptions) -> ShopResult<()> {
        let _guard = self.driver.lock().await;
        let handle = self.interactable(spec, options, true).await?;
        info!(element = spec.name(), "click");
        let session = self.driver.session();
        self.bounded(spec, "click", self.ceiling(options), session.click(&handle))
            .await?;
        self.settle().await
    }

    /// Replace the value of an input
    ///
    /// # Errors
    ///
    /// `NotFound`, `NotVisible`, `Disabled`, or `ActionTimeout`.
    pub async fn fill(&self, spec: &SelectorSpec, value: &str) -> ShopResult<()> {
        self.fill_with(spec, value, &ActionOptions::default()).await
    }

    /// [`Actions::fill`] with per-call options
    ///
    /// # Errors
    ///
    /// See [`Actions::fill`].
    pub async fn fill_with(
        &self,
        spec: &SelectorSpec,
        value: &str,
        options: &ActionOptions,
    ) -> ShopResult<()> {
        let _guard = self.driver.lock().await;
        let handle = self.interactable(spec, options, true).await?;
        info!(element = spec.name(), "fill");
        let session = self.driver.session();
        self.bounded(spec, "fill", self.ceiling(options), session.fill(&handle, value))
            .await
    }

    /// Choose an option of a `<select>` and wait for quiescence
    ///
    /// # Errors
    ///
    /// `NotFound`, `NotVisible`, `Disabled`, `ActionTimeout`, or
    /// `QuiescenceTimeout`.
    pub async fn select_option(&self, spec: &SelectorSpec, value: &str) -> ShopResult<()> {
        let options = ActionOptions::default();
        let _guard = self.driver.lock().await;
        let handle = self.interactable(spec, &options, true).await?;
        info!(element = spec.name(), value, "select");
        let session = self.driver.session();
        self.bounded(
            spec,
            "select",
            self.ceiling(&options),
            session.select_option(&handle, value),
        )
        .await?;
        self.settle().await
    }

    /// Press a key on an element and wait for quiescence
    ///
    /// # Errors
    ///
    /// `NotFound`, `NotVisible`, `ActionTimeout`, or `QuiescenceTimeout`.
    pub async fn press_key(&self, spec: &SelectorSpec, key: &str) -> ShopResult<()> {
        let options = ActionOptions::default();
        let _guard = self.driver.lock().await;
        let handle = self.interactable(spec, &options, false).await?;
        info!(element = spec.name(), key, "press");
        let session = self.driver.session();
        self.bounded(spec, "press", self.ceiling(&options), session.press_key(&handle, key))
            .await?;
        self.settle().await
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Trimmed text content of an attached element
    ///
    /// # Errors
    ///
    /// `NotFound` or session failures.
    pub async fn read_text(&self, spec: &SelectorSpec) -> ShopResult<String> {
        self.read_text_with(spec, &ActionOptions::default()).await
    }

    /// [`Actions::read_text`] with per-call options
    ///
    /// # Errors
    ///
    /// See [`Actions::read_text`].
    pub async fn read_text_with(
        &self,
        spec: &SelectorSpec,
        options: &ActionOptions,
    ) -> ShopResult<String> {
        let _guard = self.driver.lock().await;
        let handle = self
            .engine()
            .resolve(spec, options.scope.as_ref(), self.budget(options), Probe::Attached)
            .await?
            .into_handle()?;
        let session = self.driver.session();
        self.bounded(spec, "read", self.ceiling(options), session.text_content(&handle))
            .await
    }

    /// Text of every match, in document order; empty when none match
    ///
    /// Does not wait unless `options.timeout` is set.
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn read_texts(
        &self,
        spec: &SelectorSpec,
        options: &ActionOptions,
    ) -> ShopResult<Vec<String>> {
        let _guard = self.driver.lock().await;
        let handles = self
            .engine()
            .resolve_all(
                spec,
                options.scope.as_ref(),
                options.timeout.unwrap_or_default(),
                Probe::Visible,
            )
            .await?;
        let session = self.driver.session();
        let mut texts = Vec::with_capacity(handles.len());
        for handle in &handles {
            match session.text_content(handle).await {
                Ok(text) => texts.push(text),
                Err(ShopError::Detached { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(texts)
    }

    /// Current value of an input
    ///
    /// # Errors
    ///
    /// `NotFound` or session failures.
    pub async fn input_value(&self, spec: &SelectorSpec) -> ShopResult<String> {
        self.input_value_with(spec, &ActionOptions::default()).await
    }

    /// [`Actions::input_value`] with per-call options
    ///
    /// # Errors
    ///
    /// See [`Actions::input_value`].
    pub async fn input_value_with(
        &self,
        spec: &SelectorSpec,
        options: &ActionOptions,
    ) -> ShopResult<String> {
        let _guard = self.driver.lock().await;
        let handle = self
            .engine()
            .resolve(spec, options.scope.as_ref(), self.budget(options), Probe::Attached)
            .await?
            .into_handle()?;
        self.driver.session().input_value(&handle).await
    }

    /// Whether a visible element is enabled
    ///
    /// # Errors
    ///
    /// `NotFound` when no candidate is visible in time.
    pub async fn is_enabled(&self, spec: &SelectorSpec) -> ShopResult<bool> {
        let _guard = self.driver.lock().await;
        let handle = self
            .engine()
            .resolve(spec, None, self.timeouts.default_timeout(), Probe::Visible)
            .await?
            .into_handle()?;
        self.driver.session().is_enabled(&handle).await
    }

    /// Whether the element is visible right now (single probe)
    ///
    /// # Errors
    ///
    /// Session failures only; absence is `Ok(false)`.
    pub async fn is_present(&self, spec: &SelectorSpec) -> ShopResult<bool> {
        self.is_present_with(spec, &ActionOptions::default()).await
    }

    /// [`Actions::is_present`], waiting up to `options.timeout`
    ///
    /// # Errors
    ///
    /// Session failures only.
    pub async fn is_present_with(
        &self,
        spec: &SelectorSpec,
        options: &ActionOptions,
    ) -> ShopResult<bool> {
        let _guard = self.driver.lock().await;
        Ok(self
            .engine()
            .resolve(
                spec,
                options.scope.as_ref(),
                options.timeout.unwrap_or_default(),
                Probe::Visible,
            )
            .await?
            .is_found())
    }

    /// Wait for an element to become visible
    ///
    /// # Errors
    ///
    /// Session failures; absence is [`Resolution::NotFound`].
    pub async fn wait_for(&self, spec: &SelectorSpec, timeout: Duration) -> ShopResult<Resolution> {
        let _guard = self.driver.lock().await;
        self.engine().resolve(spec, None, timeout, Probe::Visible).await
    }

    /// Wait until no candidate is visible; `false` if it is still there at
    /// the deadline
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn wait_until_gone(&self, spec: &SelectorSpec, timeout: Duration) -> ShopResult<bool> {
        let _guard = self.driver.lock().await;
        let engine = self.engine();
        let options = WaitOptions::new()
            .with_timeout(timeout)
            .with_poll_interval(self.timeouts.poll_interval());
        let result = wait::wait_for(options, || async move {
            Ok(!engine
                .resolve(spec, None, Duration::ZERO, Probe::Visible)
                .await?
                .is_found())
        })
        .await?;
        Ok(result.success)
    }

    /// Number of attached matches right now
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn count(&self, spec: &SelectorSpec) -> ShopResult<usize> {
        let _guard = self.driver.lock().await;
        self.engine().count(spec, None).await
    }

    /// Resolve a visible element, for callers that scope further queries
    /// beneath it
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn resolve(&self, spec: &SelectorSpec, options: &ActionOptions) -> ShopResult<Resolution> {
        let _guard = self.driver.lock().await;
        self.engine()
            .resolve(spec, options.scope.as_ref(), self.budget(options), Probe::Visible)
            .await
    }

    /// Every visible match of the first candidate that has any
    ///
    /// Does not wait unless `options.timeout` is set.
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn resolve_all(
        &self,
        spec: &SelectorSpec,
        options: &ActionOptions,
    ) -> ShopResult<Vec<ElementHandle>> {
        let _guard = self.driver.lock().await;
        self.engine()
            .resolve_all(
                spec,
                options.scope.as_ref(),
                options.timeout.unwrap_or_default(),
                Probe::Visible,
            )
            .await
    }

    // =========================================================================
    // SCREENSHOTS
    // =========================================================================

    /// PNG screenshot of the viewport
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn screenshot(&self) -> ShopResult<Vec<u8>> {
        let _guard = self.driver.lock().await;
        self.driver.session().screenshot().await
    }

    /// Write a screenshot to `path`, creating parent directories
    ///
    /// # Errors
    ///
    /// Session or I/O failures.
    pub async fn save_screenshot(&self, path: &Path) -> ShopResult<PathBuf> {
        let png = self.screenshot().await?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, png).await?;
        info!(path = %path.display(), "screenshot saved");
        Ok(path.to_path_buf())
    }

    // =========================================================================
    // HELPERS (caller holds the lock)
    // =========================================================================

    async fn interactable(
        &self,
        spec: &SelectorSpec,
        options: &ActionOptions,
        require_enabled: bool,
    ) -> ShopResult<ElementHandle> {
        let engine = self.engine();
        let scope = options.scope.as_ref();
        match engine
            .resolve(spec, scope, self.budget(options), Probe::Visible)
            .await?
        {
            Resolution::Found { handle, .. } => {
                if require_enabled && !self.driver.session().is_enabled(&handle).await? {
                    return Err(ShopError::Disabled {
                        element: spec.name().to_string(),
                    });
                }
                Ok(handle)
            }
            absent @ Resolution::NotFound { .. } => {
                let attached = engine
                    .resolve(spec, scope, Duration::ZERO, Probe::Attached)
                    .await?;
                if attached.is_found() {
                    Err(ShopError::NotVisible {
                        element: spec.name().to_string(),
                    })
                } else {
                    absent.into_handle()
                }
            }
        }
    }

    async fn bounded<T>(
        &self,
        spec: &SelectorSpec,
        action: &'static str,
        ceiling: Duration,
        step: impl Future<Output = ShopResult<T>> + Send,
    ) -> ShopResult<T> {
        tokio::time::timeout(ceiling, step)
            .await
            .unwrap_or_else(|_| {
                Err(ShopError::ActionTimeout {
                    element: spec.name().to_string(),
                    action,
                    ms: ceiling.as_millis() as u64,
                })
            })
    }
}
