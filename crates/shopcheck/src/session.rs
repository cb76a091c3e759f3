//! Session - Abstract Browser Tab Trait
//!
//! Everything above this module talks to the browser through [`Session`]. Two
//! implementations ship with the crate:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Session (async trait)                                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────┐     ┌───────────────────────────┐  │
//! │  │  ChromiumSession     │     │  MockSession              │  │
//! │  │  (feature "browser") │     │  (in-memory storefront)   │  │
//! │  │  CDP via chromiumoxide│    │  unit + scenario tests    │  │
//! │  └──────────────────────┘     └───────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Page objects never hold a session directly. They share a [`Driver`], which
//! pairs the session with an async command lock so that two page objects on
//! the same tab can never interleave commands.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::locator::Selector;
use crate::result::ShopResult;

/// Opaque handle to a DOM element.
///
/// Valid only for the action that produced it; page objects never store one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Session-scoped identifier
    pub id: String,
    /// Element tag name, lowercase
    pub tag_name: String,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
        }
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}#{}>", self.tag_name, self.id)
    }
}

/// Snapshot of page activity used for quiescence checks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    /// `document.readyState == "complete"`
    pub ready: bool,
    /// Outstanding fetch/XHR requests
    pub in_flight: u32,
    /// Running CSS/Web animations
    pub animations: u32,
}

impl PageState {
    /// A fully settled page
    #[must_use]
    pub const fn settled() -> Self {
        Self {
            ready: true,
            in_flight: 0,
            animations: 0,
        }
    }

    /// Whether nothing is happening at this instant
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.ready && self.in_flight == 0 && self.animations == 0
    }
}

/// Abstract browser tab.
///
/// Methods take `&self`; implementations use interior mutability so a session
/// can be shared behind an `Arc`. Element methods fail with
/// [`crate::ShopError::Detached`] when a handle no longer refers to an element
/// in the document.
#[async_trait]
pub trait Session: Send + Sync {
    /// Navigate to an absolute URL and wait for the load event
    async fn goto(&self, url: &str) -> ShopResult<()>;

    /// Current URL
    async fn url(&self) -> ShopResult<String>;

    /// Document title
    async fn title(&self) -> ShopResult<String>;

    /// All elements matching `selector` in document order, searched beneath
    /// `scope` (or the whole document)
    async fn locate(
        &self,
        selector: &Selector,
        scope: Option<&ElementHandle>,
    ) -> ShopResult<Vec<ElementHandle>>;

    /// Click an element
    async fn click(&self, element: &ElementHandle) -> ShopResult<()>;

    /// Replace an input's value
    async fn fill(&self, element: &ElementHandle, value: &str) -> ShopResult<()>;

    /// Trimmed text content
    async fn text_content(&self, element: &ElementHandle) -> ShopResult<String>;

    /// Current value of an input, select or textarea
    async fn input_value(&self, element: &ElementHandle) -> ShopResult<String>;

    /// Whether the element is rendered and visible
    async fn is_visible(&self, element: &ElementHandle) -> ShopResult<bool>;

    /// Whether the element is not disabled
    async fn is_enabled(&self, element: &ElementHandle) -> ShopResult<bool>;

    /// Select an `<option>` by value or label
    async fn select_option(&self, element: &ElementHandle, value: &str) -> ShopResult<()>;

    /// Press a named key ("Enter", "Tab") while the element has focus
    async fn press_key(&self, element: &ElementHandle, key: &str) -> ShopResult<()>;

    /// Navigate back in history
    async fn go_back(&self) -> ShopResult<()>;

    /// Document readiness and activity counters
    async fn page_state(&self) -> ShopResult<PageState>;

    /// PNG screenshot of the viewport
    async fn screenshot(&self) -> ShopResult<Vec<u8>>;

    /// Close the tab and release its resources
    async fn close(&self) -> ShopResult<()>;
}

/// Shared session plus command lock.
///
/// Cheap to clone; every clone serializes through the same lock.
#[derive(Clone)]
pub struct Driver {
    session: Arc<dyn Session>,
    lock: Arc<Mutex<()>>,
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver").finish_non_exhaustive()
    }
}

impl Driver {
    /// Wrap a session
    #[must_use]
    pub fn new(session: Arc<dyn Session>) -> Self {
        Self {
            session,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// The underlying session
    #[must_use]
    pub fn session(&self) -> &dyn Session {
        self.session.as_ref()
    }

    /// Acquire the command lock for one externally visible step
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }

    /// Close the underlying session
    ///
    /// # Errors
    ///
    /// Propagates the session's close failure.
    pub async fn close(&self) -> ShopResult<()> {
        let _guard = self.lock().await;
        self.session.close().await
    }
}

/// Source of fresh sessions, one per scenario
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Open a new session
    async fn open(&self) -> ShopResult<Arc<dyn Session>>;
}

/// Scoped session ownership: open, run, always close
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionScope;

impl SessionScope {
    /// Run `body` with a fresh driver and close the session whatever the
    /// outcome.
    ///
    /// A close failure is reported only when the body succeeded; otherwise
    /// the body's error wins and the close failure is logged.
    ///
    /// # Errors
    ///
    /// Returns the open failure, the body's error, or the close failure.
    pub async fn run<T, F>(provider: &dyn SessionProvider, body: F) -> ShopResult<T>
    where
        T: Send,
        F: FnOnce(Driver) -> BoxFuture<'static, ShopResult<T>> + Send,
    {
        let session = provider.open().await?;
        let driver = Driver::new(session);
        let outcome = body(driver.clone()).await;
        let closed = driver.close().await;
        match (outcome, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(close_err)) => Err(close_err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                tracing::warn!(error = %close_err, "session close failed after scenario error");
                Err(err)
            }
        }
    }
}
