//! Suite fixtures
//!
//! Setup that runs once before any scenario and teardown that runs once
//! after the last. Fixtures are set up in priority order (highest first) and
//! torn down in reverse; a failed setup tears down whatever already
//! succeeded and aborts the run.

use async_trait::async_trait;
use futures::FutureExt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::SuiteConfig;
use crate::model::Category;
use crate::pages::{HomePage, PageContext};
use crate::result::{ShopError, ShopResult};
use crate::session::{SessionProvider, SessionScope};

/// Suite-level setup and teardown.
///
/// # Example
///
/// ```ignore
/// struct SeedUsers;
///
/// #[async_trait]
/// impl SuiteFixture for SeedUsers {
///     fn name(&self) -> &str {
///         "seed-users"
///     }
///
///     async fn setup(&mut self) -> ShopResult<()> {
///         seed().await
///     }
/// }
/// ```
#[async_trait]
pub trait SuiteFixture: Send + Sync {
    /// Name for logs and errors
    fn name(&self) -> &str;

    /// Priority (higher = set up first, torn down last)
    fn priority(&self) -> i32 {
        0
    }

    /// Run before the first scenario
    ///
    /// # Errors
    ///
    /// Any failure aborts the run.
    async fn setup(&mut self) -> ShopResult<()>;

    /// Run after the last scenario
    ///
    /// # Errors
    ///
    /// Reported but does not change scenario outcomes.
    async fn teardown(&mut self) -> ShopResult<()> {
        Ok(())
    }
}

/// State of a fixture in the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureState {
    /// Registered, not set up
    Registered,
    /// Set up successfully
    SetUp,
    /// Torn down
    TornDown,
    /// Setup or teardown failed
    Failed,
}

struct FixtureEntry {
    fixture: Box<dyn SuiteFixture>,
    state: FixtureState,
}

/// Ordered setup and teardown of suite fixtures
#[derive(Default)]
pub struct FixtureManager {
    entries: Vec<FixtureEntry>,
    setup_order: Vec<usize>,
}

impl std::fmt::Debug for FixtureManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureManager")
            .field("fixtures", &self.list())
            .field("set_up", &self.setup_order.len())
            .finish()
    }
}

impl FixtureManager {
    /// Create an empty manager
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fixture; a fixture with the same name is replaced
    pub fn register(&mut self, fixture: impl SuiteFixture + 'static) {
        let entry = FixtureEntry {
            fixture: Box::new(fixture),
            state: FixtureState::Registered,
        };
        match self
            .entries
            .iter()
            .position(|e| e.fixture.name() == entry.fixture.name())
        {
            Some(i) => self.entries[i] = entry,
            None => self.entries.push(entry),
        }
    }

    /// Number of registered fixtures
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// State of a fixture by name
    #[must_use]
    pub fn state(&self, name: &str) -> Option<FixtureState> {
        self.entries
            .iter()
            .find(|e| e.fixture.name() == name)
            .map(|e| e.state)
    }

    /// Registered fixture names
    #[must_use]
    pub fn list(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.fixture.name()).collect()
    }

    /// Set up every fixture, highest priority first.
    ///
    /// # Errors
    ///
    /// [`ShopError::Fixture`] naming the first fixture that failed. Fixtures
    /// already set up are torn down before returning.
    pub async fn setup_all(&mut self) -> ShopResult<()> {
        let mut ordered: Vec<usize> = (0..self.entries.len()).collect();
        ordered.sort_by_key(|&i| std::cmp::Reverse(self.entries[i].fixture.priority()));
        self.setup_order.clear();

        let mut failure = None;
        for i in ordered {
            let entry = &mut self.entries[i];
            if entry.state == FixtureState::SetUp {
                continue;
            }
            info!(fixture = entry.fixture.name(), "fixture setup");
            if let Err(e) = entry.fixture.setup().await {
                entry.state = FixtureState::Failed;
                failure = Some(format!("Fixture '{}' setup failed: {e}", entry.fixture.name()));
                break;
            }
            entry.state = FixtureState::SetUp;
            self.setup_order.push(i);
        }

        if let Some(message) = failure {
            if let Err(e) = self.teardown_all().await {
                warn!(error = %e, "teardown after failed setup");
            }
            return Err(ShopError::Fixture { message });
        }
        Ok(())
    }

    /// Tear down in reverse setup order.
    ///
    /// Every fixture is attempted.
    ///
    /// # Errors
    ///
    /// The first teardown failure.
    pub async fn teardown_all(&mut self) -> ShopResult<()> {
        let mut first_error = None;
        for i in self.setup_order.drain(..).rev() {
            let entry = &mut self.entries[i];
            if entry.state != FixtureState::SetUp {
                continue;
            }
            info!(fixture = entry.fixture.name(), "fixture teardown");
            match entry.fixture.teardown().await {
                Ok(()) => entry.state = FixtureState::TornDown,
                Err(e) => {
                    entry.state = FixtureState::Failed;
                    if first_error.is_none() {
                        first_error = Some(ShopError::Fixture {
                            message: format!(
                                "Fixture '{}' teardown failed: {e}",
                                entry.fixture.name()
                            ),
                        });
                    }
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Brings the storefront to a known catalog state before the suite.
///
/// Opens its own session, empties the cart and lands on the configured
/// category page. Runs once per suite.
pub struct DataResetFixture {
    provider: Arc<dyn SessionProvider>,
    config: SuiteConfig,
    category: Category,
    runs: usize,
}

impl std::fmt::Debug for DataResetFixture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataResetFixture")
            .field("category", &self.category)
            .field("runs", &self.runs)
            .finish_non_exhaustive()
    }
}

impl DataResetFixture {
    /// Reset fixture for `config.reset_category`
    #[must_use]
    pub fn new(provider: Arc<dyn SessionProvider>, config: SuiteConfig) -> Self {
        let category = config.reset_category;
        Self {
            provider,
            config,
            category,
            runs: 0,
        }
    }

    /// Reset to a different category
    #[must_use]
    pub const fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// How many times the reset has run
    #[must_use]
    pub const fn runs(&self) -> usize {
        self.runs
    }

    /// Run the reset once in a fresh session
    ///
    /// # Errors
    ///
    /// Session, page or reset failures.
    pub async fn reset(&mut self) -> ShopResult<()> {
        let config = self.config.clone();
        let category = self.category;
        SessionScope::run(self.provider.as_ref(), move |driver| {
            async move {
                let ctx = PageContext::from_config(driver, &config)?;
                HomePage::new(&ctx)?.reset_data(category).await
            }
            .boxed()
        })
        .await?;
        self.runs += 1;
        Ok(())
    }
}

#[async_trait]
impl SuiteFixture for DataResetFixture {
    fn name(&self) -> &str {
        "data-reset"
    }

    fn priority(&self) -> i32 {
        100
    }

    async fn setup(&mut self) -> ShopResult<()> {
        self.reset().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::{MockProvider, StaticSite, Storefront, DEMO_ORIGIN};
    use std::sync::Mutex;

    struct Recording {
        name: &'static str,
        priority: i32,
        fail_setup: bool,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Recording {
        fn new(name: &'static str, priority: i32, log: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name,
                priority,
                fail_setup: false,
                log: log.clone(),
            }
        }
    }

    #[async_trait]
    impl SuiteFixture for Recording {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        async fn setup(&mut self) -> ShopResult<()> {
            if self.fail_setup {
                return Err(ShopError::assertion("seed endpoint down"));
            }
            self.log.lock().unwrap().push(format!("setup:{}", self.name));
            Ok(())
        }

        async fn teardown(&mut self) -> ShopResult<()> {
            self.log.lock().unwrap().push(format!("teardown:{}", self.name));
            Ok(())
        }
    }

    fn demo_config() -> SuiteConfig {
        SuiteConfig {
            base_url: DEMO_ORIGIN.to_string(),
            ..SuiteConfig::default()
        }
    }

    mod manager_tests {
        use super::*;

        #[tokio::test]
        async fn test_priority_order_and_reverse_teardown() {
            let log = Arc::new(Mutex::new(Vec::new()));
            let mut manager = FixtureManager::new();
            manager.register(Recording::new("low", 1, &log));
            manager.register(Recording::new("high", 10, &log));
            assert_eq!(manager.count(), 2);
            assert_eq!(manager.state("low"), Some(FixtureState::Registered));

            manager.setup_all().await.unwrap();
            assert_eq!(manager.state("high"), Some(FixtureState::SetUp));
            manager.teardown_all().await.unwrap();
            assert_eq!(manager.state("low"), Some(FixtureState::TornDown));

            assert_eq!(
                *log.lock().unwrap(),
                vec!["setup:high", "setup:low", "teardown:low", "teardown:high"]
            );
        }

        #[tokio::test]
        async fn test_failed_setup_tears_down_earlier_fixtures() {
            let log = Arc::new(Mutex::new(Vec::new()));
            let mut manager = FixtureManager::new();
            manager.register(Recording::new("first", 5, &log));
            let mut broken = Recording::new("broken", 1, &log);
            broken.fail_setup = true;
            manager.register(broken);

            let err = manager.setup_all().await.unwrap_err();
            assert!(matches!(err, ShopError::Fixture { .. }));
            assert!(err.to_string().contains("broken"));
            assert_eq!(manager.state("broken"), Some(FixtureState::Failed));
            assert_eq!(manager.state("first"), Some(FixtureState::TornDown));
            assert_eq!(*log.lock().unwrap(), vec!["setup:first", "teardown:first"]);
        }

        #[tokio::test]
        async fn test_register_same_name_replaces() {
            let log = Arc::new(Mutex::new(Vec::new()));
            let mut manager = FixtureManager::new();
            manager.register(Recording::new("seed", 1, &log));
            manager.register(Recording::new("seed", 2, &log));
            assert_eq!(manager.list(), vec!["seed"]);
        }
    }

    mod reset_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_reset_runs_in_own_session() {
            let provider = Arc::new(MockProvider::new(DEMO_ORIGIN, || {
                Storefront::default().with_cart_line("dell-xps-13", 1)
            }));
            let mut fixture = DataResetFixture::new(provider.clone(), demo_config());
            let mut manager = FixtureManager::new();
            fixture.setup().await.unwrap();
            assert_eq!(fixture.runs(), 1);
            assert_eq!(provider.opened(), 1);

            manager.register(fixture);
            manager.setup_all().await.unwrap();
            assert_eq!(manager.state("data-reset"), Some(FixtureState::SetUp));
            assert_eq!(provider.opened(), 2);
        }

        #[tokio::test(start_paused = true)]
        async fn test_reset_without_category_nav_fails() {
            let provider = Arc::new(MockProvider::new(DEMO_ORIGIN, StaticSite::default));
            let mut manager = FixtureManager::new();
            manager.register(
                DataResetFixture::new(provider, demo_config()).with_category(Category::Tablets),
            );
            let err = manager.setup_all().await.unwrap_err();
            assert!(matches!(err, ShopError::Fixture { .. }));
            assert!(err.to_string().contains("data-reset"));
        }
    }
}
