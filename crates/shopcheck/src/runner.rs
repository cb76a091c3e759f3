//! Suite runner and report.
//!
//! Runs suite fixtures once, then each selected scenario in order, every
//! one in its own session. A scenario that runs past the scenario ceiling
//! is abandoned and recorded as timed out. A failing scenario gets a
//! screenshot in the output directory when the session can take one. With
//! fail-fast, the scenarios after the first failure are reported as
//! skipped.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::SuiteConfig;
use crate::fixture::{FixtureManager, SuiteFixture};
use crate::pages::{PageContext, Pages};
use crate::result::{ShopError, ShopResult};
use crate::scenarios::{Scenario, ScenarioData};
use crate::session::{SessionProvider, SessionScope};

/// Log a scenario step
pub fn step(name: &str) {
    info!("Step: {name}");
}

/// Outcome of one scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    /// Passed
    Passed,
    /// Failed
    Failed,
    /// Not run because an earlier scenario failed under fail-fast
    Skipped,
}

/// One row of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario name
    pub name: String,
    /// Outcome
    pub status: ScenarioStatus,
    /// Wall time
    #[serde(with = "millis")]
    pub duration: Duration,
    /// Error text for failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Action failure class (`not-found`, `disabled`, ...) when the error was
    /// an element action outcome
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// Screenshot taken at failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
}

impl ScenarioResult {
    fn passed(name: &str, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            status: ScenarioStatus::Passed,
            duration,
            error: None,
            failure: None,
            screenshot: None,
        }
    }

    fn failed(name: &str, duration: Duration, error: &ShopError, screenshot: Option<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            status: ScenarioStatus::Failed,
            duration,
            error: Some(error.to_string()),
            failure: error.failure().map(|f| f.to_string()),
            screenshot,
        }
    }

    fn skipped(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: ScenarioStatus::Skipped,
            duration: Duration::ZERO,
            error: None,
            failure: None,
            screenshot: None,
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Results of one suite run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Unique run id
    pub run_id: Uuid,
    /// Target storefront
    pub base_url: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Per-scenario results in run order
    pub results: Vec<ScenarioResult>,
}

impl SuiteReport {
    fn count(&self, status: ScenarioStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Scenarios that passed
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(ScenarioStatus::Passed)
    }

    /// Scenarios that failed
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(ScenarioStatus::Failed)
    }

    /// Scenarios skipped by fail-fast
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(ScenarioStatus::Skipped)
    }

    /// True when nothing failed or was skipped
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.skipped() == 0
    }

    /// Sum of scenario durations
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.results.iter().map(|r| r.duration).sum()
    }

    /// Result for a scenario by name
    #[must_use]
    pub fn result(&self, name: &str) -> Option<&ScenarioResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} passed, {} failed, {} skipped in {:.1}s",
            self.passed(),
            self.failed(),
            self.skipped(),
            self.total_duration().as_secs_f64()
        )
    }

    /// Write as pretty JSON, creating parent directories
    ///
    /// # Errors
    ///
    /// I/O or serialization failures.
    pub fn write_json(&self, path: &Path) -> ShopResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Scenario selection and stop policy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Only scenarios whose name contains this
    pub filter: Option<String>,
    /// Skip the rest after the first failure
    pub fail_fast: bool,
}

/// Runs scenarios against sessions from one provider
pub struct SuiteRunner {
    config: Arc<SuiteConfig>,
    provider: Arc<dyn SessionProvider>,
    data: Arc<ScenarioData>,
    fixtures: FixtureManager,
}

impl std::fmt::Debug for SuiteRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteRunner")
            .field("base_url", &self.config.base_url)
            .field("fixtures", &self.fixtures)
            .finish_non_exhaustive()
    }
}

impl SuiteRunner {
    /// Runner with default scenario data and no fixtures
    #[must_use]
    pub fn new(config: SuiteConfig, provider: Arc<dyn SessionProvider>) -> Self {
        Self {
            config: Arc::new(config),
            provider,
            data: Arc::new(ScenarioData::default()),
            fixtures: FixtureManager::new(),
        }
    }

    /// Use this scenario data
    #[must_use]
    pub fn with_data(mut self, data: ScenarioData) -> Self {
        self.data = Arc::new(data);
        self
    }

    /// Register a suite fixture
    #[must_use]
    pub fn with_fixture(mut self, fixture: impl SuiteFixture + 'static) -> Self {
        self.fixtures.register(fixture);
        self
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Set up fixtures, run `scenarios` filtered by `options`, tear down.
    ///
    /// Scenario failures are recorded in the report, not returned.
    ///
    /// # Errors
    ///
    /// [`ShopError::Fixture`] when a fixture fails to set up; no scenario
    /// runs in that case.
    pub async fn run(&mut self, scenarios: &[Scenario], options: &RunOptions) -> ShopResult<SuiteReport> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();
        info!(%run_id, base_url = %self.config.base_url, "suite starting");

        self.fixtures.setup_all().await?;

        let selected = scenarios
            .iter()
            .filter(|s| options.filter.as_deref().map_or(true, |f| s.name.contains(f)));
        let mut results = Vec::new();
        let mut stop = false;
        for scenario in selected {
            if stop {
                results.push(ScenarioResult::skipped(scenario.name));
                continue;
            }
            let result = self.run_one(*scenario).await;
            stop = options.fail_fast && result.status == ScenarioStatus::Failed;
            results.push(result);
        }

        if let Err(e) = self.fixtures.teardown_all().await {
            warn!(error = %e, "fixture teardown failed");
        }

        let report = SuiteReport {
            run_id,
            base_url: self.config.base_url.clone(),
            started_at,
            finished_at: Utc::now(),
            results,
        };
        info!(summary = %report.summary(), "suite finished");
        Ok(report)
    }

    /// Run a single scenario in a fresh session, bounded by the scenario
    /// ceiling; the session is closed either way
    pub async fn run_one(&self, scenario: Scenario) -> ScenarioResult {
        info!(scenario = scenario.name, "scenario starting");
        let config = self.config.clone();
        let data = self.data.clone();
        let start = Instant::now();

        let outcome = SessionScope::run(self.provider.as_ref(), move |driver| {
            async move {
                let pages = Pages::new(&PageContext::from_config(driver, &config)?)?;
                let ceiling = config.timeouts.scenario();
                let ran = tokio::time::timeout(ceiling, scenario.run(&pages, &data))
                    .await
                    .unwrap_or_else(|_| {
                        let ms = ceiling.as_millis() as u64;
                        warn!(scenario = scenario.name, ms, "scenario abandoned at ceiling");
                        Err(ShopError::ScenarioTimeout {
                            scenario: scenario.name.to_string(),
                            ms,
                        })
                    });
                match ran {
                    Ok(()) => Ok(Attempt::default()),
                    Err(err) => {
                        let screenshot = tokio::time::timeout(
                            config.timeouts.action(),
                            capture(&pages, &config.output_dir, scenario.name),
                        )
                        .await
                        .unwrap_or_else(|_| {
                            warn!(scenario = scenario.name, "failure screenshot timed out");
                            None
                        });
                        Ok(Attempt {
                            error: Some(err),
                            screenshot,
                        })
                    }
                }
            }
            .boxed()
        })
        .await;

        let duration = start.elapsed();
        let (error, screenshot) = match outcome {
            Ok(attempt) => (attempt.error, attempt.screenshot),
            Err(err) => (Some(err), None),
        };
        match error {
            None => {
                info!(scenario = scenario.name, ms = duration.as_millis() as u64, "passed");
                ScenarioResult::passed(scenario.name, duration)
            }
            Some(err) => {
                error!(scenario = scenario.name, error = %err, "failed");
                ScenarioResult::failed(scenario.name, duration, &err, screenshot)
            }
        }
    }
}

#[derive(Default)]
struct Attempt {
    error: Option<ShopError>,
    screenshot: Option<PathBuf>,
}

async fn capture(pages: &Pages, output_dir: &Path, name: &str) -> Option<PathBuf> {
    let path = output_dir.join("screenshots").join(format!("{name}.png"));
    match pages.actions().save_screenshot(&path).await {
        Ok(saved) => Some(saved),
        Err(e) => {
            warn!(scenario = name, error = %e, "failure screenshot not saved");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixture::DataResetFixture;
    use crate::mock::{MockProvider, MockSession, Storefront, DEMO_ORIGIN};
    use crate::session::Session;
    use async_trait::async_trait;
    use futures::future::BoxFuture;
    use tempfile::TempDir;

    /// Sessions whose navigation never answers
    struct HungProvider;

    #[async_trait]
    impl SessionProvider for HungProvider {
        async fn open(&self) -> ShopResult<Arc<dyn Session>> {
            Ok(Arc::new(
                MockSession::with_site(DEMO_ORIGIN, Storefront::default())
                    .stall_on("goto", Duration::from_secs(3_600)),
            ))
        }
    }

    fn opens_cart<'a>(p: &'a Pages, _: &'a ScenarioData) -> BoxFuture<'a, ShopResult<()>> {
        async move { p.cart.open().await }.boxed()
    }

    fn passing<'a>(_: &'a Pages, _: &'a ScenarioData) -> BoxFuture<'a, ShopResult<()>> {
        async { Ok(()) }.boxed()
    }

    fn failing<'a>(p: &'a Pages, _: &'a ScenarioData) -> BoxFuture<'a, ShopResult<()>> {
        async move {
            p.cart.open().await?;
            p.cart.click_checkout().await
        }
        .boxed()
    }

    fn runner(output: &Path) -> SuiteRunner {
        let config = SuiteConfig {
            base_url: DEMO_ORIGIN.to_string(),
            output_dir: output.to_path_buf(),
            ..SuiteConfig::default()
        };
        SuiteRunner::new(config, Arc::new(MockProvider::new(DEMO_ORIGIN, Storefront::default)))
    }

    fn scenarios() -> Vec<Scenario> {
        vec![
            Scenario::new("first_passes", "", passing),
            Scenario::new("empty_cart_checkout", "", failing),
            Scenario::new("last_passes", "", passing),
        ]
    }

    mod run_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_records_failure_with_screenshot() {
            let out = TempDir::new().unwrap();
            let report = runner(out.path())
                .run(&scenarios(), &RunOptions::default())
                .await
                .unwrap();
            assert_eq!(report.passed(), 2);
            assert_eq!(report.failed(), 1);
            assert!(!report.is_success());

            let failed = report.result("empty_cart_checkout").unwrap();
            assert_eq!(failed.failure.as_deref(), Some("not-found"));
            let shot = failed.screenshot.as_ref().unwrap();
            assert!(shot.ends_with("screenshots/empty_cart_checkout.png"));
            assert!(shot.exists());
        }

        #[tokio::test(start_paused = true)]
        async fn test_fail_fast_skips_rest() {
            let out = TempDir::new().unwrap();
            let options = RunOptions {
                fail_fast: true,
                ..RunOptions::default()
            };
            let report = runner(out.path()).run(&scenarios(), &options).await.unwrap();
            assert_eq!(report.result("last_passes").unwrap().status, ScenarioStatus::Skipped);
            assert_eq!(report.skipped(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_filter() {
            let out = TempDir::new().unwrap();
            let options = RunOptions {
                filter: Some("passes".into()),
                ..RunOptions::default()
            };
            let report = runner(out.path()).run(&scenarios(), &options).await.unwrap();
            assert_eq!(report.results.len(), 2);
            assert!(report.is_success());
        }

        #[tokio::test(start_paused = true)]
        async fn test_hung_scenario_fails_at_scenario_ceiling() {
            let out = TempDir::new().unwrap();
            let mut config = SuiteConfig {
                base_url: DEMO_ORIGIN.to_string(),
                output_dir: out.path().to_path_buf(),
                ..SuiteConfig::default()
            };
            config.timeouts.scenario_ms = 5_000;
            let runner = SuiteRunner::new(config, Arc::new(HungProvider));

            let start = tokio::time::Instant::now();
            let result = runner.run_one(Scenario::new("hangs", "", opens_cart)).await;
            let elapsed = start.elapsed();

            assert_eq!(result.status, ScenarioStatus::Failed);
            assert_eq!(result.failure.as_deref(), Some("timed-out"));
            assert!(result
                .error
                .as_deref()
                .unwrap()
                .contains("did not finish within 5000ms"));
            assert!(elapsed >= Duration::from_secs(5));
            assert!(elapsed < Duration::from_secs(60));
        }

        #[tokio::test(start_paused = true)]
        async fn test_failed_fixture_aborts_run() {
            let out = TempDir::new().unwrap();
            let broken = Arc::new(MockProvider::new(DEMO_ORIGIN, crate::mock::StaticSite::default));
            let config = SuiteConfig {
                base_url: DEMO_ORIGIN.to_string(),
                ..SuiteConfig::default()
            };
            let err = runner(out.path())
                .with_fixture(DataResetFixture::new(broken, config))
                .run(&scenarios(), &RunOptions::default())
                .await
                .unwrap_err();
            assert!(matches!(err, ShopError::Fixture { .. }));
        }
    }

    mod report_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_report_json_roundtrip() {
            let out = TempDir::new().unwrap();
            let report = runner(out.path())
                .run(&scenarios(), &RunOptions::default())
                .await
                .unwrap();
            let path = out.path().join("report.json");
            report.write_json(&path).unwrap();
            let text = std::fs::read_to_string(&path).unwrap();
            assert!(text.contains("\"status\": \"failed\""));
            let back: SuiteReport = serde_json::from_str(&text).unwrap();
            assert_eq!(back.run_id, report.run_id);
            assert_eq!(back.failed(), 1);
        }

        #[test]
        fn test_summary() {
            let report = SuiteReport {
                run_id: Uuid::nil(),
                base_url: DEMO_ORIGIN.to_string(),
                started_at: Utc::now(),
                finished_at: Utc::now(),
                results: vec![
                    ScenarioResult::passed("a", Duration::from_millis(1500)),
                    ScenarioResult::skipped("b"),
                ],
            };
            assert_eq!(report.summary(), "1 passed, 0 failed, 1 skipped in 1.5s");
        }
    }
}
