//! Suite configuration.
//!
//! Loaded from `shopcheck.yaml`, then overlaid with environment variables:
//!
//! | Variable        | Effect                                        |
//! |-----------------|-----------------------------------------------|
//! | `BASE_URL`      | storefront origin                             |
//! | `CI`            | headless browser with a 1920x1080 viewport    |
//! | `CHROMIUM_PATH` | browser executable                            |

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::{Category, CheckoutLayout};
use crate::registry::SelectorOverrides;
use crate::result::{ShopError, ShopResult};
use crate::wait::{QuiescenceOptions, WaitOptions};

/// Public demo storefront
pub const DEFAULT_BASE_URL: &str = "https://demo.simplcommerce.com/";

/// Default configuration file name
pub const CONFIG_FILE: &str = "shopcheck.yaml";

/// Timeouts, all in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Element resolution budget
    pub default_ms: u64,
    /// Page navigation ceiling
    pub navigation_ms: u64,
    /// Ceiling for one element action
    pub action_ms: u64,
    /// Quiescence ceiling
    pub quiescence_ceiling_ms: u64,
    /// Required idle time
    pub quiet_window_ms: u64,
    /// Poll interval for every wait
    pub poll_interval_ms: u64,
    /// Ceiling for one whole scenario, session setup and teardown excluded
    pub scenario_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            default_ms: 30_000,
            navigation_ms: 60_000,
            action_ms: 60_000,
            quiescence_ceiling_ms: 30_000,
            quiet_window_ms: 500,
            poll_interval_ms: 50,
            scenario_ms: 300_000,
        }
    }
}

impl Timeouts {
    /// Element resolution budget
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_ms)
    }

    /// Navigation ceiling
    #[must_use]
    pub const fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    /// Action ceiling
    #[must_use]
    pub const fn action(&self) -> Duration {
        Duration::from_millis(self.action_ms)
    }

    /// Scenario ceiling
    #[must_use]
    pub const fn scenario(&self) -> Duration {
        Duration::from_millis(self.scenario_ms)
    }

    /// Poll interval
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Quiescence options
    #[must_use]
    pub const fn quiescence(&self) -> QuiescenceOptions {
        QuiescenceOptions {
            ceiling: Duration::from_millis(self.quiescence_ceiling_ms),
            quiet_window: Duration::from_millis(self.quiet_window_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    /// Generic wait options with the resolution budget
    #[must_use]
    pub const fn wait(&self) -> WaitOptions {
        WaitOptions {
            timeout: Duration::from_millis(self.default_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

/// Viewport size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in CSS pixels
    pub width: u32,
    /// Height in CSS pixels
    pub height: u32,
}

/// Browser launch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run without a window
    pub headless: bool,
    /// Fixed viewport; `None` keeps the browser default
    pub viewport: Option<Viewport>,
    /// Browser executable override
    pub chromium_path: Option<PathBuf>,
    /// Pass `--no-sandbox` (containers)
    pub no_sandbox: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: None,
            chromium_path: None,
            no_sandbox: false,
        }
    }
}

/// Complete suite configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Storefront origin
    pub base_url: String,
    /// Timeouts
    pub timeouts: Timeouts,
    /// Browser settings
    pub browser: BrowserSettings,
    /// Category opened by the global data reset
    pub reset_category: Category,
    /// Directory holding test data files
    pub data_dir: PathBuf,
    /// Directory for reports and failure screenshots
    pub output_dir: PathBuf,
    /// Checkout markup variant
    pub checkout_layout: CheckoutLayout,
    /// YAML file with selector overrides
    pub selector_overrides: Option<PathBuf>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeouts: Timeouts::default(),
            browser: BrowserSettings::default(),
            reset_category: Category::Phones,
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("shopcheck-output"),
            checkout_layout: CheckoutLayout::default(),
            selector_overrides: None,
        }
    }
}

impl SuiteConfig {
    /// Parse from YAML; missing keys take defaults
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Yaml`] on malformed input.
    pub fn from_yaml_str(yaml: &str) -> ShopResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load from a YAML file
    ///
    /// # Errors
    ///
    /// I/O or YAML errors.
    pub fn load(path: &Path) -> ShopResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    /// Overlay environment values using `lookup`
    #[must_use]
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("BASE_URL").filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
        if lookup("CI").is_some_and(|v| !v.is_empty() && v != "0" && v != "false") {
            self.browser.headless = true;
            self.browser.viewport = Some(Viewport {
                width: 1920,
                height: 1080,
            });
        }
        if let Some(path) = lookup("CHROMIUM_PATH").filter(|p| !p.trim().is_empty()) {
            self.browser.chromium_path = Some(PathBuf::from(path));
        }
        self
    }

    /// Overlay the process environment
    #[must_use]
    pub fn with_process_env(self) -> Self {
        self.with_env(|key| std::env::var(key).ok())
    }

    /// Check invariants
    ///
    /// # Errors
    ///
    /// [`ShopError::Configuration`] for a non-HTTP base URL or a zero
    /// timeout.
    pub fn validate(&self) -> ShopResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ShopError::configuration(format!(
                "base_url must be http(s): {}",
                self.base_url
            )));
        }
        let t = &self.timeouts;
        if t.navigation_ms == 0
            || t.action_ms == 0
            || t.quiescence_ceiling_ms == 0
            || t.poll_interval_ms == 0
            || t.scenario_ms == 0
        {
            return Err(ShopError::configuration("timeouts must be non-zero"));
        }
        Ok(())
    }

    /// Absolute URL for a site path
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// Selector overrides named by `selector_overrides`, or none
    ///
    /// # Errors
    ///
    /// I/O or YAML errors reading the overrides file.
    pub fn overrides(&self) -> ShopResult<SelectorOverrides> {
        match &self.selector_overrides {
            Some(path) => SelectorOverrides::load(path),
            None => Ok(SelectorOverrides::default()),
        }
    }
}

/// Join an origin and a path with exactly one slash between them
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
