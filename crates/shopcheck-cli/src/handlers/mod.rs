//! Command handlers, one module per subcommand

pub mod config;
pub mod reset;
pub mod run;
pub mod selectors;

pub use config::{execute_config, render_config};
pub use reset::execute_reset;
pub use run::{execute_run, list_scenarios};
pub use selectors::{execute_selectors, render_selectors};

use shopcheck::mock::{MockProvider, Storefront};
use shopcheck::{SessionProvider, SuiteConfig};
use std::sync::Arc;
use tracing::info;

use crate::error::CliResult;

/// Session source for `run` and `reset`.
///
/// `mock` serves the simulated storefront at the configured origin;
/// otherwise a Chromium is launched per session.
pub fn session_provider(config: &SuiteConfig, mock: bool) -> CliResult<Arc<dyn SessionProvider>> {
    if mock {
        let layout = config.checkout_layout;
        let origin = config.base_url.trim_end_matches('/').to_string();
        info!(%origin, ?layout, "using simulated storefront");
        return Ok(Arc::new(MockProvider::new(origin, move || {
            Storefront::new(layout)
        })));
    }
    browser_provider(config)
}

#[cfg(feature = "browser")]
fn browser_provider(config: &SuiteConfig) -> CliResult<Arc<dyn SessionProvider>> {
    info!(headless = config.browser.headless, "using chromium");
    Ok(Arc::new(shopcheck::ChromiumProvider::new(
        config.browser.clone(),
    )))
}

#[cfg(not(feature = "browser"))]
fn browser_provider(_: &SuiteConfig) -> CliResult<Arc<dyn SessionProvider>> {
    Err(crate::error::CliError::invalid_argument(
        "browser support not compiled in; rebuild with --features browser or pass --mock",
    ))
}
