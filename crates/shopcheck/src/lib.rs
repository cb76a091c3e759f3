//! Shopcheck: Resilient Page Objects for Storefront End-to-End Checks
//!
//! Storefront markup drifts between releases and themes. Shopcheck keeps
//! scenarios stable by naming every element semantically and resolving each
//! name through an ordered chain of fallback selectors.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    SHOPCHECK Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenarios  │───►│ Page       │───►│ Actions    │            │
//! │   │ + Runner   │    │ Objects    │    │ (facade)   │            │
//! │   └────────────┘    └────────────┘    └─────┬──────┘            │
//! │                            │                │                   │
//! │                     ┌──────▼─────┐    ┌─────▼──────┐            │
//! │                     │ Selector   │───►│ Query      │            │
//! │                     │ Registry   │    │ Engine     │            │
//! │                     └────────────┘    └─────┬──────┘            │
//! │                                             │                   │
//! │                          ┌──────────────────▼───────────────┐   │
//! │                          │ Session: Chromium (CDP) | Mock   │   │
//! │                          └──────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use shopcheck::{scenarios, RunOptions, SuiteConfig, SuiteRunner};
//! use shopcheck::mock::{MockProvider, Storefront, DEMO_ORIGIN};
//! use std::sync::Arc;
//!
//! let provider = Arc::new(MockProvider::new(DEMO_ORIGIN, Storefront::default));
//! let mut runner = SuiteRunner::new(SuiteConfig::default(), provider);
//! let report = runner.run(&scenarios::all(), &RunOptions::default()).await?;
//! println!("{}", report.summary());
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

mod assertion;
mod config;
mod facade;
mod fixture;
mod locator;
mod model;
mod query;
mod registry;
mod result;
mod runner;
mod session;
mod testdata;
mod wait;

/// Chromium session over the DevTools protocol
#[cfg(feature = "browser")]
pub mod chromium;

/// In-memory browser and simulated storefront
pub mod mock;

/// Page objects for the storefront
pub mod pages;

/// The end-to-end scenario catalogue
pub mod scenarios;

pub use assertion::{Assertion, AssertionResult};
pub use config::{
    join_url, BrowserSettings, SuiteConfig, Timeouts, Viewport, CONFIG_FILE, DEFAULT_BASE_URL,
};
pub use facade::{ActionOptions, Actions};
pub use fixture::{DataResetFixture, FixtureManager, FixtureState, SuiteFixture};
pub use locator::{split_fallbacks, Selector, SelectorSpec, NAME_PLACEHOLDER};
pub use model::{
    Address, CartLine, CartSnapshot, Category, CheckoutLayout, CheckoutStage, Credentials,
    OrderSummary, PaymentDetails, PaymentMethod, Price, ProductCard,
};
pub use pages::{
    CartPage, CheckoutPage, Header, HomePage, LoginPage, PageContext, PageObject, Pages,
    ProductPage,
};
pub use query::{Probe, QueryEngine, Resolution};
pub use registry::{RegistryBuilder, SelectorOverrides, SelectorRegistry};
pub use result::{ActionFailure, ShopError, ShopResult};
pub use runner::{
    step, RunOptions, ScenarioResult, ScenarioStatus, SuiteReport, SuiteRunner,
};
pub use scenarios::{Scenario, ScenarioData};
pub use session::{Driver, ElementHandle, PageState, Session, SessionProvider, SessionScope};
pub use testdata::{
    credentials_from_env, env_or, CheckoutData, ProductQuantity, TestData,
};
pub use wait::{
    wait_for, wait_for_quiescence, QuiescenceOptions, WaitOptions, WaitResult,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS, NETWORK_IDLE_THRESHOLD_MS,
};

#[cfg(feature = "browser")]
pub use chromium::{ChromiumProvider, ChromiumSession};
