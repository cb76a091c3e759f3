//! In-memory browser for tests and dry runs.
//!
//! ## Example
//!
//! ```rust,ignore
//! use shopcheck::mock::{MockSession, Storefront, DEMO_ORIGIN};
//!
//! let session = MockSession::with_site(DEMO_ORIGIN, Storefront::default());
//! session.goto("https://demo.simplcommerce.com/cart").await?;
//! ```
//!
//! [`MockSession`] implements [`crate::Session`] over any [`MockSite`].
//! [`StaticSite`] serves a fixed element list for unit tests;
//! [`Storefront`] simulates the whole demo shop for scenario tests.

mod dom;
mod session;
mod storefront;

pub use dom::{MockElement, MockPage};
pub use session::{MockProvider, MockSession, MockSite, SiteEffect, StaticSite};
pub use storefront::{demo_catalog, CatalogItem, Storefront, DEMO_ADMIN, DEMO_ORIGIN};
