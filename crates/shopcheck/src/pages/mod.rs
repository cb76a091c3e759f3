//! Page Objects
//!
//! One type per storefront page. Each holds a clone of the shared [`Actions`]
//! facade and its own immutable [`SelectorRegistry`], built once from default
//! chains plus any per-deployment overrides. No page object ever stores an
//! element handle; every call re-resolves through the registry.
//!
//! ```rust,ignore
//! let pages = Pages::new(&PageContext::from_config(driver, &config)?)?;
//! pages.product.open("iphone-6s-16gb").await?;
//! pages.product.add_to_cart().await?;
//! pages.cart.open().await?;
//! let snapshot = pages.cart.snapshot().await?;
//! ```

mod cart;
mod checkout;
mod header;
mod home;
mod login;
mod product;

pub use cart::CartPage;
pub use checkout::CheckoutPage;
pub use header::Header;
pub use home::HomePage;
pub use login::LoginPage;
pub use product::ProductPage;

use crate::config::SuiteConfig;
use crate::facade::Actions;
use crate::locator::SelectorSpec;
use crate::model::CheckoutLayout;
use crate::registry::{RegistryBuilder, SelectorOverrides, SelectorRegistry};
use crate::result::ShopResult;
use crate::session::Driver;

/// Trait for page objects representing a page or component in the UI.
pub trait PageObject {
    /// Path that opens this page ("/cart"); components return ""
    fn url_pattern(&self) -> &str;

    /// The page's selector registry
    fn registry(&self) -> &SelectorRegistry;

    /// The shared action facade
    fn actions(&self) -> &Actions;

    /// Page name for logging
    fn page_name(&self) -> &str {
        self.registry().page()
    }

    /// Fallback chain for a semantic element
    ///
    /// # Errors
    ///
    /// [`crate::ShopError::Configuration`] for an unknown name.
    fn element(&self, name: &str) -> ShopResult<&SelectorSpec> {
        self.registry().spec(name)
    }
}

/// What every page object is built from
#[derive(Debug, Clone)]
pub struct PageContext {
    actions: Actions,
    overrides: SelectorOverrides,
    layout: CheckoutLayout,
}

impl PageContext {
    /// Create a context
    #[must_use]
    pub fn new(actions: Actions, overrides: SelectorOverrides, layout: CheckoutLayout) -> Self {
        Self {
            actions,
            overrides,
            layout,
        }
    }

    /// Context for `driver` configured from `config`, loading its overrides
    /// file if one is named
    ///
    /// # Errors
    ///
    /// I/O or YAML errors reading the overrides.
    pub fn from_config(driver: Driver, config: &SuiteConfig) -> ShopResult<Self> {
        Ok(Self::new(
            Actions::new(driver, config.base_url.clone(), config.timeouts),
            config.overrides()?,
            config.checkout_layout,
        ))
    }

    /// The shared action facade
    #[must_use]
    pub const fn actions(&self) -> &Actions {
        &self.actions
    }

    /// Checkout layout
    #[must_use]
    pub const fn layout(&self) -> CheckoutLayout {
        self.layout
    }

    /// Build a registry and overlay this context's overrides
    ///
    /// # Errors
    ///
    /// [`crate::ShopError::Configuration`] for bad chains or overrides.
    pub fn registry(&self, builder: RegistryBuilder) -> ShopResult<SelectorRegistry> {
        builder.build()?.with_overrides(&self.overrides)
    }
}

/// Every page object over one session
#[derive(Debug, Clone)]
pub struct Pages {
    /// Site header
    pub header: Header,
    /// Home page
    pub home: HomePage,
    /// Product detail page
    pub product: ProductPage,
    /// Shopping cart
    pub cart: CartPage,
    /// Checkout
    pub checkout: CheckoutPage,
    /// Login
    pub login: LoginPage,
}

impl Pages {
    /// Build every page object
    ///
    /// # Errors
    ///
    /// [`crate::ShopError::Configuration`] for bad chains or overrides.
    pub fn new(ctx: &PageContext) -> ShopResult<Self> {
        Ok(Self {
            header: Header::new(ctx)?,
            home: HomePage::new(ctx)?,
            product: ProductPage::new(ctx)?,
            cart: CartPage::new(ctx)?,
            checkout: CheckoutPage::new(ctx)?,
            login: LoginPage::new(ctx)?,
        })
    }

    /// The shared action facade
    #[must_use]
    pub fn actions(&self) -> &Actions {
        self.header.actions()
    }

    /// Every registry, in navigation order
    #[must_use]
    pub fn registries(&self) -> Vec<&SelectorRegistry> {
        vec![
            self.header.registry(),
            self.home.registry(),
            self.product.registry(),
            self.cart.registry(),
            self.checkout.registry(),
            self.login.registry(),
        ]
    }
}

/// Default registries with `overrides` applied, without a session
///
/// # Errors
///
/// [`crate::ShopError::Configuration`] for bad chains or overrides.
pub fn registries(
    layout: CheckoutLayout,
    overrides: &SelectorOverrides,
) -> ShopResult<Vec<SelectorRegistry>> {
    [
        Header::selectors(),
        HomePage::selectors(),
        ProductPage::selectors(),
        CartPage::selectors(),
        CheckoutPage::selectors(layout),
        LoginPage::selectors(),
    ]
    .into_iter()
    .map(|builder| builder.build()?.with_overrides(overrides))
    .collect()
}

/// Digits of a badge or counter; empty text counts as zero
pub(crate) fn parse_count(element: &str, text: &str) -> ShopResult<u32> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Ok(0);
    }
    digits.parse().map_err(|_| {
        crate::ShopError::assertion(format!("{element} shows an unreadable count: '{text}'"))
    })
}
