//! Product detail page.

use std::time::Duration;
use tracing::{debug, info};

use super::{PageContext, PageObject};
use crate::facade::{ActionOptions, Actions};
use crate::model::Price;
use crate::registry::{RegistryBuilder, SelectorRegistry};
use crate::result::{ShopError, ShopResult};

/// How long the add-to-cart confirmation may take to appear
const MODAL_GRACE: Duration = Duration::from_secs(2);

/// Product detail page
#[derive(Debug, Clone)]
pub struct ProductPage {
    actions: Actions,
    registry: SelectorRegistry,
}

impl ProductPage {
    /// Default selector chains
    #[must_use]
    pub fn selectors() -> RegistryBuilder {
        RegistryBuilder::new("product")
            .with("name", "h1, .product-detail-name, .product-name")
            .with("price", ".product-detail-price .amount, .product-price, .price")
            .with(
                "description",
                ".product-detail-description, .product-description, .description",
            )
            .with("stock_status", ".stock-status, .in-stock, .availability")
            .with(
                "quantity",
                r#"input#Quantity, input[name="quantity"], .quantity input"#,
            )
            .with(
                "increase",
                r#".quantity button:has-text("+"), button:has-text("+")"#,
            )
            .with(
                "decrease",
                r#".quantity button:has-text("-"), button:has-text("-")"#,
            )
            .with(
                "add_to_cart",
                r#".btn-add-cart, .add-to-cart, button:has-text("Add to cart")"#,
            )
            .with(
                "continue_shopping",
                r#".modal button:has-text("Continue shopping"), button:has-text("Continue shopping")"#,
            )
    }

    /// Build from a page context
    ///
    /// # Errors
    ///
    /// Configuration errors from the registry.
    pub fn new(ctx: &PageContext) -> ShopResult<Self> {
        Ok(Self {
            actions: ctx.actions().clone(),
            registry: ctx.registry(Self::selectors())?,
        })
    }

    /// Open a product by URL slug
    ///
    /// # Errors
    ///
    /// Navigation failures (an unknown slug is a 404).
    pub async fn open(&self, slug: &str) -> ShopResult<()> {
        self.actions.navigate_to(&format!("/{slug}")).await
    }

    /// Whether the product name is shown within the default timeout
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn is_loaded(&self) -> ShopResult<bool> {
        let name = self.element("name")?;
        Ok(self
            .actions
            .wait_for(name, self.actions.timeouts().default_timeout())
            .await?
            .is_found())
    }

    /// Product name
    ///
    /// # Errors
    ///
    /// `NotFound` or session failures.
    pub async fn name(&self) -> ShopResult<String> {
        self.actions.read_text(self.element("name")?).await
    }

    /// Unit price
    ///
    /// # Errors
    ///
    /// `NotFound`, session failures, or an unparseable amount.
    pub async fn price(&self) -> ShopResult<Price> {
        Price::parse(&self.actions.read_text(self.element("price")?).await?)
    }

    /// Description text
    ///
    /// # Errors
    ///
    /// `NotFound` or session failures.
    pub async fn description(&self) -> ShopResult<String> {
        self.actions.read_text(self.element("description")?).await
    }

    /// Availability text ("In stock")
    ///
    /// # Errors
    ///
    /// `NotFound` or session failures.
    pub async fn stock_status(&self) -> ShopResult<String> {
        self.actions.read_text(self.element("stock_status")?).await
    }

    /// Quantity currently in the quantity box
    ///
    /// # Errors
    ///
    /// `NotFound`, session failures, or a non-numeric value.
    pub async fn quantity(&self) -> ShopResult<u32> {
        let raw = self.actions.input_value(self.element("quantity")?).await?;
        raw.trim()
            .parse()
            .map_err(|_| ShopError::assertion(format!("quantity box holds '{raw}'")))
    }

    /// Type a quantity
    ///
    /// # Errors
    ///
    /// Action failures.
    pub async fn set_quantity(&self, quantity: u32) -> ShopResult<()> {
        self.actions
            .fill(self.element("quantity")?, &quantity.to_string())
            .await
    }

    /// Click "+"
    ///
    /// # Errors
    ///
    /// Action failures.
    pub async fn increase_quantity(&self) -> ShopResult<()> {
        self.actions.click(self.element("increase")?).await
    }

    /// Click "-"
    ///
    /// # Errors
    ///
    /// Action failures.
    pub async fn decrease_quantity(&self) -> ShopResult<()> {
        self.actions.click(self.element("decrease")?).await
    }

    /// Add to cart, dismissing the confirmation modal if one opens
    ///
    /// # Errors
    ///
    /// `Disabled` for an out-of-stock product; action failures.
    pub async fn add_to_cart(&self) -> ShopResult<()> {
        info!("add to cart");
        self.actions.click(self.element("add_to_cart")?).await?;

        let dismiss = self.element("continue_shopping")?;
        if self
            .actions
            .is_present_with(dismiss, &ActionOptions::timeout(MODAL_GRACE))
            .await?
        {
            debug!("dismissing add-to-cart modal");
            self.actions.click(dismiss).await?;
            let _ = self
                .actions
                .wait_until_gone(dismiss, self.actions.timeouts().default_timeout())
                .await?;
        }
        Ok(())
    }

    /// Whether the add-to-cart button is shown
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn is_add_to_cart_visible(&self) -> ShopResult<bool> {
        self.actions.is_present(self.element("add_to_cart")?).await
    }

    /// Browser back
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn go_back(&self) -> ShopResult<()> {
        self.actions.go_back().await
    }
}

impl PageObject for ProductPage {
    fn url_pattern(&self) -> &str {
        "/{slug}"
    }

    fn registry(&self) -> &SelectorRegistry {
        &self.registry
    }

    fn actions(&self) -> &Actions {
        &self.actions
    }
}
