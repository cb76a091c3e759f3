//! Shopping cart page.

use std::time::Duration;
use tracing::info;

use super::{PageContext, PageObject};
use crate::facade::{ActionOptions, Actions};
use crate::model::{CartLine, CartSnapshot, Price};
use crate::query::Resolution;
use crate::registry::{RegistryBuilder, SelectorRegistry};
use crate::result::{ShopError, ShopResult};
use crate::session::ElementHandle;

/// Shopping cart page
#[derive(Debug, Clone)]
pub struct CartPage {
    actions: Actions,
    registry: SelectorRegistry,
}

impl CartPage {
    /// Default selector chains
    #[must_use]
    pub fn selectors() -> RegistryBuilder {
        RegistryBuilder::new("cart")
            .with("title", r#".cart-page h1, .shopping-cart h1, h1:has-text("Cart")"#)
            .with(
                "rows",
                r#"tbody tr:has-text("$"), .cart-item, .cart-line, .shopping-cart-item"#,
            )
            .with(
                "row_for",
                r#"tbody tr:has-text("{name}"), .cart-item:has-text("{name}")"#,
            )
            .with("line_name", "h6, .product-name, .name")
            .with("line_price", r#".cart-item-price, .unit-price, td:has-text("$")"#)
            .with("line_total", ".cart-item-total, .line-total, td.total")
            .with(
                "line_quantity",
                r#"input[type="number"], .quantity input, input[name*="quantity"]"#,
            )
            .with("line_remove", ".remove, .btn-remove, .remove-item, button")
            .with(
                "summary_subtotal_label",
                r#"table:has-text("Order summary") td:has-text("Subtotal")"#,
            )
            .with("summary_row", "xpath=..")
            .with("summary_cell", "td")
            .with("subtotal", ".cart-subtotal, .subtotal-outer .amount, .subtotal")
            .with("total", ".cart-total, .total-outer .amount, .grand-total")
            .with(
                "checkout_button",
                r#"a:has-text("Checkout"), button:has-text("Checkout"), .checkout-link"#,
            )
            .with(
                "continue_shopping",
                r#"a:has-text("Continue Shopping"), .continue-shopping"#,
            )
            .with(
                "empty_message",
                "text=There are no items in this cart, .empty-cart, .cart-empty, .no-items",
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

    /// Navigate to the cart
    ///
    /// # Errors
    ///
    /// Navigation failures.
    pub async fn open(&self) -> ShopResult<()> {
        self.actions.navigate_to("/cart").await
    }

    /// Whether the cart heading is shown within the default timeout
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn is_loaded(&self) -> ShopResult<bool> {
        let title = self.element("title")?;
        Ok(self
            .actions
            .wait_for(title, self.actions.timeouts().default_timeout())
            .await?
            .is_found())
    }

    async fn rows(&self) -> ShopResult<Vec<ElementHandle>> {
        self.actions
            .resolve_all(self.element("rows")?, &ActionOptions::default())
            .await
    }

    async fn row(&self, name: &str) -> ShopResult<ElementHandle> {
        let spec = self.element("row_for")?.bind(name);
        self.actions
            .resolve(&spec, &ActionOptions::default())
            .await?
            .into_handle()
    }

    async fn read_price(&self, element: &str, options: &ActionOptions) -> ShopResult<Price> {
        let text = self
            .actions
            .read_text_with(self.element(element)?, options)
            .await?;
        Price::parse(&text)
    }

    async fn read_line(&self, row: ElementHandle) -> ShopResult<CartLine> {
        let within = ActionOptions::within(row);
        let name = self
            .actions
            .read_text_with(self.element("line_name")?, &within)
            .await?;
        let raw_quantity = self
            .actions
            .input_value_with(self.element("line_quantity")?, &within)
            .await?;
        let quantity = raw_quantity.trim().parse::<u32>().map_err(|_| {
            ShopError::assertion(format!("quantity for '{name}' is not a number: '{raw_quantity}'"))
        })?;
        Ok(CartLine {
            unit_price: self.read_price("line_price", &within).await?,
            line_total: self.read_price("line_total", &within).await?,
            name,
            quantity,
        })
    }

    /// Lines in display order; an empty cart yields an empty vec
    ///
    /// # Errors
    ///
    /// Session failures or unreadable prices and quantities.
    pub async fn line_items(&self) -> ShopResult<Vec<CartLine>> {
        let rows = self.rows().await?;
        let mut lines = Vec::with_capacity(rows.len());
        for row in rows {
            lines.push(self.read_line(row).await?);
        }
        Ok(lines)
    }

    /// Lines plus the summary totals (absent on an empty cart)
    ///
    /// # Errors
    ///
    /// See [`CartPage::line_items`].
    pub async fn snapshot(&self) -> ShopResult<CartSnapshot> {
        let lines = self.line_items().await?;
        let mut snapshot = CartSnapshot {
            lines,
            subtotal: None,
            total: None,
        };
        if !snapshot.lines.is_empty() {
            snapshot.subtotal = Some(self.subtotal().await?);
            snapshot.total = Some(self.total().await?);
        }
        Ok(snapshot)
    }

    /// Number of lines
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn item_count(&self) -> ShopResult<usize> {
        Ok(self.rows().await?.len())
    }

    /// Subtotal from the order summary: the cell next to the "Subtotal"
    /// label when the summary is a table, else the `subtotal` chain
    ///
    /// # Errors
    ///
    /// `NotFound` on an empty cart; unparseable amounts.
    pub async fn subtotal(&self) -> ShopResult<Price> {
        if let Some(text) = self.summary_table_subtotal().await? {
            return Price::parse(&text);
        }
        self.read_price("subtotal", &ActionOptions::default()).await
    }

    async fn summary_table_subtotal(&self) -> ShopResult<Option<String>> {
        let now = ActionOptions::timeout(Duration::ZERO);
        let label = self
            .actions
            .resolve(self.element("summary_subtotal_label")?, &now)
            .await?;
        let Resolution::Found { handle: label, .. } = label else {
            return Ok(None);
        };
        let row = self
            .actions
            .resolve(
                self.element("summary_row")?,
                &ActionOptions::within(label).with_timeout(Duration::ZERO),
            )
            .await?;
        let Resolution::Found { handle: row, .. } = row else {
            return Ok(None);
        };
        let cells = self
            .actions
            .read_texts(self.element("summary_cell")?, &ActionOptions::within(row))
            .await?;
        Ok(cells.into_iter().nth(1))
    }

    /// Order total from the order summary
    ///
    /// # Errors
    ///
    /// `NotFound` on an empty cart; unparseable amounts.
    pub async fn total(&self) -> ShopResult<Price> {
        self.read_price("total", &ActionOptions::default()).await
    }

    /// Change the quantity of the named line; zero removes it on most themes
    ///
    /// # Errors
    ///
    /// `NotFound` when no line has that name; action failures.
    pub async fn update_quantity(&self, name: &str, quantity: u32) -> ShopResult<()> {
        info!(product = name, quantity, "update cart quantity");
        let row = self.row(name).await?;
        self.actions
            .fill_with(
                self.element("line_quantity")?,
                &quantity.to_string(),
                &ActionOptions::within(row),
            )
            .await?;
        self.actions.wait_for_quiescence().await
    }

    /// Remove the named line
    ///
    /// # Errors
    ///
    /// `NotFound` when no line has that name; action failures.
    pub async fn remove_item(&self, name: &str) -> ShopResult<()> {
        info!(product = name, "remove from cart");
        let row = self.row(name).await?;
        self.actions
            .click_with(self.element("line_remove")?, &ActionOptions::within(row))
            .await
    }

    /// Remove whichever line is first
    ///
    /// # Errors
    ///
    /// `NotFound` on an empty cart; action failures.
    pub async fn remove_first(&self) -> ShopResult<()> {
        let rows = self.element("rows")?;
        let row = self
            .actions
            .resolve(rows, &ActionOptions::timeout(Duration::ZERO))
            .await?
            .into_handle()?;
        self.actions
            .click_with(self.element("line_remove")?, &ActionOptions::within(row))
            .await
    }

    /// Go to checkout
    ///
    /// # Errors
    ///
    /// Action failures.
    pub async fn click_checkout(&self) -> ShopResult<()> {
        self.actions.click(self.element("checkout_button")?).await
    }

    /// Back to the catalog
    ///
    /// # Errors
    ///
    /// Action failures.
    pub async fn continue_shopping(&self) -> ShopResult<()> {
        self.actions.click(self.element("continue_shopping")?).await
    }

    /// Whether the cart shows its empty state or has no lines
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn is_empty(&self) -> ShopResult<bool> {
        if self.actions.is_present(self.element("empty_message")?).await? {
            return Ok(true);
        }
        Ok(self.rows().await?.is_empty())
    }

    /// Empty-cart message, if shown
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn empty_message(&self) -> ShopResult<Option<String>> {
        let message = self.element("empty_message")?;
        if !self.actions.is_present(message).await? {
            return Ok(None);
        }
        self.actions.read_text(message).await.map(Some)
    }

    /// Whether the checkout button is shown
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn is_checkout_available(&self) -> ShopResult<bool> {
        self.actions.is_present(self.element("checkout_button")?).await
    }
}

impl PageObject for CartPage {
    fn url_pattern(&self) -> &str {
        "/cart"
    }

    fn registry(&self) -> &SelectorRegistry {
        &self.registry
    }

    fn actions(&self) -> &Actions {
        &self.actions
    }
}
