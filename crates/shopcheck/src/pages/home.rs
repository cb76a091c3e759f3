//! Home page: product grid, category navigation and the global data reset.

use tracing::info;

use super::{CartPage, Header, PageContext, PageObject};
use crate::facade::{ActionOptions, Actions};
use crate::model::{Category, Price, ProductCard};
use crate::registry::{RegistryBuilder, SelectorRegistry};
use crate::result::{ShopError, ShopResult};

/// Upper bound on remove clicks while emptying the cart
const MAX_RESET_REMOVALS: usize = 50;

/// Storefront home page
#[derive(Debug, Clone)]
pub struct HomePage {
    actions: Actions,
    registry: SelectorRegistry,
    header: Header,
    cart: CartPage,
}

impl HomePage {
    /// Default selector chains
    #[must_use]
    pub fn selectors() -> RegistryBuilder {
        RegistryBuilder::new("home")
            .with("content", ".container, main, .main-content")
            .with("logo", ".logo a, .site-logo")
            .with("category_link", r#".nav-link:has-text("{name}"), a:has-text("{name}")"#)
            .with(
                "product_item",
                ".product-item, .product-item-inner, .product-box, .product-box-inner",
            )
            .with("product_title", "h4 a, h3 a, .product-title a, .name a")
            .with("product_price", ".price-outer .amount, .price, .product-price")
            .with("product_add", r#".add-to-cart, button:has-text("Add")"#)
            .with(
                "product_link",
                r#"h4:has-text("{name}") a, h3:has-text("{name}") a, a:has-text("{name}")"#,
            )
    }

    /// Build from a page context
    ///
    /// # Errors
    ///
    /// Configuration errors from the registries.
    pub fn new(ctx: &PageContext) -> ShopResult<Self> {
        Ok(Self {
            actions: ctx.actions().clone(),
            registry: ctx.registry(Self::selectors())?,
            header: Header::new(ctx)?,
            cart: CartPage::new(ctx)?,
        })
    }

    /// Navigate to the home page
    ///
    /// # Errors
    ///
    /// Navigation failures.
    pub async fn open(&self) -> ShopResult<()> {
        self.actions.navigate_to("/").await
    }

    /// Document title
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn title(&self) -> ShopResult<String> {
        self.actions.title().await
    }

    /// Whether the main content is shown within the default timeout
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn is_loaded(&self) -> ShopResult<bool> {
        let content = self.element("content")?;
        Ok(self
            .actions
            .wait_for(content, self.actions.timeouts().default_timeout())
            .await?
            .is_found())
    }

    /// Whether the logo is shown
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn is_logo_visible(&self) -> ShopResult<bool> {
        self.actions.is_present(self.element("logo")?).await
    }

    /// Open a category from the navigation bar
    ///
    /// # Errors
    ///
    /// Action failures.
    pub async fn click_category(&self, category: Category) -> ShopResult<()> {
        info!(category = category.label(), "open category");
        let link = self.element("category_link")?.bind(category.label());
        self.actions.click(&link).await
    }

    /// Units in the cart according to the header badge
    ///
    /// # Errors
    ///
    /// See [`Header::cart_count`].
    pub async fn cart_badge(&self) -> ShopResult<u32> {
        self.header.cart_count().await
    }

    /// Product cards in grid order; empty when the grid is empty
    ///
    /// # Errors
    ///
    /// Session failures or an unparseable price.
    pub async fn products(&self) -> ShopResult<Vec<ProductCard>> {
        let items = self
            .actions
            .resolve_all(self.element("product_item")?, &ActionOptions::default())
            .await?;
        let title = self.element("product_title")?;
        let price = self.element("product_price")?;
        let add = self.element("product_add")?;

        let mut cards = Vec::with_capacity(items.len());
        for item in items {
            let within = ActionOptions::within(item);
            let name = self.actions.read_text_with(title, &within).await?;
            let price = if self.actions.is_present_with(price, &within).await? {
                Some(Price::parse(&self.actions.read_text_with(price, &within).await?)?)
            } else {
                None
            };
            let has_add_to_cart = self.actions.is_present_with(add, &within).await?;
            cards.push(ProductCard {
                name,
                price,
                has_add_to_cart,
            });
        }
        Ok(cards)
    }

    /// Open a product from the grid by name
    ///
    /// # Errors
    ///
    /// Action failures.
    pub async fn click_product(&self, name: &str) -> ShopResult<()> {
        let link = self.element("product_link")?.bind(name);
        self.actions.click(&link).await
    }

    /// Search the catalog through the header
    ///
    /// # Errors
    ///
    /// See [`Header::search`].
    pub async fn search(&self, keyword: &str) -> ShopResult<()> {
        self.header.search(keyword).await
    }

    /// Put the storefront in a known state: empty the cart, then open the
    /// category page and check it rendered.
    ///
    /// # Errors
    ///
    /// [`ShopError::Fixture`] when the cart will not empty or the category
    /// page does not load; action failures.
    pub async fn reset_data(&self, category: Category) -> ShopResult<()> {
        info!(category = category.label(), "resetting storefront data");
        self.cart.open().await?;
        let mut removed = 0;
        while !self.cart.is_empty().await? {
            if removed == MAX_RESET_REMOVALS {
                return Err(ShopError::Fixture {
                    message: format!("cart still not empty after {removed} removals"),
                });
            }
            self.cart.remove_first().await?;
            removed += 1;
        }
        info!(removed, "cart emptied");

        self.open().await?;
        self.click_category(category).await?;
        if !self.is_loaded().await? {
            return Err(ShopError::Fixture {
                message: format!("{} page did not load", category.label()),
            });
        }
        Ok(())
    }
}

impl PageObject for HomePage {
    fn url_pattern(&self) -> &str {
        "/"
    }

    fn registry(&self) -> &SelectorRegistry {
        &self.registry
    }

    fn actions(&self) -> &Actions {
        &self.actions
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Timeouts;
    use crate::mock::{MockSession, Storefront, DEMO_ORIGIN};
    use crate::model::CheckoutLayout;
    use crate::registry::SelectorOverrides;
    use crate::session::Driver;
    use std::sync::Arc;

    fn home(site: Storefront) -> HomePage {
        let session = Arc::new(MockSession::with_site(DEMO_ORIGIN, site));
        let actions = Actions::new(Driver::new(session), DEMO_ORIGIN, Timeouts::default());
        let ctx = PageContext::new(actions, SelectorOverrides::default(), CheckoutLayout::MultiStep);
        HomePage::new(&ctx).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_products_read_the_grid() {
        let page = home(Storefront::default());
        page.open().await.unwrap();
        assert!(page.is_loaded().await.unwrap());
        assert!(page.is_logo_visible().await.unwrap());
        let cards = page.products().await.unwrap();
        assert_eq!(cards.len(), 8);
        assert_eq!(cards[0].name, "iPhone 6s 16GB");
        assert_eq!(cards[0].price, Some(Price::from_cents(54_900)));
        let sold_out = cards.iter().find(|c| c.name == "iPhone 6 Plus 64GB").unwrap();
        assert!(!sold_out.has_add_to_cart);
    }

    #[tokio::test(start_paused = true)]
    async fn test_category_and_product_navigation() {
        let page = home(Storefront::default());
        page.open().await.unwrap();
        page.click_category(Category::Computers).await.unwrap();
        assert!(page.actions.current_url().await.unwrap().ends_with("/computers"));
        let names: Vec<String> = page.products().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Dell XPS 13", "Apple MacBook Air 13"]);

        page.click_product("Dell XPS 13").await.unwrap();
        assert!(page.actions.current_url().await.unwrap().ends_with("/dell-xps-13"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_data_empties_cart() {
        let page = home(
            Storefront::default()
                .with_cart_line("iphone-6s-16gb", 1)
                .with_cart_line("dell-xps-13", 3),
        );
        page.reset_data(Category::Phones).await.unwrap();
        assert_eq!(page.cart_badge().await.unwrap(), 0);
        assert!(page.actions.current_url().await.unwrap().ends_with("/phones"));
    }
}
