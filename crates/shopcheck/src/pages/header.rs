//! Site header: logo, search, account links and the cart badge.

use tracing::{info, warn};

use super::{parse_count, PageContext, PageObject};
use crate::facade::Actions;
use crate::registry::{RegistryBuilder, SelectorRegistry};
use crate::result::ShopResult;

/// Header component shown on every storefront page
#[derive(Debug, Clone)]
pub struct Header {
    actions: Actions,
    registry: SelectorRegistry,
}

impl Header {
    /// Default selector chains
    #[must_use]
    pub fn selectors() -> RegistryBuilder {
        RegistryBuilder::new("header")
            .with("logo", ".logo a, .site-logo a, .header-logo a")
            .with("login_link", r#"a[href="/login"], a:has-text("Log in")"#)
            .with("register_link", r#"a[href="/register"], a:has-text("Register")"#)
            .with("search_input", r#"#Query, input[name="Query"], .search-input"#)
            .with("search_button", r#".search-btn, button[type="submit"]"#)
            .with("cart_link", r#"a[href*="cart"], .cart-btn, .cart-icon, .shopping-cart"#)
            .with("cart_badge", ".badge-open, .cart-badge, .badge")
            .with("user_menu", ".user-menu, .logged-in")
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

    /// Click the logo (back to home)
    ///
    /// # Errors
    ///
    /// Action failures.
    pub async fn click_logo(&self) -> ShopResult<()> {
        self.actions.click(self.element("logo")?).await
    }

    /// Open the login page
    ///
    /// # Errors
    ///
    /// Action failures.
    pub async fn click_login(&self) -> ShopResult<()> {
        self.actions.click(self.element("login_link")?).await
    }

    /// Open the registration page
    ///
    /// # Errors
    ///
    /// Action failures.
    pub async fn click_register(&self) -> ShopResult<()> {
        self.actions.click(self.element("register_link")?).await
    }

    /// Open the cart
    ///
    /// # Errors
    ///
    /// Action failures.
    pub async fn click_cart(&self) -> ShopResult<()> {
        self.actions.click(self.element("cart_link")?).await
    }

    /// Search the catalog.
    ///
    /// Submits with the search button, or with Enter when the theme has no
    /// button.
    ///
    /// # Errors
    ///
    /// Action failures.
    pub async fn search(&self, keyword: &str) -> ShopResult<()> {
        info!(keyword, "search");
        let input = self.element("search_input")?;
        self.actions.fill(input, keyword).await?;
        let button = self.element("search_button")?;
        if self.actions.is_present(button).await? {
            self.actions.click(button).await
        } else {
            warn!("no search button, submitting with Enter");
            self.actions.press_key(input, "Enter").await
        }
    }

    /// Units in the cart as shown by the badge; a missing badge is zero
    ///
    /// # Errors
    ///
    /// Session failures or an unreadable badge.
    pub async fn cart_count(&self) -> ShopResult<u32> {
        let badge = self.element("cart_badge")?;
        if !self.actions.is_present(badge).await? {
            return Ok(0);
        }
        let text = self.actions.read_text(badge).await?;
        parse_count(badge.name(), &text)
    }

    /// Whether the account menu is shown
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn is_logged_in(&self) -> ShopResult<bool> {
        self.actions.is_present(self.element("user_menu")?).await
    }

    /// Whether the cart link is shown
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn is_cart_visible(&self) -> ShopResult<bool> {
        self.actions.is_present(self.element("cart_link")?).await
    }

    /// Current URL
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn page_url(&self) -> ShopResult<String> {
        self.actions.current_url().await
    }
}

impl PageObject for Header {
    fn url_pattern(&self) -> &str {
        ""
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
    use crate::mock::{MockElement, MockSession, StaticSite, Storefront, DEMO_ORIGIN};
    use crate::model::CheckoutLayout;
    use crate::registry::SelectorOverrides;
    use crate::session::Driver;
    use std::sync::Arc;

    fn header_over(session: MockSession, origin: &str) -> (Arc<MockSession>, Header) {
        let session = Arc::new(session);
        let actions = Actions::new(Driver::new(session.clone()), origin, Timeouts::default());
        let ctx = PageContext::new(actions, SelectorOverrides::default(), CheckoutLayout::MultiStep);
        (session, Header::new(&ctx).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_with_button() {
        let (session, header) = header_over(
            MockSession::with_site(DEMO_ORIGIN, Storefront::default()),
            DEMO_ORIGIN,
        );
        header.actions.navigate_to("/").await.unwrap();
        header.search("iphone").await.unwrap();
        assert_eq!(
            header.page_url().await.unwrap(),
            "https://demo.simplcommerce.com/search?query=iphone"
        );
        assert!(!session.was_called("press"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_falls_back_to_enter() {
        let site = StaticSite::new("No button").with(
            MockElement::new("q", "input")
                .matching("#Query")
                .navigates_to("/search?query=watch"),
        );
        let (session, header) = header_over(MockSession::loaded(site), MockSession::DEFAULT_ORIGIN);
        header.search("watch").await.unwrap();
        assert!(session.was_called("press"));
        assert_eq!(
            header.page_url().await.unwrap(),
            "https://shop.test/search?query=watch"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cart_count_reads_badge() {
        let (_, header) = header_over(
            MockSession::with_site(
                DEMO_ORIGIN,
                Storefront::default().with_cart_line("lumia-950-xl", 2),
            ),
            DEMO_ORIGIN,
        );
        header.actions.navigate_to("/").await.unwrap();
        assert_eq!(header.cart_count().await.unwrap(), 2);
        assert!(header.is_cart_visible().await.unwrap());
        assert!(!header.is_logged_in().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_badge_counts_zero() {
        let (_, header) = header_over(MockSession::loaded(StaticSite::default()), MockSession::DEFAULT_ORIGIN);
        assert_eq!(header.cart_count().await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_logo_resolves_via_fallback() {
        let (_, header) = header_over(
            MockSession::with_site(DEMO_ORIGIN, Storefront::default()),
            DEMO_ORIGIN,
        );
        header.actions.navigate_to("/cart").await.unwrap();
        header.click_logo().await.unwrap();
        assert_eq!(header.page_url().await.unwrap(), "https://demo.simplcommerce.com/");
    }
}
