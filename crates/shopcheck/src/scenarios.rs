//! Storefront scenarios.
//!
//! Each scenario is a plain async function over a fresh [`Pages`] set and
//! the suite's [`ScenarioData`]. Assertions fail with
//! [`crate::ShopError::Assertion`]; page-object failures propagate as-is.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;

use crate::assertion::Assertion;
use crate::model::{Address, Category, Credentials, PaymentMethod};
use crate::pages::Pages;
use crate::result::ShopResult;
use crate::runner::step;
use crate::testdata::{credentials_from_env, CheckoutData, ProductQuantity, TestData};

/// Product every cart scenario starts from
pub const PRIMARY_PRODUCT: &str = "iphone-6s-16gb";
/// Second product for multi-line carts
pub const SECONDARY_PRODUCT: &str = "samsung-galaxy-a5";

/// Parameters shared by all scenarios
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioData {
    /// Checkout address and payment
    pub checkout: CheckoutData,
    /// Rows for the add-with-quantity scenario
    pub products: Vec<ProductQuantity>,
    /// Login credentials
    pub credentials: Credentials,
}

impl Default for ScenarioData {
    fn default() -> Self {
        Self {
            checkout: CheckoutData::default(),
            products: ProductQuantity::defaults(),
            credentials: credentials_from_env(|_| None),
        }
    }
}

impl ScenarioData {
    /// Load `checkout` and `products` from `data`, falling back to the
    /// built-in sets; credentials come from the environment.
    ///
    /// # Errors
    ///
    /// [`crate::ShopError::TestData`] for a file that exists but does not
    /// parse.
    pub fn load(data: &TestData) -> ShopResult<Self> {
        Ok(Self {
            checkout: data.load_or("checkout", CheckoutData::default())?,
            products: data.load_or("products", ProductQuantity::defaults())?,
            credentials: credentials_from_env(|k| std::env::var(k).ok()),
        })
    }
}

/// Signature of a scenario body
pub type ScenarioFn = for<'a> fn(&'a Pages, &'a ScenarioData) -> BoxFuture<'a, ShopResult<()>>;

/// A named scenario
#[derive(Clone, Copy)]
pub struct Scenario {
    /// Unique name, used for filtering and reports
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
    body: ScenarioFn,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario").field("name", &self.name).finish()
    }
}

impl Scenario {
    /// Create a scenario
    #[must_use]
    pub const fn new(name: &'static str, description: &'static str, body: ScenarioFn) -> Self {
        Self {
            name,
            description,
            body,
        }
    }

    /// Run the body
    pub fn run<'a>(&self, pages: &'a Pages, data: &'a ScenarioData) -> BoxFuture<'a, ShopResult<()>> {
        (self.body)(pages, data)
    }
}

/// Every storefront scenario in suite order
#[must_use]
pub fn all() -> Vec<Scenario> {
    vec![
        Scenario::new(
            "add_to_cart_workflow",
            "search, open a product, add it and land on the cart",
            add_to_cart_workflow,
        ),
        Scenario::new(
            "navigation_through_pages",
            "header links reach cart, home and login",
            navigation_through_pages,
        ),
        Scenario::new(
            "add_product_from_product_page",
            "adding from the detail page yields a priced cart line",
            add_product_from_product_page,
        ),
        Scenario::new(
            "add_product_from_category",
            "add the first product of a category listing",
            add_product_from_category,
        ),
        Scenario::new("cart_page_loads", "cart renders with or without items", cart_page_loads),
        Scenario::new("update_quantity", "changing a line quantity updates its total", update_quantity),
        Scenario::new("remove_product", "removing a line shrinks the cart", remove_product),
        Scenario::new("checkout_from_cart", "the cart leads to checkout", checkout_from_cart),
        Scenario::new(
            "cart_state_with_two_products",
            "two products produce two cart lines",
            cart_state_with_two_products,
        ),
        Scenario::new(
            "add_product_with_quantity",
            "data-driven quantities reach the cart",
            add_product_with_quantity,
        ),
        Scenario::new(
            "incomplete_address_blocks_payment",
            "a partial billing address keeps payment locked",
            incomplete_address_blocks_payment,
        ),
        Scenario::new(
            "complete_checkout_cod",
            "full checkout with cash on delivery yields an order number",
            complete_checkout_cod,
        ),
        Scenario::new(
            "login_page_shows_error",
            "a wrong password is rejected with a message",
            login_page_shows_error,
        ),
    ]
}

/// Scenarios whose name contains `filter`; all of them for `None`
#[must_use]
pub fn select(filter: Option<&str>) -> Vec<Scenario> {
    all()
        .into_iter()
        .filter(|s| filter.map_or(true, |f| s.name.contains(f)))
        .collect()
}

async fn add_product(pages: &Pages, slug: &str) -> ShopResult<()> {
    step(&format!("add {slug} to cart"));
    pages.product.open(slug).await?;
    pages.product.add_to_cart().await
}

async fn expect_url(pages: &Pages, fragment: &str) -> ShopResult<()> {
    let url = pages.actions().current_url().await?;
    Assertion::contains(&url, fragment).context("current url").into_result()
}

fn add_to_cart_workflow<'a>(p: &'a Pages, _: &'a ScenarioData) -> BoxFuture<'a, ShopResult<()>> {
    async move {
        step("open home page");
        p.home.open().await?;
        step("search for iphone");
        p.home.search("iphone").await?;
        step("open first iPhone");
        p.home.click_product("iPhone").await?;
        if p.product.is_add_to_cart_visible().await? {
            step("add to cart");
            p.product.add_to_cart().await?;
        }
        step("open cart");
        p.header.click_cart().await?;
        expect_url(p, "cart").await?;
        Assertion::at_least(&p.cart.item_count().await?, &1).into_result()
    }
    .boxed()
}

fn navigation_through_pages<'a>(p: &'a Pages, _: &'a ScenarioData) -> BoxFuture<'a, ShopResult<()>> {
    async move {
        p.home.open().await?;
        step("header cart link");
        p.header.click_cart().await?;
        expect_url(p, "cart").await?;
        step("logo back to home");
        p.header.click_logo().await?;
        let home = p.actions().current_url().await?;
        Assertion::is_true(
            home.trim_end_matches('/') == p.actions().base_url().trim_end_matches('/'),
            &format!("logo led to {home}"),
        )
        .into_result()?;
        step("login link");
        p.header.click_login().await?;
        expect_url(p, "/login").await
    }
    .boxed()
}

fn add_product_from_product_page<'a>(
    p: &'a Pages,
    _: &'a ScenarioData,
) -> BoxFuture<'a, ShopResult<()>> {
    async move {
        add_product(p, PRIMARY_PRODUCT).await?;
        p.cart.open().await?;
        let snapshot = p.cart.snapshot().await?;
        Assertion::at_least(&snapshot.lines.len(), &1)
            .context("cart lines")
            .into_result()?;
        let line = &snapshot.lines[0];
        Assertion::is_false(line.line_total.is_zero(), "line total is zero").into_result()?;
        Assertion::is_some(&snapshot.total).context("cart total").into_result()
    }
    .boxed()
}

fn add_product_from_category<'a>(p: &'a Pages, _: &'a ScenarioData) -> BoxFuture<'a, ShopResult<()>> {
    async move {
        p.home.open().await?;
        step("open Computers");
        p.home.click_category(Category::Computers).await?;
        let products = p.home.products().await?;
        let Some(card) = products.iter().find(|c| c.has_add_to_cart) else {
            return Assertion::is_true(false, "no purchasable product in Computers").into_result();
        };
        step(&format!("open {}", card.name));
        p.home.click_product(&card.name).await?;
        p.product.add_to_cart().await?;
        p.cart.open().await?;
        expect_url(p, "cart").await?;
        let lines = p.cart.line_items().await?;
        Assertion::is_true(
            lines.iter().any(|l| l.name.contains(&card.name)),
            &format!("{} missing from cart", card.name),
        )
        .into_result()
    }
    .boxed()
}

fn cart_page_loads<'a>(p: &'a Pages, _: &'a ScenarioData) -> BoxFuture<'a, ShopResult<()>> {
    async move {
        p.cart.open().await?;
        expect_url(p, "/cart").await?;
        Assertion::is_true(p.cart.is_loaded().await?, "cart heading not shown").into_result()?;
        if p.cart.is_empty().await? {
            let message = p.cart.empty_message().await?;
            Assertion::is_some(&message).context("empty cart message").into_result()?;
            Assertion::equals(&0, &p.header.cart_count().await?)
                .context("badge on empty cart")
                .into_result()
        } else {
            Assertion::is_true(p.cart.is_checkout_available().await?, "checkout button missing")
                .into_result()
        }
    }
    .boxed()
}

fn update_quantity<'a>(p: &'a Pages, _: &'a ScenarioData) -> BoxFuture<'a, ShopResult<()>> {
    async move {
        add_product(p, SECONDARY_PRODUCT).await?;
        p.cart.open().await?;
        let lines = p.cart.line_items().await?;
        let Some(first) = lines.first() else {
            return Assertion::is_true(false, "cart is empty").into_result();
        };
        step(&format!("set {} quantity to 2", first.name));
        p.cart.update_quantity(&first.name, 2).await?;
        let snapshot = p.cart.snapshot().await?;
        let Some(line) = snapshot.line(&first.name) else {
            return Assertion::is_true(false, "line vanished after update").into_result();
        };
        Assertion::equals(&2, &line.quantity).context("quantity").into_result()?;
        Assertion::equals(&line.unit_price.times(2), &line.line_total)
            .context("line total")
            .into_result()
    }
    .boxed()
}

fn remove_product<'a>(p: &'a Pages, _: &'a ScenarioData) -> BoxFuture<'a, ShopResult<()>> {
    async move {
        add_product(p, PRIMARY_PRODUCT).await?;
        p.cart.open().await?;
        let before = p.cart.line_items().await?;
        let Some(first) = before.first() else {
            return Assertion::is_true(false, "cart is empty").into_result();
        };
        step(&format!("remove {}", first.name));
        p.cart.remove_item(&first.name).await?;
        Assertion::equals(&(before.len() - 1), &p.cart.item_count().await?)
            .context("lines after removal")
            .into_result()?;
        expect_url(p, p.actions().base_url().trim_end_matches('/')).await
    }
    .boxed()
}

fn checkout_from_cart<'a>(p: &'a Pages, _: &'a ScenarioData) -> BoxFuture<'a, ShopResult<()>> {
    async move {
        add_product(p, PRIMARY_PRODUCT).await?;
        p.header.click_cart().await?;
        expect_url(p, "/cart").await?;
        Assertion::at_least(&p.cart.item_count().await?, &1).into_result()?;
        Assertion::is_true(p.cart.is_checkout_available().await?, "checkout button missing")
            .into_result()?;
        step("proceed to checkout");
        p.cart.click_checkout().await?;
        Assertion::is_true(p.checkout.is_checkout_page().await?, "checkout page not shown")
            .into_result()
    }
    .boxed()
}

fn cart_state_with_two_products<'a>(
    p: &'a Pages,
    _: &'a ScenarioData,
) -> BoxFuture<'a, ShopResult<()>> {
    async move {
        add_product(p, PRIMARY_PRODUCT).await?;
        add_product(p, SECONDARY_PRODUCT).await?;
        p.header.click_cart().await?;
        let snapshot = p.cart.snapshot().await?;
        Assertion::at_least(&snapshot.lines.len(), &1)
            .context("cart lines")
            .into_result()?;
        Assertion::equals(&snapshot.unit_count(), &p.header.cart_count().await?)
            .context("badge vs lines")
            .into_result()
    }
    .boxed()
}

fn add_product_with_quantity<'a>(p: &'a Pages, d: &'a ScenarioData) -> BoxFuture<'a, ShopResult<()>> {
    async move {
        let mut expected = Vec::with_capacity(d.products.len());
        for row in &d.products {
            step(&format!("add {} x{}", row.slug, row.quantity));
            p.product.open(&row.slug).await?;
            let name = p.product.name().await?;
            p.product.set_quantity(row.quantity).await?;
            p.product.add_to_cart().await?;
            expected.push((name, row.quantity));
        }
        p.header.click_cart().await?;
        let snapshot = p.cart.snapshot().await?;
        for (name, quantity) in expected {
            let Some(line) = snapshot.line(&name) else {
                return Assertion::is_true(false, &format!("{name} missing from cart")).into_result();
            };
            Assertion::at_least(&line.quantity, &quantity)
                .context(&name)
                .into_result()?;
        }
        Ok(())
    }
    .boxed()
}

fn incomplete_address_blocks_payment<'a>(
    p: &'a Pages,
    d: &'a ScenarioData,
) -> BoxFuture<'a, ShopResult<()>> {
    async move {
        add_product(p, PRIMARY_PRODUCT).await?;
        p.checkout.open().await?;
        let partial = Address {
            first_name: d.checkout.address.first_name.clone(),
            ..Address::default()
        };
        step("fill partial billing address");
        p.checkout.fill_billing_address(&partial).await?;
        Assertion::is_false(
            p.checkout.can_proceed_to_payment().await?,
            "payment reachable with an incomplete address",
        )
        .into_result()?;
        Assertion::is_false(p.checkout.is_order_complete().await?, "order completed")
            .into_result()
    }
    .boxed()
}

fn complete_checkout_cod<'a>(p: &'a Pages, d: &'a ScenarioData) -> BoxFuture<'a, ShopResult<()>> {
    async move {
        add_product(p, PRIMARY_PRODUCT).await?;
        p.checkout.open().await?;
        let order = p
            .checkout
            .complete_checkout(&d.checkout.address, PaymentMethod::Cod, None)
            .await?;
        Assertion::is_false(order.order_id.trim().is_empty(), "empty order number").into_result()
    }
    .boxed()
}

fn login_page_shows_error<'a>(p: &'a Pages, d: &'a ScenarioData) -> BoxFuture<'a, ShopResult<()>> {
    async move {
        p.login.open().await?;
        let wrong = Credentials::new(d.credentials.email.clone(), "not-the-password");
        step("log in with a wrong password");
        p.login.login(&wrong).await?;
        Assertion::is_true(p.login.is_error_visible().await?, "no login error shown")
            .into_result()?;
        Assertion::is_false(p.header.is_logged_in().await?, "logged in with a wrong password")
            .into_result()
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = all().iter().map(|s| s.name).collect();
        assert_eq!(names.len(), 13);
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 13);
    }

    #[test]
    fn test_select_filters_by_substring() {
        let cart: Vec<&str> = select(Some("cart")).iter().map(|s| s.name).collect();
        assert!(cart.contains(&"cart_page_loads"));
        assert!(cart.contains(&"checkout_from_cart"));
        assert!(!cart.contains(&"login_page_shows_error"));
        assert_eq!(select(None).len(), 13);
        assert!(select(Some("no-such")).is_empty());
    }

    #[test]
    fn test_default_data() {
        let data = ScenarioData::default();
        assert_eq!(data.products.len(), 2);
        assert_eq!(data.checkout.payment_method, PaymentMethod::Cod);
        assert_eq!(data.credentials.email, "admin@simplcommerce.com");
    }
}
