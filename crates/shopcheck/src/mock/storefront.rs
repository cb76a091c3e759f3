//! Simulated SimplCommerce storefront.
//!
//! Renders the pages the suite visits (home, search, categories, product
//! detail, cart, checkout, login) with markup shaped like the live demo,
//! including its quirks: the logo only answers to `.site-logo a`, the cart
//! heading only to `h1:has-text("Cart")`, and the add-to-cart button opens a
//! "Continue shopping" modal. Cart, checkout and login state live in memory.

use std::collections::BTreeMap;

use super::dom::{MockElement, MockPage};
use super::session::{MockSite, SiteEffect};
use crate::model::{Category, CheckoutLayout, PaymentMethod, Price};

/// Demo origin
pub const DEMO_ORIGIN: &str = "https://demo.simplcommerce.com";

/// Credentials accepted by the simulated login
pub const DEMO_ADMIN: (&str, &str) = ("admin@simplcommerce.com", "1qazZAQ!");

const BILLING_FIELDS: [(&str, &str, bool); 11] = [
    ("FirstName", "First name", true),
    ("LastName", "Last name", true),
    ("Email", "Email", true),
    ("Company", "Company", false),
    ("CountryId", "Country", true),
    ("StateProvinceId", "State / province", false),
    ("City", "City", true),
    ("Address1", "Address", true),
    ("Address2", "Address 2", false),
    ("ZipPostalCode", "Zip / postal code", true),
    ("PhoneNumber", "Phone number", true),
];

const CARD_FIELDS: [&str; 5] = [
    "CardholderName",
    "CardNumber",
    "CardCode",
    "ExpireMonth",
    "ExpireYear",
];

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    /// URL slug, also the product page path
    pub slug: String,
    /// Display name
    pub name: String,
    /// Category
    pub category: Category,
    /// Unit price
    pub price: Price,
    /// Whether it can be added to the cart
    pub in_stock: bool,
}

impl CatalogItem {
    fn new(slug: &str, name: &str, category: Category, cents: i64, in_stock: bool) -> Self {
        Self {
            slug: slug.to_string(),
            name: name.to_string(),
            category,
            price: Price::from_cents(cents),
            in_stock,
        }
    }
}

/// Catalog seeded like the public demo
#[must_use]
pub fn demo_catalog() -> Vec<CatalogItem> {
    vec![
        CatalogItem::new("iphone-6s-16gb", "iPhone 6s 16GB", Category::Phones, 54_900, true),
        CatalogItem::new("samsung-galaxy-a5", "Samsung Galaxy A5", Category::Phones, 29_900, true),
        CatalogItem::new("lumia-950-xl", "Lumia 950 XL", Category::Phones, 38_900, true),
        CatalogItem::new("iphone-6-plus-64gb", "iPhone 6 Plus 64GB", Category::Phones, 69_900, false),
        CatalogItem::new("ipad-pro-wifi-32gb", "iPad Pro Wi-Fi 32GB", Category::Tablets, 79_900, true),
        CatalogItem::new("dell-xps-13", "Dell XPS 13", Category::Computers, 99_900, true),
        CatalogItem::new("macbook-air-13", "Apple MacBook Air 13", Category::Computers, 119_900, true),
        CatalogItem::new("apple-watch-sport-42mm", "Apple Watch Sport 42mm", Category::Accessories, 39_900, true),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Billing,
    Payment,
    Details,
    Confirm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CheckoutState {
    stage: Stage,
    billing: BTreeMap<String, String>,
    card: BTreeMap<String, String>,
    method: Option<PaymentMethod>,
    touched: bool,
}

impl CheckoutState {
    fn new() -> Self {
        Self {
            stage: Stage::Billing,
            billing: BTreeMap::new(),
            card: BTreeMap::new(),
            method: None,
            touched: false,
        }
    }

    fn billing_complete(&self) -> bool {
        BILLING_FIELDS
            .iter()
            .filter(|(_, _, required)| *required)
            .all(|(field, _, _)| self.billing.get(*field).is_some_and(|v| !v.trim().is_empty()))
    }

    fn card_complete(&self) -> bool {
        CARD_FIELDS
            .iter()
            .all(|field| self.card.get(*field).is_some_and(|v| !v.trim().is_empty()))
    }
}

/// In-memory storefront implementing [`MockSite`]
#[derive(Debug, Clone)]
pub struct Storefront {
    catalog: Vec<CatalogItem>,
    layout: CheckoutLayout,
    cart: Vec<(String, u32)>,
    quantity_field: BTreeMap<String, String>,
    search_field: String,
    modal_open: bool,
    checkout: CheckoutState,
    last_order: Option<(u32, Price)>,
    next_order_id: u32,
    login_email: String,
    login_password: String,
    login_failed: bool,
    logged_in: bool,
}

impl Default for Storefront {
    fn default() -> Self {
        Self::new(CheckoutLayout::default())
    }
}

impl Storefront {
    /// Storefront with the demo catalog and the given checkout markup
    #[must_use]
    pub fn new(layout: CheckoutLayout) -> Self {
        Self {
            catalog: demo_catalog(),
            layout,
            cart: Vec::new(),
            quantity_field: BTreeMap::new(),
            search_field: String::new(),
            modal_open: false,
            checkout: CheckoutState::new(),
            last_order: None,
            next_order_id: 1001,
            login_email: String::new(),
            login_password: String::new(),
            login_failed: false,
            logged_in: false,
        }
    }

    /// Pre-load the cart
    #[must_use]
    pub fn with_cart_line(mut self, slug: &str, quantity: u32) -> Self {
        self.add_to_cart(slug, quantity);
        self
    }

    fn product(&self, slug: &str) -> Option<&CatalogItem> {
        self.catalog.iter().find(|p| p.slug == slug)
    }

    fn add_to_cart(&mut self, slug: &str, quantity: u32) {
        if quantity == 0 || !self.product(slug).is_some_and(|p| p.in_stock) {
            return;
        }
        match self.cart.iter_mut().find(|(s, _)| s == slug) {
            Some((_, q)) => *q += quantity,
            None => self.cart.push((slug.to_string(), quantity)),
        }
    }

    fn cart_units(&self) -> u32 {
        self.cart.iter().map(|(_, q)| q).sum()
    }

    fn cart_total(&self) -> Price {
        let cents = self
            .cart
            .iter()
            .filter_map(|(slug, q)| self.product(slug).map(|p| p.price.times(*q).cents()))
            .sum();
        Price::from_cents(cents)
    }

    fn place_order(&mut self) -> SiteEffect {
        let id = self.next_order_id;
        self.next_order_id += 1;
        self.last_order = Some((id, self.cart_total()));
        self.cart.clear();
        self.checkout = CheckoutState::new();
        SiteEffect::Navigate("/checkout/success".to_string())
    }

    // ---------------------------------------------------------------- render

    fn header(&self, page: &mut MockPage) {
        page.push(MockElement::new("header", "header"));
        page.push(MockElement::new("logo-box", "div").matching(".site-logo").child_of("header"));
        page.push(
            MockElement::new("logo", "a")
                .matching(".site-logo a")
                .child_of("logo-box")
                .text("SimplCommerce"),
        );
        page.push(
            MockElement::new("search-input", "input")
                .matching("#Query")
                .matching("input[name=\"Query\"]")
                .child_of("header")
                .value(self.search_field.clone()),
        );
        page.push(
            MockElement::new("search-button", "button")
                .matching(".search-btn")
                .matching("button[type=\"submit\"]")
                .child_of("header")
                .text("Search"),
        );
        if self.logged_in {
            page.push(MockElement::new("user-menu", "div").matching(".user-menu").child_of("header").text("Hello admin"));
        } else {
            page.push(
                MockElement::new("login-link", "a")
                    .matching("a[href=\"/login\"]")
                    .child_of("header")
                    .text("Log in"),
            );
            page.push(
                MockElement::new("register-link", "a")
                    .matching("a[href=\"/register\"]")
                    .child_of("header")
                    .text("Register"),
            );
        }
        page.push(
            MockElement::new("cart-link", "a")
                .matching("a[href*=\"cart\"]")
                .matching(".cart-btn")
                .child_of("header")
                .text("Cart"),
        );
        page.push(
            MockElement::new("cart-badge", "span")
                .matching(".cart-badge")
                .matching(".badge")
                .child_of("cart-link")
                .text(self.cart_units().to_string()),
        );
        page.push(MockElement::new("nav", "ul").matching("#navbarMain").child_of("header"));
        for category in Category::ALL {
            page.push(
                MockElement::new(format!("cat-{}", category.slug()), "a")
                    .matching(".nav-link")
                    .child_of("nav")
                    .text(category.label()),
            );
        }
    }

    fn grid<'a>(&self, page: &mut MockPage, items: impl Iterator<Item = &'a CatalogItem>) {
        page.push(MockElement::new("grid", "div").matching(".product-list").child_of("main"));
        for item in items {
            let slug = &item.slug;
            page.push(MockElement::new(format!("item-{slug}"), "div").matching(".product-item").child_of("grid"));
            page.push(MockElement::new(format!("h4-{slug}"), "h4").child_of(format!("item-{slug}")));
            page.push(
                MockElement::new(format!("title-{slug}"), "a")
                    .matching("h4 a")
                    .child_of(format!("h4-{slug}"))
                    .text(item.name.clone()),
            );
            page.push(
                MockElement::new(format!("price-box-{slug}"), "div")
                    .matching(".price-outer")
                    .child_of(format!("item-{slug}")),
            );
            page.push(
                MockElement::new(format!("price-{slug}"), "span")
                    .matching(".price-outer .amount")
                    .child_of(format!("price-box-{slug}"))
                    .text(item.price.to_string()),
            );
            if item.in_stock {
                page.push(
                    MockElement::new(format!("add-{slug}"), "button")
                        .matching(".add-to-cart")
                        .child_of(format!("item-{slug}"))
                        .text("Add to cart"),
                );
            }
        }
    }

    fn render_home(&self, page: &mut MockPage) {
        page.push(MockElement::new("main", "div").matching(".container"));
        page.push(MockElement::new("hero", "section").matching(".hero").child_of("main"));
        self.grid(page, self.catalog.iter());
    }

    fn render_listing(&self, page: &mut MockPage, heading: &str, items: Vec<&CatalogItem>) {
        page.push(MockElement::new("main", "div").matching(".container"));
        page.push(MockElement::new("heading", "h2").child_of("main").text(heading.to_string()));
        if items.is_empty() {
            page.push(MockElement::new("no-results", "p").matching(".no-results").child_of("main").text("No products found"));
        }
        self.grid(page, items.into_iter());
    }

    fn render_product(&self, page: &mut MockPage, item: &CatalogItem) {
        let qty = self
            .quantity_field
            .get(&item.slug)
            .cloned()
            .unwrap_or_else(|| "1".to_string());
        page.push(MockElement::new("main", "div").matching(".container"));
        page.push(MockElement::new("breadcrumb", "ol").matching(".breadcrumb").child_of("main"));
        page.push(
            MockElement::new("crumb", "a")
                .matching(".breadcrumb a")
                .child_of("breadcrumb")
                .text(item.category.label()),
        );
        page.push(MockElement::new("name", "h1").child_of("main").text(item.name.clone()));
        page.push(MockElement::new("price-box", "div").matching(".product-detail-price").child_of("main"));
        page.push(
            MockElement::new("price", "span")
                .matching(".product-detail-price .amount")
                .child_of("price-box")
                .text(item.price.to_string()),
        );
        page.push(
            MockElement::new("description", "div")
                .matching(".product-detail-description")
                .child_of("main")
                .text(format!("{} by SimplCommerce demo.", item.name)),
        );
        page.push(
            MockElement::new("stock", "div")
                .matching(".stock-status")
                .child_of("main")
                .text(if item.in_stock { "In stock" } else { "Out of stock" }),
        );
        page.push(MockElement::new("quantity", "div").matching(".quantity").child_of("main"));
        page.push(
            MockElement::new("qty-dec", "button")
                .matching(".quantity button")
                .child_of("quantity")
                .text("-"),
        );
        page.push(
            MockElement::new("qty", "input")
                .matching("input[name=\"quantity\"]")
                .matching(".quantity input")
                .child_of("quantity")
                .value(qty),
        );
        page.push(
            MockElement::new("qty-inc", "button")
                .matching(".quantity button")
                .child_of("quantity")
                .text("+"),
        );
        page.push(
            MockElement::new("add-to-cart", "button")
                .matching(".btn-add-cart")
                .child_of("main")
                .text("Add to cart")
                .enabled(item.in_stock),
        );

        let mut modal = MockElement::new("modal", "div").matching(".modal");
        if !self.modal_open {
            modal = modal.hidden();
        }
        page.push(modal);
        page.push(
            MockElement::new("modal-title", "h4")
                .child_of("modal")
                .text("The product has been added to your cart"),
        );
        page.push(
            MockElement::new("modal-continue", "button")
                .child_of("modal")
                .text("Continue shopping"),
        );
        page.push(MockElement::new("modal-view-cart", "a").child_of("modal").text("View cart"));
    }

    fn render_cart(&self, page: &mut MockPage) {
        page.push(MockElement::new("main", "div").matching(".container"));
        page.push(MockElement::new("cart-title", "h1").child_of("main").text("Shopping Cart"));
        if self.cart.is_empty() {
            page.push(
                MockElement::new("empty", "p")
                    .child_of("main")
                    .text("There are no items in this cart."),
            );
            return;
        }

        page.push(MockElement::new("lines", "table").child_of("main"));
        page.push(MockElement::new("lines-body", "tbody").child_of("lines"));
        for (slug, qty) in &self.cart {
            let Some(item) = self.product(slug) else { continue };
            let row = format!("row-{slug}");
            page.push(
                MockElement::new(row.clone(), "tr")
                    .matching("tbody tr")
                    .matching(".cart-item")
                    .child_of("lines-body"),
            );
            page.push(MockElement::new(format!("{row}-name-cell"), "td").child_of(row.clone()));
            page.push(
                MockElement::new(format!("{row}-name"), "h6")
                    .child_of(format!("{row}-name-cell"))
                    .text(item.name.clone()),
            );
            page.push(
                MockElement::new(format!("{row}-price"), "td")
                    .matching(".unit-price")
                    .child_of(row.clone())
                    .text(item.price.to_string()),
            );
            page.push(MockElement::new(format!("{row}-qty-cell"), "td").child_of(row.clone()));
            page.push(
                MockElement::new(format!("{row}-qty"), "input")
                    .matching("input[type=\"number\"]")
                    .child_of(format!("{row}-qty-cell"))
                    .value(qty.to_string()),
            );
            page.push(
                MockElement::new(format!("{row}-total"), "td")
                    .matching(".line-total")
                    .child_of(row.clone())
                    .text(item.price.times(*qty).to_string()),
            );
            page.push(
                MockElement::new(format!("{row}-remove"), "button")
                    .matching(".remove")
                    .child_of(row.clone())
                    .text("Remove"),
            );
        }

        let total = self.cart_total().to_string();
        page.push(MockElement::new("summary", "table").child_of("main"));
        page.push(MockElement::new("summary-caption", "caption").child_of("summary").text("Order summary"));
        page.push(MockElement::new("subtotal-row", "tr").child_of("summary"));
        page.push(MockElement::new("subtotal-label", "td").child_of("subtotal-row").text("Subtotal"));
        page.push(MockElement::new("subtotal-cell", "td").matching(".subtotal-outer").child_of("subtotal-row"));
        page.push(
            MockElement::new("subtotal", "span")
                .matching(".subtotal-outer .amount")
                .child_of("subtotal-cell")
                .text(total.clone()),
        );
        page.push(MockElement::new("total-row", "tr").child_of("summary"));
        page.push(MockElement::new("total-label", "td").child_of("total-row").text("Order Total"));
        page.push(MockElement::new("total-cell", "td").matching(".total-outer").child_of("total-row"));
        page.push(
            MockElement::new("total", "span")
                .matching(".total-outer .amount")
                .child_of("total-cell")
                .text(total),
        );
        page.push(
            MockElement::new("checkout-link", "a")
                .child_of("main")
                .text("Process to Checkout"),
        );
        page.push(
            MockElement::new("continue-shopping", "a")
                .child_of("main")
                .text("Continue Shopping"),
        );
    }

    fn render_checkout(&self, page: &mut MockPage) {
        page.push(MockElement::new("checkout", "div").matching(".checkout-page"));
        page.push(
            MockElement::new("checkout-title", "h1")
                .matching(".checkout-page h1")
                .child_of("checkout")
                .text("Checkout"),
        );
        if self.cart.is_empty() {
            page.push(
                MockElement::new("checkout-empty", "div")
                    .matching(".alert-danger")
                    .child_of("checkout")
                    .text("Your cart is empty"),
            );
            return;
        }
        page.push(
            MockElement::new("order-total", "span")
                .matching(".order-total")
                .child_of("checkout")
                .text(self.cart_total().to_string()),
        );

        let state = &self.checkout;
        let single = self.layout == CheckoutLayout::SinglePage;

        if single || state.stage == Stage::Billing {
            self.render_billing(page);
            let (key, text, css) = if single {
                ("proceed", "Proceed to payment", ".btn-proceed-payment")
            } else {
                ("continue-billing", "Continue", ".btn-continue")
            };
            page.push(
                MockElement::new(key, "button")
                    .matching(css)
                    .child_of("billing")
                    .text(text)
                    .enabled(state.billing_complete()),
            );
        }

        let show_payment = if single {
            state.stage != Stage::Billing
        } else {
            state.stage == Stage::Payment
        };
        if show_payment {
            page.push(MockElement::new("payment", "div").matching(".payment-method").child_of("checkout"));
            for method in PaymentMethod::ALL {
                let i = method.index();
                page.push(
                    MockElement::new(format!("pm-{i}"), "input")
                        .matching(format!("#paymentmethod_{i}"))
                        .child_of("payment")
                        .value(if state.method == Some(method) { "on" } else { "" }),
                );
                page.push(
                    MockElement::new(format!("pm-label-{i}"), "label")
                        .child_of("payment")
                        .text(method.label()),
                );
            }
            if !single {
                page.push(
                    MockElement::new("continue-payment", "button")
                        .matching(".btn-continue")
                        .child_of("payment")
                        .text("Continue")
                        .enabled(state.method.is_some()),
                );
            }
        }

        let show_details = state.method.is_some_and(|m| m.requires_details())
            && if single {
                state.stage != Stage::Billing
            } else {
                state.stage == Stage::Details
            };
        if show_details {
            page.push(MockElement::new("details", "div").matching(".payment-info").child_of("checkout"));
            for field in CARD_FIELDS {
                let tag = if field.starts_with("Expire") { "select" } else { "input" };
                page.push(
                    MockElement::new(format!("card-{field}"), tag)
                        .matching(format!("#{field}"))
                        .child_of("details")
                        .value(state.card.get(field).cloned().unwrap_or_default()),
                );
            }
            if !single {
                page.push(
                    MockElement::new("continue-details", "button")
                        .matching(".btn-continue")
                        .child_of("details")
                        .text("Continue")
                        .enabled(state.card_complete()),
                );
            }
        }

        let show_confirm = if single {
            state.stage != Stage::Billing
                && state
                    .method
                    .is_some_and(|m| !m.requires_details() || state.card_complete())
        } else {
            state.stage == Stage::Confirm
        };
        if show_confirm {
            page.push(MockElement::new("confirm-box", "div").matching(".order-confirm").child_of("checkout"));
            let (text, css) = if single {
                ("Place order", ".btn-place-order")
            } else {
                ("Confirm order", ".btn-confirm")
            };
            page.push(
                MockElement::new("confirm", "button")
                    .matching(css)
                    .child_of("confirm-box")
                    .text(text),
            );
        }
    }

    fn render_billing(&self, page: &mut MockPage) {
        let state = &self.checkout;
        page.push(MockElement::new("billing", "div").matching(".billing-address").child_of("checkout"));
        for (field, label, required) in BILLING_FIELDS {
            let tag = if field.ends_with("Id") { "select" } else { "input" };
            let value = state.billing.get(field).cloned().unwrap_or_default();
            let missing = value.trim().is_empty();
            page.push(
                MockElement::new(format!("field-{field}"), tag)
                    .matching(format!("#BillingNewAddress_{field}"))
                    .matching(format!("{tag}[name=\"{field}\"]"))
                    .child_of("billing")
                    .value(value),
            );
            if required && missing && state.touched {
                page.push(
                    MockElement::new(format!("error-{field}"), "span")
                        .matching(".field-validation-error")
                        .child_of("billing")
                        .text(format!("{label} is required.")),
                );
            }
        }
    }

    fn render_success(&self, page: &mut MockPage) {
        page.push(MockElement::new("success", "div").matching(".order-completed"));
        page.push(MockElement::new("thanks", "h1").child_of("success").text("Thank you"));
        if let Some((id, total)) = self.last_order {
            page.push(
                MockElement::new("order-number", "span")
                    .matching(".order-number")
                    .child_of("success")
                    .text(id.to_string()),
            );
            page.push(
                MockElement::new("order-total", "span")
                    .matching(".order-total")
                    .child_of("success")
                    .text(total.to_string()),
            );
        }
    }

    fn render_login(&self, page: &mut MockPage) {
        page.push(MockElement::new("main", "div").matching(".container"));
        page.push(MockElement::new("login-form", "form").child_of("main"));
        if self.login_failed {
            page.push(
                MockElement::new("login-error", "div")
                    .matching(".validation-summary-errors")
                    .child_of("login-form")
                    .text("Invalid login attempt."),
            );
        }
        page.push(
            MockElement::new("login-email", "input")
                .matching("#Email")
                .child_of("login-form")
                .value(self.login_email.clone()),
        );
        page.push(
            MockElement::new("login-password", "input")
                .matching("#Password")
                .child_of("login-form")
                .value(self.login_password.clone()),
        );
        page.push(
            MockElement::new("login-submit", "button")
                .child_of("login-form")
                .text("Log in"),
        );
    }

    // ------------------------------------------------------------- handlers

    fn search_path(&self) -> String {
        format!("/search?query={}", self.search_field.trim().replace(' ', "+"))
    }

    fn click_checkout(&mut self, key: &str) -> SiteEffect {
        let single = self.layout == CheckoutLayout::SinglePage;
        let state = &mut self.checkout;
        match key {
            "continue-billing" | "proceed" if state.billing_complete() => {
                state.stage = Stage::Payment;
                SiteEffect::Rerender
            }
            "continue-billing" | "proceed" => {
                state.touched = true;
                SiteEffect::Rerender
            }
            "continue-payment" => match state.method {
                Some(m) if m.requires_details() => {
                    state.stage = Stage::Details;
                    SiteEffect::Rerender
                }
                Some(_) => {
                    state.stage = Stage::Confirm;
                    SiteEffect::Rerender
                }
                None => SiteEffect::None,
            },
            "continue-details" if state.card_complete() => {
                state.stage = Stage::Confirm;
                SiteEffect::Rerender
            }
            "confirm" => self.place_order(),
            k if k.starts_with("pm-") => {
                let index = k
                    .trim_start_matches("pm-label-")
                    .trim_start_matches("pm-")
                    .parse::<usize>()
                    .ok();
                state.method = index.and_then(|i| PaymentMethod::ALL.get(i).copied());
                if single && state.method.is_some_and(|m| m.requires_details()) {
                    state.stage = Stage::Details;
                }
                SiteEffect::Rerender
            }
            _ => SiteEffect::None,
        }
    }
}

impl MockSite for Storefront {
    fn render(&self, path: &str) -> Option<MockPage> {
        let (route, query) = path.split_once('?').unwrap_or((path, ""));
        let mut page = MockPage::new("SimplCommerce");
        self.header(&mut page);

        match route {
            "/" | "" => {
                page.title = "Home Page - SimplCommerce".to_string();
                self.render_home(&mut page);
            }
            "/search" => {
                let needle = query
                    .strip_prefix("query=")
                    .unwrap_or("")
                    .replace('+', " ")
                    .to_lowercase();
                let items = self
                    .catalog
                    .iter()
                    .filter(|p| p.name.to_lowercase().contains(&needle))
                    .collect();
                page.title = "Search - SimplCommerce".to_string();
                self.render_listing(&mut page, "Search results", items);
            }
            "/cart" => {
                page.title = "Shopping Cart - SimplCommerce".to_string();
                self.render_cart(&mut page);
            }
            "/checkout" => {
                page.title = "Checkout - SimplCommerce".to_string();
                self.render_checkout(&mut page);
            }
            "/checkout/success" => {
                page.title = "Order Completed - SimplCommerce".to_string();
                self.render_success(&mut page);
            }
            "/login" => {
                page.title = "Log in - SimplCommerce".to_string();
                self.render_login(&mut page);
            }
            "/register" => {
                page.title = "Register - SimplCommerce".to_string();
                page.push(MockElement::new("main", "div").matching(".container"));
                page.push(MockElement::new("register-title", "h1").child_of("main").text("Register"));
            }
            other => {
                let slug = other.trim_start_matches('/');
                if let Ok(category) = slug.parse::<Category>() {
                    let items = self.catalog.iter().filter(|p| p.category == category).collect();
                    page.title = format!("{} - SimplCommerce", category.label());
                    self.render_listing(&mut page, category.label(), items);
                } else {
                    let item = self.product(slug)?;
                    page.title = format!("{} - SimplCommerce", item.name);
                    self.render_product(&mut page, item);
                }
            }
        }
        Some(page)
    }

    fn click(&mut self, path: &str, key: &str) -> SiteEffect {
        let product_slug = path.trim_start_matches('/').to_string();
        match key {
            "logo" => SiteEffect::Navigate("/".to_string()),
            "login-link" => SiteEffect::Navigate("/login".to_string()),
            "register-link" => SiteEffect::Navigate("/register".to_string()),
            "cart-link" | "cart-badge" | "modal-view-cart" => {
                self.modal_open = false;
                SiteEffect::Navigate("/cart".to_string())
            }
            "search-button" => SiteEffect::Navigate(self.search_path()),
            "add-to-cart" => {
                let qty = self
                    .quantity_field
                    .remove(&product_slug)
                    .and_then(|q| q.trim().parse::<u32>().ok())
                    .unwrap_or(1)
                    .max(1);
                self.add_to_cart(&product_slug, qty);
                self.modal_open = true;
                SiteEffect::Rerender
            }
            "modal-continue" => {
                self.modal_open = false;
                SiteEffect::Rerender
            }
            "qty-inc" | "qty-dec" => {
                let current = self
                    .quantity_field
                    .get(&product_slug)
                    .and_then(|q| q.parse::<u32>().ok())
                    .unwrap_or(1);
                let next = if key == "qty-inc" {
                    current + 1
                } else {
                    current.saturating_sub(1).max(1)
                };
                let _ = self.quantity_field.insert(product_slug, next.to_string());
                SiteEffect::None
            }
            "checkout-link" => SiteEffect::Navigate("/checkout".to_string()),
            "continue-shopping" => SiteEffect::Navigate("/".to_string()),
            "login-submit" => {
                if (self.login_email.as_str(), self.login_password.as_str()) == DEMO_ADMIN {
                    self.logged_in = true;
                    self.login_failed = false;
                    SiteEffect::Navigate("/".to_string())
                } else {
                    self.login_failed = true;
                    self.login_password.clear();
                    SiteEffect::Rerender
                }
            }
            k if k.starts_with("cat-") => SiteEffect::Navigate(format!("/{}", &k[4..])),
            k if k.starts_with("title-") => SiteEffect::Navigate(format!("/{}", &k[6..])),
            k if k.starts_with("add-") => {
                self.add_to_cart(&k[4..], 1);
                SiteEffect::Rerender
            }
            k if k.starts_with("row-") && k.ends_with("-remove") => {
                let slug = &k[4..k.len() - "-remove".len()];
                self.cart.retain(|(s, _)| s != slug);
                SiteEffect::Rerender
            }
            k => self.click_checkout(k),
        }
    }

    fn fill(&mut self, path: &str, key: &str, value: &str) -> SiteEffect {
        match key {
            "search-input" => {
                self.search_field = value.to_string();
                SiteEffect::None
            }
            "qty" => {
                let slug = path.trim_start_matches('/').to_string();
                let _ = self.quantity_field.insert(slug, value.to_string());
                SiteEffect::None
            }
            "login-email" => {
                self.login_email = value.to_string();
                SiteEffect::None
            }
            "login-password" => {
                self.login_password = value.to_string();
                SiteEffect::None
            }
            k if k.starts_with("field-") => {
                self.checkout.touched = true;
                let _ = self
                    .checkout
                    .billing
                    .insert(k["field-".len()..].to_string(), value.to_string());
                SiteEffect::None
            }
            k if k.starts_with("card-") => {
                let _ = self
                    .checkout
                    .card
                    .insert(k["card-".len()..].to_string(), value.to_string());
                SiteEffect::None
            }
            k if k.starts_with("row-") && k.ends_with("-qty") => {
                let slug = &k[4..k.len() - "-qty".len()];
                match value.trim().parse::<u32>() {
                    Ok(0) => self.cart.retain(|(s, _)| s != slug),
                    Ok(q) => {
                        if let Some((_, qty)) = self.cart.iter_mut().find(|(s, _)| s == slug) {
                            *qty = q;
                        }
                    }
                    Err(_) => return SiteEffect::None,
                }
                SiteEffect::Rerender
            }
            _ => SiteEffect::None,
        }
    }

    fn press_key(&mut self, _path: &str, key: &str, name: &str) -> SiteEffect {
        match (key, name) {
            ("search-input", "Enter") => SiteEffect::Navigate(self.search_path()),
            _ => SiteEffect::None,
        }
    }
}
