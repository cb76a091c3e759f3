//! Storefront value objects.
//!
//! Everything here is read off the page on demand and never cached by the
//! page objects.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::result::{ShopError, ShopResult};

fn price_pattern() -> ShopResult<&'static Regex> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(\d{1,3}(?:,\d{3})+|\d+)(?:\.(\d{1,2}))?"))
        .as_ref()
        .map_err(|e| ShopError::configuration(format!("price pattern: {e}")))
}

/// Money amount in cents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price {
    cents: i64,
}

impl Price {
    /// Create from cents
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Amount in cents
    #[must_use]
    pub const fn cents(&self) -> i64 {
        self.cents
    }

    /// Whether the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Multiply by a quantity
    #[must_use]
    pub const fn times(&self, quantity: u32) -> Self {
        Self {
            cents: self.cents * quantity as i64,
        }
    }

    /// Parse display text such as `$549.00`, `1,299.00 $` or `Total: $12.5`.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Assertion`] if the text contains no amount.
    pub fn parse(text: &str) -> ShopResult<Self> {
        let caps = price_pattern()?
            .captures(text)
            .ok_or_else(|| ShopError::assertion(format!("no price in {text:?}")))?;
        let whole: i64 = caps[1]
            .replace(',', "")
            .parse()
            .map_err(|_| ShopError::assertion(format!("price out of range: {text:?}")))?;
        let fraction = match caps.get(2).map(|m| m.as_str()) {
            None => 0,
            Some(f) if f.len() == 1 => f.parse::<i64>().unwrap_or(0) * 10,
            Some(f) => f.parse::<i64>().unwrap_or(0),
        };
        let sign = if text.contains('-') { -1 } else { 1 };
        Ok(Self {
            cents: sign * (whole * 100 + fraction),
        })
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.unsigned_abs();
        let whole = (abs / 100).to_string();
        let mut grouped = String::new();
        for (i, c) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        write!(f, "{sign}${grouped}.{:02}", abs % 100)
    }
}

impl FromStr for Price {
    type Err = ShopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A product tile in a listing grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCard {
    /// Product name
    pub name: String,
    /// Parsed price, if the tile shows one
    pub price: Option<Price>,
    /// Whether the tile has an add-to-cart control
    pub has_add_to_cart: bool,
}

/// One row of the cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product name
    pub name: String,
    /// Unit price
    pub unit_price: Price,
    /// Quantity
    pub quantity: u32,
    /// Line total as displayed
    pub line_total: Price,
}

/// Full cart state at one instant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Lines in display order
    pub lines: Vec<CartLine>,
    /// Subtotal, absent for an empty cart
    pub subtotal: Option<Price>,
    /// Grand total, absent for an empty cart
    pub total: Option<Price>,
}

impl CartSnapshot {
    /// Total units across all lines
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Whether the cart has no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line by product name (substring match)
    #[must_use]
    pub fn line(&self, name: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.name.contains(name))
    }
}

/// Result of a completed checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    /// Order identifier shown on the confirmation page
    pub order_id: String,
    /// Order total as shown before confirming
    pub total: Option<Price>,
}

/// Top-level catalog category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Phones
    Phones,
    /// Tablets
    Tablets,
    /// Computers
    Computers,
    /// Accessories
    Accessories,
}

impl Category {
    /// All categories in navigation order
    pub const ALL: [Self; 4] = [Self::Phones, Self::Tablets, Self::Computers, Self::Accessories];

    /// Navigation label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Phones => "Phones",
            Self::Tablets => "Tablets",
            Self::Computers => "Computers",
            Self::Accessories => "Accessories",
        }
    }

    /// URL slug
    #[must_use]
    pub const fn slug(&self) -> &'static str {
        match self {
            Self::Phones => "phones",
            Self::Tablets => "tablets",
            Self::Computers => "computers",
            Self::Accessories => "accessories",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = ShopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.slug().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ShopError::configuration(format!("unknown category '{s}'")))
    }
}

/// Billing address; absent fields are left untouched on the form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    /// First name
    pub first_name: Option<String>,
    /// Last name
    pub last_name: Option<String>,
    /// Email
    pub email: Option<String>,
    /// Company
    pub company: Option<String>,
    /// Country (option label or value)
    pub country: Option<String>,
    /// State or province
    pub state: Option<String>,
    /// City
    pub city: Option<String>,
    /// Street line 1
    pub address1: Option<String>,
    /// Street line 2
    pub address2: Option<String>,
    /// ZIP or postal code
    pub zip_code: Option<String>,
    /// Phone
    pub phone: Option<String>,
}

impl Address {
    /// The address used by the checkout scenarios
    #[must_use]
    pub fn sample() -> Self {
        Self {
            first_name: Some("John".into()),
            last_name: Some("Doe".into()),
            email: Some("john.doe@example.com".into()),
            company: None,
            country: Some("United States".into()),
            state: Some("California".into()),
            city: Some("Los Angeles".into()),
            address1: Some("123 Main Street".into()),
            address2: Some("Apt 4".into()),
            zip_code: Some("90001".into()),
            phone: Some("555-123-4567".into()),
        }
    }
}

/// Payment method offered at checkout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash on delivery
    #[default]
    Cod,
    /// Check / money order
    Check,
    /// Purchase order
    PurchaseOrder,
    /// Credit card
    CreditCard,
    /// PayPal
    PayPal,
}

impl PaymentMethod {
    /// All methods in the order the radio buttons appear
    pub const ALL: [Self; 5] = [
        Self::Cod,
        Self::Check,
        Self::PurchaseOrder,
        Self::CreditCard,
        Self::PayPal,
    ];

    /// Radio label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Cod => "Cash on Delivery",
            Self::Check => "Check",
            Self::PurchaseOrder => "Purchase Order",
            Self::CreditCard => "Credit Card",
            Self::PayPal => "PayPal",
        }
    }

    /// Position among the radio buttons
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::Cod => 0,
            Self::Check => 1,
            Self::PurchaseOrder => 2,
            Self::CreditCard => 3,
            Self::PayPal => 4,
        }
    }

    /// Whether the method needs a payment details step
    #[must_use]
    pub const fn requires_details(&self) -> bool {
        matches!(self, Self::CreditCard)
    }
}

impl FromStr for PaymentMethod {
    type Err = ShopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cod" => Ok(Self::Cod),
            "check" => Ok(Self::Check),
            "purchaseorder" => Ok(Self::PurchaseOrder),
            "creditcard" => Ok(Self::CreditCard),
            "paypal" => Ok(Self::PayPal),
            other => Err(ShopError::configuration(format!(
                "unknown payment method '{other}'"
            ))),
        }
    }
}

/// Card details for methods that need them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentDetails {
    /// Name on card
    pub cardholder_name: Option<String>,
    /// Card number
    pub card_number: Option<String>,
    /// CVV
    pub card_code: Option<String>,
    /// Expiry month, `"12"`
    pub expire_month: Option<String>,
    /// Expiry year, `"2028"`
    pub expire_year: Option<String>,
}

impl PaymentDetails {
    /// Test card used by the checkout scenarios
    #[must_use]
    pub fn sample() -> Self {
        Self {
            cardholder_name: Some("John Doe".into()),
            card_number: Some("4111111111111111".into()),
            card_code: Some("123".into()),
            expire_month: Some("12".into()),
            expire_year: Some("2028".into()),
        }
    }
}

/// Login credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Email or user name
    pub email: String,
    /// Password
    pub password: String,
}

impl Credentials {
    /// Create credentials
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Position in the checkout sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CheckoutStage {
    /// Still on the cart
    Cart,
    /// Billing address form
    BillingAddress,
    /// Payment method choice
    PaymentMethod,
    /// Card details
    PaymentDetails,
    /// Review and confirm
    Confirmation,
    /// Order placed
    OrderComplete,
}

impl fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Checkout markup variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckoutLayout {
    /// One form per stage with a Continue button between stages
    #[default]
    MultiStep,
    /// Address and payment on one page; "Proceed to payment" reveals payment
    SinglePage,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod price_tests {
        use super::*;

        #[test]
        fn test_parse_common_formats() {
            assert_eq!(Price::parse("$549.00").unwrap().cents(), 54_900);
            assert_eq!(Price::parse("1,299.00 $").unwrap().cents(), 129_900);
            assert_eq!(Price::parse("Total: $12.5").unwrap().cents(), 1_250);
            assert_eq!(Price::parse("$7").unwrap().cents(), 700);
        }

        #[test]
        fn test_parse_rejects_text_without_amount() {
            assert!(Price::parse("N/A").is_err());
            assert!(Price::parse("").is_err());
        }

        #[test]
        fn test_display_groups_thousands() {
            assert_eq!(Price::from_cents(119_900).to_string(), "$1,199.00");
            assert_eq!(Price::from_cents(54_905).to_string(), "$549.05");
            assert_eq!(Price::from_cents(0).to_string(), "$0.00");
            assert_eq!(Price::from_cents(123_456_789).to_string(), "$1,234,567.89");
        }

        #[test]
        fn test_times() {
            assert_eq!(Price::from_cents(29_900).times(2), Price::from_cents(59_800));
        }
    }

    mod enum_tests {
        use super::*;

        #[test]
        fn test_category_from_str() {
            assert_eq!("Phones".parse::<Category>().unwrap(), Category::Phones);
            assert_eq!("computers".parse::<Category>().unwrap(), Category::Computers);
            assert!("garden".parse::<Category>().unwrap_err().is_configuration());
        }

        #[test]
        fn test_payment_method_from_str() {
            assert_eq!("COD".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cod);
            assert_eq!(
                "creditcard".parse::<PaymentMethod>().unwrap(),
                PaymentMethod::CreditCard
            );
            assert!(PaymentMethod::CreditCard.requires_details());
            assert!(!PaymentMethod::Cod.requires_details());
        }

        #[test]
        fn test_stage_ordering() {
            assert!(CheckoutStage::BillingAddress < CheckoutStage::PaymentMethod);
            assert!(CheckoutStage::Confirmation < CheckoutStage::OrderComplete);
        }

        #[test]
        fn test_layout_serde() {
            let layout: CheckoutLayout = serde_yaml_ng::from_str("single-page").unwrap();
            assert_eq!(layout, CheckoutLayout::SinglePage);
            assert_eq!(CheckoutLayout::default(), CheckoutLayout::MultiStep);
        }
    }

    mod data_tests {
        use super::*;

        #[test]
        fn test_address_camel_case_with_missing_fields() {
            let json = r#"{"firstName":"Jane","zipCode":"10001"}"#;
            let addr: Address = serde_json::from_str(json).unwrap();
            assert_eq!(addr.first_name.as_deref(), Some("Jane"));
            assert_eq!(addr.zip_code.as_deref(), Some("10001"));
            assert!(addr.email.is_none());
        }

        #[test]
        fn test_snapshot_helpers() {
            let snap = CartSnapshot {
                lines: vec![CartLine {
                    name: "Samsung Galaxy A5".into(),
                    unit_price: Price::from_cents(29_900),
                    quantity: 2,
                    line_total: Price::from_cents(59_800),
                }],
                subtotal: Some(Price::from_cents(59_800)),
                total: Some(Price::from_cents(59_800)),
            };
            assert_eq!(snap.unit_count(), 2);
            assert!(snap.line("Galaxy").is_some());
            assert!(CartSnapshot::default().is_empty());
        }
    }
}
