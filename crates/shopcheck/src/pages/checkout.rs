//! Checkout page and the scripted checkout flow.
//!
//! The flow runs `Cart → BillingAddress → PaymentMethod → [PaymentDetails] →
//! Confirmation → OrderComplete`. A step whose precondition fails stops the
//! flow with [`ShopError::FlowFailure`] naming the step and the last one that
//! completed. There is no retry and no rollback.

use std::future::Future;
use tracing::info;

use super::{PageContext, PageObject};
use crate::facade::{ActionOptions, Actions};
use crate::model::{
    Address, CheckoutLayout, CheckoutStage, OrderSummary, PaymentDetails, PaymentMethod, Price,
};
use crate::registry::{RegistryBuilder, SelectorRegistry};
use crate::result::{ShopError, ShopResult};

/// Billing form fields: registry name, form field, is a `<select>`
const BILLING_FIELDS: [(&str, &str, bool); 11] = [
    ("first_name", "FirstName", false),
    ("last_name", "LastName", false),
    ("email", "Email", false),
    ("company", "Company", false),
    ("country", "CountryId", true),
    ("state", "StateProvinceId", true),
    ("city", "City", false),
    ("address1", "Address1", false),
    ("address2", "Address2", false),
    ("zip_code", "ZipPostalCode", false),
    ("phone", "PhoneNumber", false),
];

/// Card form fields: registry name, form field, is a `<select>`
const CARD_FIELDS: [(&str, &str, bool); 5] = [
    ("cardholder_name", "CardholderName", false),
    ("card_number", "CardNumber", false),
    ("card_code", "CardCode", false),
    ("expire_month", "ExpireMonth", true),
    ("expire_year", "ExpireYear", true),
];

const FLOW: &str = "checkout";

/// Checkout page
#[derive(Debug, Clone)]
pub struct CheckoutPage {
    actions: Actions,
    registry: SelectorRegistry,
    layout: CheckoutLayout,
}

impl CheckoutPage {
    /// Default selector chains for a layout.
    ///
    /// Both layouts register the same element names; only the chains of
    /// the step buttons differ.
    #[must_use]
    pub fn selectors(layout: CheckoutLayout) -> RegistryBuilder {
        let mut builder = RegistryBuilder::new("checkout")
            .with("section", ".checkout-page, .checkout-container")
            .with("title", r#".checkout-page h1, h1:has-text("Checkout")"#)
            .with("billing_section", ".billing-address, .address-section")
            .with("payment_section", ".payment-method, .payment-section")
            .with("payment_info_section", ".payment-info, .card-details")
            .with("confirm_section", ".order-confirm, .confirm-order")
            .with("order_total", ".order-total, .grand-total .amount")
            .with(
                "validation_error",
                ".field-validation-error, .validation-summary-errors li, .alert-danger",
            )
            .with(
                "order_success",
                r#".order-completed, .success-page, h1:has-text("Thank you"), .thank-you"#,
            )
            .with("order_number", ".order-number, .order-id");

        for (name, field, select) in BILLING_FIELDS.iter().chain(CARD_FIELDS.iter()) {
            let tag = if *select { "select" } else { "input" };
            let id = if CARD_FIELDS.iter().any(|(n, _, _)| n == name) {
                format!("#{field}")
            } else {
                format!("#BillingNewAddress_{field}")
            };
            builder = builder.with(*name, format!(r#"{id}, {tag}[name="{field}"]"#));
        }
        for method in PaymentMethod::ALL {
            builder = builder.with(
                payment_element(method),
                format!(
                    r#"#paymentmethod_{}, label:has-text("{}")"#,
                    method.index(),
                    method.label()
                ),
            );
        }

        match layout {
            CheckoutLayout::MultiStep => builder
                .with("continue_billing", r#".btn-continue, button:has-text("Continue")"#)
                .with("continue_payment", r#".btn-continue, button:has-text("Continue")"#)
                .with("continue_details", r#".btn-continue, button:has-text("Continue")"#)
                .with("confirm", r#".btn-confirm, button:has-text("Confirm order")"#),
            CheckoutLayout::SinglePage => builder
                .with(
                    "continue_billing",
                    r#".btn-proceed-payment, button:has-text("Proceed to payment")"#,
                )
                .with("continue_payment", r#".btn-continue-payment, button:has-text("Continue")"#)
                .with("continue_details", r#".btn-continue-details, button:has-text("Continue")"#)
                .with("confirm", r#".btn-place-order, button:has-text("Place order")"#),
        }
    }

    /// Build from a page context
    ///
    /// # Errors
    ///
    /// Configuration errors from the registry.
    pub fn new(ctx: &PageContext) -> ShopResult<Self> {
        Ok(Self {
            actions: ctx.actions().clone(),
            registry: ctx.registry(Self::selectors(ctx.layout()))?,
            layout: ctx.layout(),
        })
    }

    /// Layout this page was built for
    #[must_use]
    pub const fn layout(&self) -> CheckoutLayout {
        self.layout
    }

    /// Navigate to checkout
    ///
    /// # Errors
    ///
    /// Navigation failures.
    pub async fn open(&self) -> ShopResult<()> {
        self.actions.navigate_to("/checkout").await
    }

    /// Whether the checkout container is shown
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn is_checkout_page(&self) -> ShopResult<bool> {
        self.actions.is_present(self.element("section")?).await
    }

    /// Fill every present field of the billing form
    ///
    /// # Errors
    ///
    /// Action failures.
    pub async fn fill_billing_address(&self, address: &Address) -> ShopResult<()> {
        info!("fill billing address");
        let values = [
            &address.first_name,
            &address.last_name,
            &address.email,
            &address.company,
            &address.country,
            &address.state,
            &address.city,
            &address.address1,
            &address.address2,
            &address.zip_code,
            &address.phone,
        ];
        for ((name, _, select), value) in BILLING_FIELDS.iter().zip(values) {
            if let Some(value) = value {
                self.set_field(name, value, *select).await?;
            }
        }
        Ok(())
    }

    async fn set_field(&self, name: &str, value: &str, select: bool) -> ShopResult<()> {
        let spec = self.element(name)?;
        if select {
            self.actions.select_option(spec, value).await
        } else {
            self.actions.fill(spec, value).await
        }
    }

    /// Submit the billing step
    ///
    /// # Errors
    ///
    /// `Disabled` while the address is incomplete; action failures.
    pub async fn continue_billing(&self) -> ShopResult<()> {
        self.actions.click(self.element("continue_billing")?).await
    }

    /// Whether the billing step can be submitted
    ///
    /// # Errors
    ///
    /// `NotFound` when the button is not shown.
    pub async fn can_proceed_to_payment(&self) -> ShopResult<bool> {
        self.actions.is_enabled(self.element("continue_billing")?).await
    }

    /// Choose a payment method
    ///
    /// # Errors
    ///
    /// Action failures.
    pub async fn select_payment_method(&self, method: PaymentMethod) -> ShopResult<()> {
        info!(method = method.label(), "select payment method");
        self.actions.click(self.element(payment_element(method))?).await?;
        if self.layout == CheckoutLayout::MultiStep {
            self.click_within("continue_payment", "payment_section").await?;
        }
        Ok(())
    }

    /// Fill every present card field
    ///
    /// # Errors
    ///
    /// Action failures.
    pub async fn fill_payment_details(&self, details: &PaymentDetails) -> ShopResult<()> {
        info!("fill payment details");
        let values = [
            &details.cardholder_name,
            &details.card_number,
            &details.card_code,
            &details.expire_month,
            &details.expire_year,
        ];
        for ((name, _, select), value) in CARD_FIELDS.iter().zip(values) {
            if let Some(value) = value {
                self.set_field(name, value, *select).await?;
            }
        }
        if self.layout == CheckoutLayout::MultiStep {
            self.click_within("continue_details", "payment_info_section").await?;
        }
        Ok(())
    }

    async fn click_within(&self, element: &str, section: &str) -> ShopResult<()> {
        let section = self
            .actions
            .resolve(self.element(section)?, &ActionOptions::default())
            .await?
            .into_handle()?;
        self.actions
            .click_with(self.element(element)?, &ActionOptions::within(section))
            .await
    }

    /// Place the order
    ///
    /// # Errors
    ///
    /// Action failures.
    pub async fn confirm_order(&self) -> ShopResult<()> {
        info!("confirm order");
        self.actions.click(self.element("confirm")?).await
    }

    /// Order total as shown on the page
    ///
    /// # Errors
    ///
    /// `NotFound` or an unparseable amount.
    pub async fn order_total(&self) -> ShopResult<Price> {
        Price::parse(&self.actions.read_text(self.element("order_total")?).await?)
    }

    /// Order number on the confirmation page
    ///
    /// # Errors
    ///
    /// `NotFound` when not on the confirmation page.
    pub async fn order_number(&self) -> ShopResult<String> {
        self.actions.read_text(self.element("order_number")?).await
    }

    /// Whether the order confirmation is shown
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn is_order_complete(&self) -> ShopResult<bool> {
        self.actions.is_present(self.element("order_success")?).await
    }

    /// Every validation message shown
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn validation_errors(&self) -> ShopResult<Vec<String>> {
        self.actions
            .read_texts(self.element("validation_error")?, &ActionOptions::default())
            .await
    }

    /// Whether any validation message is shown
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn has_validation_error(&self) -> ShopResult<bool> {
        self.actions.is_present(self.element("validation_error")?).await
    }

    /// Most advanced stage whose section is shown
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn current_stage(&self) -> ShopResult<CheckoutStage> {
        let probes = [
            ("order_success", CheckoutStage::OrderComplete),
            ("confirm_section", CheckoutStage::Confirmation),
            ("payment_info_section", CheckoutStage::PaymentDetails),
            ("payment_section", CheckoutStage::PaymentMethod),
            ("billing_section", CheckoutStage::BillingAddress),
        ];
        for (element, stage) in probes {
            if self.actions.is_present(self.element(element)?).await? {
                return Ok(stage);
            }
        }
        Ok(CheckoutStage::Cart)
    }

    async fn expect_stage(&self, wanted: CheckoutStage) -> ShopResult<()> {
        let reached = self.current_stage().await?;
        if reached < wanted {
            let errors = self.validation_errors().await?;
            return Err(ShopError::assertion(format!(
                "expected {wanted}, page shows {reached}; validation: [{}]",
                errors.join("; ")
            )));
        }
        Ok(())
    }

    /// Run the whole flow from the checkout page.
    ///
    /// Card details are only used when `method` needs them.
    ///
    /// # Errors
    ///
    /// [`ShopError::FlowFailure`] naming the step that stopped the flow.
    pub async fn complete_checkout(
        &self,
        address: &Address,
        method: PaymentMethod,
        details: Option<&PaymentDetails>,
    ) -> ShopResult<OrderSummary> {
        let mut flow = Flow::default();

        let total = flow
            .step(CheckoutStage::Cart, async {
                if !self.is_checkout_page().await? {
                    self.open().await?;
                }
                if self.has_validation_error().await? {
                    let errors = self.validation_errors().await?;
                    return Err(ShopError::assertion(errors.join("; ")));
                }
                self.order_total().await
            })
            .await?;

        flow.step(CheckoutStage::BillingAddress, async {
            self.fill_billing_address(address).await?;
            self.continue_billing().await?;
            self.expect_stage(CheckoutStage::PaymentMethod).await
        })
        .await?;

        flow.step(CheckoutStage::PaymentMethod, async {
            self.select_payment_method(method).await
        })
        .await?;

        if method.requires_details() {
            flow.step(CheckoutStage::PaymentDetails, async {
                let details = details.ok_or_else(|| {
                    ShopError::configuration(format!("{} needs payment details", method.label()))
                })?;
                self.fill_payment_details(details).await
            })
            .await?;
        }

        flow.step(CheckoutStage::Confirmation, async {
            self.expect_stage(CheckoutStage::Confirmation).await?;
            self.confirm_order().await
        })
        .await?;

        let order_id = flow
            .step(CheckoutStage::OrderComplete, async {
                if !self.is_order_complete().await? {
                    return Err(ShopError::assertion("confirmation page not shown"));
                }
                let id = self.order_number().await?;
                if id.trim().is_empty() {
                    return Err(ShopError::assertion("order number is empty"));
                }
                Ok(id)
            })
            .await?;

        info!(order_id = %order_id, total = %total, "order placed");
        Ok(OrderSummary {
            order_id,
            total: Some(total),
        })
    }
}

impl PageObject for CheckoutPage {
    fn url_pattern(&self) -> &str {
        "/checkout"
    }

    fn registry(&self) -> &SelectorRegistry {
        &self.registry
    }

    fn actions(&self) -> &Actions {
        &self.actions
    }
}

fn payment_element(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cod => "payment_cod",
        PaymentMethod::Check => "payment_check",
        PaymentMethod::PurchaseOrder => "payment_purchase_order",
        PaymentMethod::CreditCard => "payment_credit_card",
        PaymentMethod::PayPal => "payment_paypal",
    }
}

/// Step tracker for one run of the flow
#[derive(Debug, Default)]
struct Flow {
    last_completed: Option<CheckoutStage>,
}

impl Flow {
    async fn step<T>(
        &mut self,
        stage: CheckoutStage,
        body: impl Future<Output = ShopResult<T>>,
    ) -> ShopResult<T> {
        info!(flow = FLOW, step = %stage, "Step: {stage}");
        match body.await {
            Ok(value) => {
                self.last_completed = Some(stage);
                Ok(value)
            }
            Err(reason) => Err(ShopError::FlowFailure {
                flow: FLOW,
                step: stage.to_string(),
                last_completed: self.last_completed.map(|s| s.to_string()),
                reason: Box::new(reason),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::Timeouts;
    use crate::mock::{MockSession, Storefront, DEMO_ORIGIN};
    use crate::registry::SelectorOverrides;
    use crate::result::ActionFailure;
    use crate::session::Driver;
    use std::sync::Arc;

    fn checkout(layout: CheckoutLayout, site: Storefront) -> CheckoutPage {
        let session = Arc::new(MockSession::with_site(DEMO_ORIGIN, site));
        let actions = Actions::new(
            Driver::new(session),
            DEMO_ORIGIN,
            Timeouts {
                default_ms: 1_000,
                ..Timeouts::default()
            },
        );
        let ctx = PageContext::new(actions, SelectorOverrides::default(), layout);
        CheckoutPage::new(&ctx).unwrap()
    }

    fn stocked(layout: CheckoutLayout) -> Storefront {
        Storefront::new(layout).with_cart_line("iphone-6s-16gb", 1)
    }

    mod stage_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_incomplete_address_blocks_payment() {
            let page = checkout(CheckoutLayout::MultiStep, stocked(CheckoutLayout::MultiStep));
            page.open().await.unwrap();
            assert!(page.is_checkout_page().await.unwrap());
            let partial = Address {
                first_name: Some("John".into()),
                ..Address::default()
            };
            page.fill_billing_address(&partial).await.unwrap();
            assert!(!page.can_proceed_to_payment().await.unwrap());
            assert!(page.has_validation_error().await.unwrap());
            assert!(page
                .validation_errors()
                .await
                .unwrap()
                .contains(&"Last name is required.".to_string()));
            let err = page.continue_billing().await.unwrap_err();
            assert_eq!(err.failure(), Some(ActionFailure::Disabled));
            assert_eq!(page.current_stage().await.unwrap(), CheckoutStage::BillingAddress);
        }

        #[tokio::test(start_paused = true)]
        async fn test_empty_cart_checkout_is_cart_stage() {
            let page = checkout(CheckoutLayout::MultiStep, Storefront::default());
            page.open().await.unwrap();
            assert_eq!(page.current_stage().await.unwrap(), CheckoutStage::Cart);
            assert!(page.has_validation_error().await.unwrap());
        }
    }

    mod flow_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_complete_checkout_multi_step_cod() {
            let page = checkout(CheckoutLayout::MultiStep, stocked(CheckoutLayout::MultiStep));
            page.open().await.unwrap();
            let order = page
                .complete_checkout(&Address::sample(), PaymentMethod::Cod, None)
                .await
                .unwrap();
            assert_eq!(order.order_id, "1001");
            assert_eq!(order.total, Some(Price::from_cents(54_900)));
            assert_eq!(page.current_stage().await.unwrap(), CheckoutStage::OrderComplete);
        }

        #[tokio::test(start_paused = true)]
        async fn test_complete_checkout_single_page_card() {
            let page = checkout(CheckoutLayout::SinglePage, stocked(CheckoutLayout::SinglePage));
            page.open().await.unwrap();
            let details = PaymentDetails::sample();
            let order = page
                .complete_checkout(&Address::sample(), PaymentMethod::CreditCard, Some(&details))
                .await
                .unwrap();
            assert_eq!(order.order_id, "1001");
            assert!(page.is_order_complete().await.unwrap());
        }

        #[tokio::test(start_paused = true)]
        async fn test_flow_failure_names_step() {
            let page = checkout(CheckoutLayout::MultiStep, stocked(CheckoutLayout::MultiStep));
            page.open().await.unwrap();
            let partial = Address {
                first_name: Some("John".into()),
                ..Address::default()
            };
            let err = page
                .complete_checkout(&partial, PaymentMethod::Cod, None)
                .await
                .unwrap_err();
            match err {
                ShopError::FlowFailure {
                    flow,
                    step,
                    last_completed,
                    reason,
                } => {
                    assert_eq!(flow, "checkout");
                    assert_eq!(step, "BillingAddress");
                    assert_eq!(last_completed.as_deref(), Some("Cart"));
                    assert_eq!(reason.failure(), Some(ActionFailure::Disabled));
                }
                other => panic!("expected FlowFailure, got {other:?}"),
            }
            assert!(!page.is_order_complete().await.unwrap());
        }

        #[tokio::test(start_paused = true)]
        async fn test_card_without_details_is_configuration() {
            let page = checkout(CheckoutLayout::MultiStep, stocked(CheckoutLayout::MultiStep));
            page.open().await.unwrap();
            let err = page
                .complete_checkout(&Address::sample(), PaymentMethod::CreditCard, None)
                .await
                .unwrap_err();
            let ShopError::FlowFailure { step, reason, .. } = err else {
                panic!("expected FlowFailure");
            };
            assert_eq!(step, "PaymentDetails");
            assert!(reason.is_configuration());
        }
    }
}
