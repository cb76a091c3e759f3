//! Login page.

use tracing::info;

use super::{PageContext, PageObject};
use crate::facade::Actions;
use crate::model::Credentials;
use crate::registry::{RegistryBuilder, SelectorRegistry};
use crate::result::ShopResult;

/// Customer login form
#[derive(Debug, Clone)]
pub struct LoginPage {
    actions: Actions,
    registry: SelectorRegistry,
}

impl LoginPage {
    /// Default selector chains
    #[must_use]
    pub fn selectors() -> RegistryBuilder {
        RegistryBuilder::new("login")
            .with("email", r#"#Email, input[name="Email"], [data-testid="username"]"#)
            .with(
                "password",
                r#"#Password, input[name="Password"], [data-testid="password"]"#,
            )
            .with(
                "submit",
                r#"button:has-text("Log in"), input[type="submit"], [data-testid="login-button"]"#,
            )
            .with("error", ".text-danger, .validation-summary-errors, .alert-danger")
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

    /// Navigate to the login page
    ///
    /// # Errors
    ///
    /// Navigation failures.
    pub async fn open(&self) -> ShopResult<()> {
        self.actions.navigate_to("/login").await
    }

    /// Fill the form and submit it.
    ///
    /// Does not check the outcome; rejected credentials leave the browser
    /// on the login page with [`LoginPage::error_message`] set.
    ///
    /// # Errors
    ///
    /// Action failures.
    pub async fn login(&self, credentials: &Credentials) -> ShopResult<()> {
        info!(user = %credentials.email, "log in");
        self.actions.fill(self.element("email")?, &credentials.email).await?;
        self.actions
            .fill(self.element("password")?, &credentials.password)
            .await?;
        self.actions.click(self.element("submit")?).await
    }

    /// Error text shown after a rejected attempt
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn error_message(&self) -> ShopResult<Option<String>> {
        let error = self.element("error")?;
        if !self.actions.is_present(error).await? {
            return Ok(None);
        }
        self.actions.read_text(error).await.map(Some)
    }

    /// Whether an error is shown
    ///
    /// # Errors
    ///
    /// Session failures.
    pub async fn is_error_visible(&self) -> ShopResult<bool> {
        self.actions.is_present(self.element("error")?).await
    }
}

impl PageObject for LoginPage {
    fn url_pattern(&self) -> &str {
        "/login"
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
    use crate::mock::{MockSession, Storefront, DEMO_ADMIN, DEMO_ORIGIN};
    use crate::model::CheckoutLayout;
    use crate::pages::Header;
    use crate::registry::SelectorOverrides;
    use crate::session::Driver;
    use std::sync::Arc;

    fn context() -> PageContext {
        let session = Arc::new(MockSession::with_site(DEMO_ORIGIN, Storefront::default()));
        let actions = Actions::new(Driver::new(session), DEMO_ORIGIN, Timeouts::default());
        PageContext::new(actions, SelectorOverrides::default(), CheckoutLayout::MultiStep)
    }

    #[tokio::test(start_paused = true)]
    async fn test_valid_login_shows_user_menu() {
        let ctx = context();
        let login = LoginPage::new(&ctx).unwrap();
        let header = Header::new(&ctx).unwrap();
        login.open().await.unwrap();
        login
            .login(&Credentials::new(DEMO_ADMIN.0, DEMO_ADMIN.1))
            .await
            .unwrap();
        assert!(header.is_logged_in().await.unwrap());
        assert_eq!(header.page_url().await.unwrap(), "https://demo.simplcommerce.com/");
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_password_shows_error() {
        let ctx = context();
        let login = LoginPage::new(&ctx).unwrap();
        login.open().await.unwrap();
        assert_eq!(login.error_message().await.unwrap(), None);
        login
            .login(&Credentials::new(DEMO_ADMIN.0, "wrong"))
            .await
            .unwrap();
        assert!(login.is_error_visible().await.unwrap());
        assert_eq!(
            login.error_message().await.unwrap().as_deref(),
            Some("Invalid login attempt.")
        );
    }
}
