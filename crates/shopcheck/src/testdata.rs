//! Scenario test data.
//!
//! Parameter sets live in `<data_dir>/<name>.json` (or `.yaml` / `.yml`) and
//! deserialize into the plain value objects from [`crate::model`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::model::{Address, Credentials, PaymentDetails, PaymentMethod};
use crate::result::{ShopError, ShopResult};

const EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Loader for data files under one directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestData {
    dir: PathBuf,
}

impl TestData {
    /// Loader rooted at `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the first existing file for `name`, trying each extension
    #[must_use]
    pub fn path(&self, name: &str) -> Option<PathBuf> {
        EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{name}.{ext}")))
            .find(|p| p.is_file())
    }

    /// Load and deserialize `name`.
    ///
    /// # Errors
    ///
    /// [`ShopError::TestData`] when no file exists or it does not parse.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> ShopResult<T> {
        let path = self.path(name).ok_or_else(|| ShopError::TestData {
            message: format!(
                "test data file not found: {}",
                self.dir.join(format!("{name}.json")).display()
            ),
        })?;
        debug!(path = %path.display(), "loading test data");
        let raw = std::fs::read_to_string(&path)?;
        let parsed = if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&raw).map_err(|e| e.to_string())
        } else {
            serde_yaml_ng::from_str(&raw).map_err(|e| e.to_string())
        };
        parsed.map_err(|e| ShopError::TestData {
            message: format!("{}: {e}", path.display()),
        })
    }

    /// Load `name`, or `fallback` when no file exists.
    ///
    /// # Errors
    ///
    /// [`ShopError::TestData`] when a file exists but does not parse.
    pub fn load_or<T: DeserializeOwned>(&self, name: &str, fallback: T) -> ShopResult<T> {
        if self.path(name).is_none() {
            return Ok(fallback);
        }
        self.load(name)
    }
}

/// Environment value with a default for unset or empty variables
#[must_use]
pub fn env_or(lookup: impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parameters for the checkout scenarios (`checkout.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutData {
    /// Billing address
    pub address: Address,
    /// Payment method
    pub payment_method: PaymentMethod,
    /// Card details for methods that need them
    pub payment_details: Option<PaymentDetails>,
}

impl Default for CheckoutData {
    fn default() -> Self {
        Self {
            address: Address::sample(),
            payment_method: PaymentMethod::Cod,
            payment_details: Some(PaymentDetails::sample()),
        }
    }
}

/// One row of the add-with-quantity scenario (`products.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuantity {
    /// Product URL slug
    pub slug: String,
    /// Units to add
    pub quantity: u32,
}

impl ProductQuantity {
    /// Built-in rows used when no data file exists
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                slug: "iphone-6s-16gb".to_string(),
                quantity: 1,
            },
            Self {
                slug: "samsung-galaxy-a5".to_string(),
                quantity: 2,
            },
        ]
    }
}

/// Credentials from `SHOP_USER` / `SHOP_PASSWORD`, falling back to the
/// demo administrator
#[must_use]
pub fn credentials_from_env(lookup: impl Fn(&str) -> Option<String>) -> Credentials {
    Credentials::new(
        env_or(&lookup, "SHOP_USER", "admin@simplcommerce.com"),
        env_or(&lookup, "SHOP_PASSWORD", "1qazZAQ!"),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        std::fs::write(dir.path().join(name), content).unwrap();
    }

    mod loader_tests {
        use super::*;

        #[test]
        fn test_load_json() {
            let dir = TempDir::new().unwrap();
            write(
                &dir,
                "checkout.json",
                r#"{"address":{"firstName":"Ada","city":"London"},"paymentMethod":"check"}"#,
            );
            let data: CheckoutData = TestData::new(dir.path()).load("checkout").unwrap();
            assert_eq!(data.address.first_name.as_deref(), Some("Ada"));
            assert_eq!(data.payment_method, PaymentMethod::Check);
            assert!(data.address.email.is_none());
        }

        #[test]
        fn test_load_yaml() {
            let dir = TempDir::new().unwrap();
            write(
                &dir,
                "products.yaml",
                "- slug: dell-xps-13\n  quantity: 3\n",
            );
            let rows: Vec<ProductQuantity> = TestData::new(dir.path()).load("products").unwrap();
            assert_eq!(rows[0].slug, "dell-xps-13");
            assert_eq!(rows[0].quantity, 3);
        }

        #[test]
        fn test_missing_file_names_path() {
            let dir = TempDir::new().unwrap();
            let err = TestData::new(dir.path())
                .load::<CheckoutData>("nope")
                .unwrap_err();
            assert!(matches!(err, ShopError::TestData { .. }));
            assert!(err.to_string().contains("nope.json"));
        }

        #[test]
        fn test_malformed_file_is_test_data_error() {
            let dir = TempDir::new().unwrap();
            write(&dir, "checkout.json", "{not json");
            let err = TestData::new(dir.path())
                .load::<CheckoutData>("checkout")
                .unwrap_err();
            assert!(matches!(err, ShopError::TestData { .. }));
        }

        #[test]
        fn test_load_or_falls_back() {
            let dir = TempDir::new().unwrap();
            let rows = TestData::new(dir.path())
                .load_or("products", ProductQuantity::defaults())
                .unwrap();
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[1].quantity, 2);
        }
    }

    mod env_tests {
        use super::*;

        #[test]
        fn test_env_or_default_on_empty() {
            let env: HashMap<&str, &str> = [("SHOP_USER", "")].into();
            let lookup = |k: &str| env.get(k).map(|v| (*v).to_string());
            assert_eq!(env_or(lookup, "SHOP_USER", "fallback"), "fallback");
        }

        #[test]
        fn test_credentials_from_env() {
            let env: HashMap<&str, &str> = [("SHOP_USER", "qa@example.com")].into();
            let creds = credentials_from_env(|k| env.get(k).map(|v| (*v).to_string()));
            assert_eq!(creds.email, "qa@example.com");
            assert_eq!(creds.password, "1qazZAQ!");
        }
    }
}
