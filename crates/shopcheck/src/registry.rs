//! Selector registries.
//!
//! Every page object owns one immutable [`SelectorRegistry`] mapping semantic
//! element names to fallback chains. Registries are built once from the
//! defaults in each page module and, optionally, overlaid with per-deployment
//! [`SelectorOverrides`] loaded from YAML:
//!
//! ```yaml
//! cart:
//!   checkout_button: "a.btn-checkout, button:has-text(\"Process to Checkout\")"
//! header:
//!   cart_count: ".cart-badge"
//! ```
//!
//! Overrides are applied at construction only. There is no runtime mutation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::locator::SelectorSpec;
use crate::result::{ShopError, ShopResult};

/// Builder for a page's selector registry
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    page: String,
    entries: Vec<(String, String)>,
}

impl RegistryBuilder {
    /// Start a registry for the named page
    #[must_use]
    pub fn new(page: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            entries: Vec::new(),
        }
    }

    /// Register a comma-separated fallback chain for an element
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, chain: impl Into<String>) -> Self {
        self.entries.push((name.into(), chain.into()));
        self
    }

    /// Parse every chain and freeze the registry
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Configuration`] for a duplicate name or a chain
    /// that does not parse.
    pub fn build(self) -> ShopResult<SelectorRegistry> {
        let mut specs = BTreeMap::new();
        for (name, chain) in self.entries {
            if specs.contains_key(&name) {
                return Err(ShopError::configuration(format!(
                    "{}: element '{name}' registered twice",
                    self.page
                )));
            }
            let spec = SelectorSpec::parse(name.clone(), &chain)?;
            let _ = specs.insert(name, spec);
        }
        Ok(SelectorRegistry {
            page: self.page,
            specs,
        })
    }
}

/// Immutable map from semantic element name to fallback chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorRegistry {
    page: String,
    specs: BTreeMap<String, SelectorSpec>,
}

impl SelectorRegistry {
    /// Start building a registry
    #[must_use]
    pub fn builder(page: impl Into<String>) -> RegistryBuilder {
        RegistryBuilder::new(page)
    }

    /// Page name this registry belongs to
    #[must_use]
    pub fn page(&self) -> &str {
        &self.page
    }

    /// Look up the chain for an element.
    ///
    /// # Errors
    ///
    /// An unknown name is a programmer error and yields
    /// [`ShopError::Configuration`].
    pub fn spec(&self, name: &str) -> ShopResult<&SelectorSpec> {
        self.specs.get(name).ok_or_else(|| {
            ShopError::configuration(format!("{}: unknown element '{name}'", self.page))
        })
    }

    /// Whether an element is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    /// Registered element names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.specs.keys().map(String::as_str).collect()
    }

    /// Iterate over all chains, sorted by name
    pub fn iter(&self) -> impl Iterator<Item = &SelectorSpec> {
        self.specs.values()
    }

    /// Number of registered elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether the registry has no elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Produce a new registry with this page's overrides applied.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Configuration`] if an override names an element
    /// this page does not define, or its chain does not parse.
    pub fn with_overrides(&self, overrides: &SelectorOverrides) -> ShopResult<Self> {
        let Some(page_overrides) = overrides.for_page(&self.page) else {
            return Ok(self.clone());
        };
        let mut specs = self.specs.clone();
        for (name, chain) in page_overrides {
            if !specs.contains_key(name) {
                return Err(ShopError::configuration(format!(
                    "override for {}: unknown element '{name}'",
                    self.page
                )));
            }
            tracing::debug!(page = %self.page, element = %name, chain = %chain, "selector override");
            let _ = specs.insert(name.clone(), SelectorSpec::parse(name.clone(), chain)?);
        }
        Ok(Self {
            page: self.page.clone(),
            specs,
        })
    }
}

/// Per-deployment selector overrides: `page → element → chain`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectorOverrides {
    pages: BTreeMap<String, BTreeMap<String, String>>,
}

impl SelectorOverrides {
    /// Empty override set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one override
    #[must_use]
    pub fn with(
        mut self,
        page: impl Into<String>,
        element: impl Into<String>,
        chain: impl Into<String>,
    ) -> Self {
        let _ = self
            .pages
            .entry(page.into())
            .or_default()
            .insert(element.into(), chain.into());
        self
    }

    /// Parse overrides from a YAML document
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Yaml`] if the document is malformed.
    pub fn from_yaml_str(yaml: &str) -> ShopResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load overrides from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an I/O or YAML error.
    pub fn load(path: &Path) -> ShopResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    /// Overrides for one page
    #[must_use]
    pub fn for_page(&self, page: &str) -> Option<&BTreeMap<String, String>> {
        self.pages.get(page)
    }

    /// Page names that have overrides
    pub fn pages(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    /// Whether there are no overrides
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::locator::Selector;

    fn cart_registry() -> SelectorRegistry {
        SelectorRegistry::builder("cart")
            .with("checkout_button", "a:has-text(\"Checkout\"), .checkout-link")
            .with("empty_message", "text=There are no items in this cart")
            .build()
            .unwrap()
    }

    mod builder_tests {
        use super::*;

        #[test]
        fn test_build_and_lookup() {
            let reg = cart_registry();
            assert_eq!(reg.page(), "cart");
            assert_eq!(reg.len(), 2);
            assert_eq!(reg.spec("checkout_button").unwrap().len(), 2);
            assert_eq!(reg.names(), vec!["checkout_button", "empty_message"]);
        }

        #[test]
        fn test_unknown_name_is_configuration_error() {
            let err = cart_registry().spec("bogus").unwrap_err();
            assert!(err.is_configuration());
            assert!(err.to_string().contains("bogus"));
        }

        #[test]
        fn test_duplicate_name_rejected() {
            let err = SelectorRegistry::builder("home")
                .with("logo", ".logo")
                .with("logo", ".brand")
                .build()
                .unwrap_err();
            assert!(err.is_configuration());
        }

        #[test]
        fn test_empty_chain_rejected() {
            assert!(SelectorRegistry::builder("home")
                .with("logo", "")
                .build()
                .is_err());
        }
    }

    mod override_tests {
        use super::*;

        #[test]
        fn test_override_replaces_chain_in_new_registry() {
            let base = cart_registry();
            let overrides = SelectorOverrides::new().with("cart", "checkout_button", ".btn-order");
            let patched = base.with_overrides(&overrides).unwrap();

            assert_eq!(
                patched.spec("checkout_button").unwrap().candidates(),
                &[Selector::css(".btn-order")]
            );
            // original untouched
            assert_eq!(base.spec("checkout_button").unwrap().len(), 2);
        }

        #[test]
        fn test_overrides_for_other_pages_ignored() {
            let base = cart_registry();
            let overrides = SelectorOverrides::new().with("home", "logo", ".x");
            assert_eq!(base.with_overrides(&overrides).unwrap(), base);
        }

        #[test]
        fn test_unknown_override_element_rejected() {
            let overrides = SelectorOverrides::new().with("cart", "nope", ".x");
            let err = cart_registry().with_overrides(&overrides).unwrap_err();
            assert!(err.is_configuration());
        }

        #[test]
        fn test_yaml_overrides() {
            let yaml = "cart:\n  checkout_button: \".a, .b\"\nheader:\n  cart_count: .badge\n";
            let overrides = SelectorOverrides::from_yaml_str(yaml).unwrap();
            assert_eq!(overrides.pages().collect::<Vec<_>>(), vec!["cart", "header"]);
            assert_eq!(
                overrides.for_page("cart").unwrap()["checkout_button"],
                ".a, .b"
            );
        }

        #[test]
        fn test_empty_yaml_is_empty_overrides() {
            assert!(SelectorOverrides::from_yaml_str("  \n").unwrap().is_empty());
        }

        #[test]
        fn test_load_from_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("selectors.yaml");
            std::fs::write(&path, "cart:\n  empty_message: .empty\n").unwrap();
            let overrides = SelectorOverrides::load(&path).unwrap();
            let patched = cart_registry().with_overrides(&overrides).unwrap();
            assert_eq!(
                patched.spec("empty_message").unwrap().candidates()[0],
                Selector::css(".empty")
            );
        }
    }
}
