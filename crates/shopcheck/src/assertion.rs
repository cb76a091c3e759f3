//! Assertions for scenario checks.
//!
//! Every helper returns an [`AssertionResult`]; `into_result()` turns a
//! failure into [`ShopError::Assertion`] so scenarios can use `?`.

use std::fmt::Debug;

use crate::result::{ShopError, ShopResult};

/// Result of an assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    /// Whether the assertion passed
    pub passed: bool,
    /// Human-readable message
    pub message: String,
}

impl AssertionResult {
    /// Create a passing assertion result
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            passed: true,
            message: String::new(),
        }
    }

    /// Create a failing assertion result
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }

    /// Prefix the failure message with what was being checked
    #[must_use]
    pub fn context(mut self, what: &str) -> Self {
        if !self.passed {
            self.message = format!("{what}: {}", self.message);
        }
        self
    }

    /// Convert to a result
    ///
    /// # Errors
    ///
    /// [`ShopError::Assertion`] carrying the message when the assertion failed.
    pub fn into_result(self) -> ShopResult<()> {
        if self.passed {
            Ok(())
        } else {
            Err(ShopError::assertion(self.message))
        }
    }
}

/// Assertion helpers for scenarios
#[derive(Debug, Clone, Copy)]
pub struct Assertion;

impl Assertion {
    /// Assert two values are equal
    #[must_use]
    pub fn equals<T: PartialEq + Debug>(expected: &T, actual: &T) -> AssertionResult {
        if expected == actual {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected {expected:?}, got {actual:?}"))
        }
    }

    /// Assert a string contains a substring
    #[must_use]
    pub fn contains(haystack: &str, needle: &str) -> AssertionResult {
        if haystack.contains(needle) {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected '{haystack}' to contain '{needle}'"))
        }
    }

    /// Assert a string matches a regular expression
    #[must_use]
    pub fn matches(text: &str, pattern: &str) -> AssertionResult {
        match regex::Regex::new(pattern) {
            Ok(re) if re.is_match(text) => AssertionResult::pass(),
            Ok(_) => AssertionResult::fail(format!("expected '{text}' to match /{pattern}/")),
            Err(e) => AssertionResult::fail(format!("bad pattern /{pattern}/: {e}")),
        }
    }

    /// Assert a condition is true
    #[must_use]
    pub fn is_true(condition: bool, message: &str) -> AssertionResult {
        if condition {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(message)
        }
    }

    /// Assert a condition is false
    #[must_use]
    pub fn is_false(condition: bool, message: &str) -> AssertionResult {
        Self::is_true(!condition, message)
    }

    /// Assert `value >= min`
    #[must_use]
    pub fn at_least<T: PartialOrd + Debug>(value: &T, min: &T) -> AssertionResult {
        if value >= min {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected at least {min:?}, got {value:?}"))
        }
    }

    /// Assert an Option is Some
    #[must_use]
    pub fn is_some<T>(opt: &Option<T>) -> AssertionResult {
        if opt.is_some() {
            AssertionResult::pass()
        } else {
            AssertionResult::fail("expected Some, got None")
        }
    }

    /// Assert a collection has expected length
    #[must_use]
    pub fn has_length<T>(collection: &[T], expected: usize) -> AssertionResult {
        if collection.len() == expected {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!(
                "expected length {expected}, got {}",
                collection.len()
            ))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_equals() {
        assert!(Assertion::equals(&2, &2).passed);
        let failed = Assertion::equals(&"cart", &"home");
        assert!(!failed.passed);
        assert_eq!(failed.message, r#"expected "cart", got "home""#);
    }

    #[test]
    fn test_contains_and_matches() {
        assert!(Assertion::contains("Shopping Cart - SimplCommerce", "Cart").passed);
        assert!(!Assertion::contains("Home", "Cart").passed);
        assert!(Assertion::matches("https://demo.simplcommerce.com/cart", r"/cart$").passed);
        assert!(!Assertion::matches("x", "(").passed);
    }

    #[test]
    fn test_at_least() {
        assert!(Assertion::at_least(&3, &1).passed);
        assert!(!Assertion::at_least(&0, &1).passed);
    }

    #[test]
    fn test_into_result_with_context() {
        assert!(Assertion::is_true(true, "never").into_result().is_ok());
        let err = Assertion::is_false(true, "badge shown")
            .context("empty cart")
            .into_result()
            .unwrap_err();
        assert!(matches!(err, ShopError::Assertion { .. }));
        assert_eq!(err.to_string(), "Assertion failed: empty cart: badge shown");
    }

    #[test]
    fn test_has_length_and_is_some() {
        assert!(Assertion::has_length(&[1, 2], 2).passed);
        assert!(!Assertion::has_length::<u8>(&[], 1).passed);
        assert!(!Assertion::is_some::<u8>(&None).passed);
    }
}
