//! Flat in-memory document model and selector matching.
//!
//! A [`MockPage`] is a list of [`MockElement`]s in document order. Each element
//! names its parent by key and lists the CSS strings it answers to. CSS is
//! matched as opaque tokens: an element matches `".cart-item"` or `"h4 a"` only
//! if it lists that exact string (or its tag name). Text filters, `text=`,
//! roles and `xpath=..` are evaluated for real.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::locator::Selector;

/// One element in a mock page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    /// Page-unique key
    pub key: String,
    /// Tag name
    pub tag: String,
    /// CSS strings this element matches
    pub selectors: Vec<String>,
    /// Parent key
    pub parent: Option<String>,
    /// Own text (descendant text is added when reading)
    pub text: String,
    /// Form value
    pub value: Option<String>,
    /// Rendered and visible
    pub visible: bool,
    /// Not disabled
    pub enabled: bool,
    /// Path navigated to when clicked or submitted (static pages only)
    pub navigates_to: Option<String>,
    /// Attached only after this delay (static pages only)
    pub appears_after: Option<Duration>,
    /// Detached after this delay (static pages only)
    pub disappears_after: Option<Duration>,
}

impl MockElement {
    /// Create a visible, enabled element
    #[must_use]
    pub fn new(key: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            tag: tag.into(),
            selectors: Vec::new(),
            parent: None,
            text: String::new(),
            value: None,
            visible: true,
            enabled: true,
            navigates_to: None,
            appears_after: None,
            disappears_after: None,
        }
    }

    /// Add a CSS string this element matches
    #[must_use]
    pub fn matching(mut self, css: impl Into<String>) -> Self {
        self.selectors.push(css.into());
        self
    }

    /// Set the parent element
    #[must_use]
    pub fn child_of(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set own text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set form value
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Mark invisible
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Set enabled state
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Navigate when clicked
    #[must_use]
    pub fn navigates_to(mut self, path: impl Into<String>) -> Self {
        self.navigates_to = Some(path.into());
        self
    }

    /// Attach after a delay
    #[must_use]
    pub const fn appears_after(mut self, delay: Duration) -> Self {
        self.appears_after = Some(delay);
        self
    }

    /// Detach after a delay
    #[must_use]
    pub const fn disappears_after(mut self, delay: Duration) -> Self {
        self.disappears_after = Some(delay);
        self
    }

    fn matches_css(&self, css: &str) -> bool {
        css == "*" || self.tag == css || self.selectors.iter().any(|s| s == css)
    }
}

/// A rendered mock page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockPage {
    /// Document title
    pub title: String,
    /// Elements in document order
    pub elements: Vec<MockElement>,
}

impl MockPage {
    /// Create an empty page
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            elements: Vec::new(),
        }
    }

    /// Append an element
    pub fn push(&mut self, element: MockElement) {
        self.elements.push(element);
    }

    /// Builder-style append
    #[must_use]
    pub fn with(mut self, element: MockElement) -> Self {
        self.push(element);
        self
    }

    /// Element by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MockElement> {
        self.elements.iter().find(|e| e.key == key)
    }

    /// Whether `key` sits strictly beneath `ancestor`
    #[must_use]
    pub fn is_descendant(&self, key: &str, ancestor: &str) -> bool {
        let parents = self.parent_map();
        let mut current = parents.get(key).copied().flatten();
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = parents.get(p).copied().flatten();
        }
        false
    }

    /// Own text plus all descendant text, whitespace-joined and trimmed
    #[must_use]
    pub fn full_text(&self, key: &str) -> String {
        let mut parts = Vec::new();
        for el in &self.elements {
            if (el.key == key || self.is_descendant(&el.key, key)) && !el.text.is_empty() {
                parts.push(el.text.trim());
            }
        }
        parts.join(" ")
    }

    /// Visible itself and through every ancestor
    #[must_use]
    pub fn is_visible(&self, key: &str) -> bool {
        let mut current = self.get(key);
        while let Some(el) = current {
            if !el.visible {
                return false;
            }
            current = el.parent.as_deref().and_then(|p| self.get(p));
        }
        true
    }

    /// Keys matching `selector` beneath `scope`, in document order
    #[must_use]
    pub fn query(&self, selector: &Selector, scope: Option<&str>) -> Vec<String> {
        let in_scope = |el: &&MockElement| scope.map_or(true, |s| self.is_descendant(&el.key, s));

        let keys: Vec<&MockElement> = match selector {
            Selector::Css(css) => self
                .elements
                .iter()
                .filter(in_scope)
                .filter(|e| e.matches_css(css))
                .collect(),
            Selector::Text(text) => self
                .elements
                .iter()
                .filter(in_scope)
                .filter(|e| self.full_text(&e.key).contains(text.as_str()))
                .filter(|e| {
                    !self
                        .children(&e.key)
                        .any(|c| self.full_text(&c.key).contains(text.as_str()))
                })
                .collect(),
            Selector::XPath(expr) if expr == ".." => scope
                .and_then(|s| self.get(s))
                .and_then(|e| e.parent.as_deref())
                .and_then(|p| self.get(p))
                .into_iter()
                .collect(),
            Selector::XPath(expr) => {
                let token = format!("xpath={expr}");
                self.elements
                    .iter()
                    .filter(in_scope)
                    .filter(|e| e.matches_css(&token))
                    .collect()
            }
            Selector::Role { role, name } => self
                .elements
                .iter()
                .filter(in_scope)
                .filter(|e| implicit_role(&e.tag) == Some(role.as_str()) || e.matches_css(&format!("role={role}")))
                .filter(|e| {
                    name.as_deref().map_or(true, |n| {
                        self.full_text(&e.key).contains(n)
                            || e.value.as_deref().is_some_and(|v| v.contains(n))
                    })
                })
                .collect(),
            Selector::CssWithText {
                css,
                text,
                descendant,
            } => {
                let bases: Vec<&MockElement> = self
                    .elements
                    .iter()
                    .filter(in_scope)
                    .filter(|e| e.matches_css(css))
                    .filter(|e| self.full_text(&e.key).contains(text.as_str()))
                    .collect();
                match descendant {
                    None => bases,
                    Some(desc) => {
                        let hits: HashSet<String> = bases
                            .iter()
                            .flat_map(|b| self.query(desc, Some(&b.key)))
                            .collect();
                        self.elements
                            .iter()
                            .filter(|e| hits.contains(&e.key))
                            .collect()
                    }
                }
            }
        };
        keys.into_iter().map(|e| e.key.clone()).collect()
    }

    fn children<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a MockElement> + 'a {
        self.elements
            .iter()
            .filter(move |e| e.parent.as_deref() == Some(key))
    }

    fn parent_map(&self) -> HashMap<&str, Option<&str>> {
        self.elements
            .iter()
            .map(|e| (e.key.as_str(), e.parent.as_deref()))
            .collect()
    }
}

fn implicit_role(tag: &str) -> Option<&'static str> {
    match tag {
        "button" => Some("button"),
        "a" => Some("link"),
        "input" | "textarea" => Some("textbox"),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some("heading"),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn grid() -> MockPage {
        MockPage::new("Grid")
            .with(MockElement::new("list", "div").matching(".product-list"))
            .with(MockElement::new("item1", "div").matching(".product-item").child_of("list"))
            .with(MockElement::new("h1", "h4").child_of("item1"))
            .with(
                MockElement::new("a1", "a")
                    .matching("h4 a")
                    .child_of("h1")
                    .text("iPhone 6s 16GB"),
            )
            .with(MockElement::new("item2", "div").matching(".product-item").child_of("list"))
            .with(MockElement::new("h2", "h4").child_of("item2"))
            .with(
                MockElement::new("a2", "a")
                    .matching("h4 a")
                    .child_of("h2")
                    .text("Samsung Galaxy A5"),
            )
            .with(MockElement::new("hidden", "div").matching(".modal").hidden())
            .with(MockElement::new("inner", "button").child_of("hidden").text("Continue shopping"))
    }

    #[test]
    fn test_css_tokens_in_document_order() {
        let page = grid();
        assert_eq!(
            page.query(&Selector::css(".product-item"), None),
            vec!["item1", "item2"]
        );
        assert_eq!(page.query(&Selector::css("h4 a"), Some("item2")), vec!["a2"]);
    }

    #[test]
    fn test_has_text_with_descendant() {
        let page = grid();
        let sel = Selector::parse("h4:has-text(\"Samsung\") a").unwrap();
        assert_eq!(page.query(&sel, None), vec!["a2"]);
    }

    #[test]
    fn test_chained_has_text_scopes_each_step() {
        let page = MockPage::new("Cart")
            .with(MockElement::new("items", "table").text("Product Price"))
            .with(MockElement::new("items-td", "td").child_of("items").text("Subtotal"))
            .with(MockElement::new("summary", "table").text("Order summary"))
            .with(MockElement::new("tr1", "tr").child_of("summary"))
            .with(MockElement::new("label", "td").child_of("tr1").text("Subtotal"))
            .with(MockElement::new("amount", "td").child_of("tr1").text("$549.00"));
        let sel =
            Selector::parse("table:has-text(\"Order summary\") td:has-text(\"Subtotal\")").unwrap();
        assert_eq!(page.query(&sel, None), vec!["label"]);
    }

    #[test]
    fn test_text_selects_deepest() {
        let page = grid();
        assert_eq!(page.query(&Selector::text("iPhone"), None), vec!["a1"]);
    }

    #[test]
    fn test_parent_xpath() {
        let page = grid();
        assert_eq!(page.query(&Selector::xpath(".."), Some("a1")), vec!["h1"]);
    }

    #[test]
    fn test_role_with_name() {
        let page = grid();
        let sel = Selector::role("button", Some("Continue"));
        assert_eq!(page.query(&sel, None), vec!["inner"]);
    }

    #[test]
    fn test_visibility_inherits() {
        let page = grid();
        assert!(!page.is_visible("inner"));
        assert!(page.is_visible("a1"));
    }

    #[test]
    fn test_full_text_includes_descendants() {
        assert_eq!(grid().full_text("item1"), "iPhone 6s 16GB");
    }
}
