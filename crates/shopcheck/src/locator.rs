//! Selectors and fallback chains.
//!
//! A [`Selector`] is one locator expression; a [`SelectorSpec`] is the ordered
//! fallback chain registered for one semantic element. Chains are written the
//! way storefront page objects have always written them, as comma-separated
//! strings (`".cart-btn, .cart-icon"`), and parsed once into typed candidates.
//!
//! # Design Philosophy
//!
//! - **Data, not call sites**: a chain is a value that can be unit-tested
//!   without a browser
//! - **Order is preference**: the first candidate that matches wins
//! - **Dialects**: plain CSS, `text=`, `xpath=`, `role=` and `:has-text()`

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::result::{ShopError, ShopResult};

/// Placeholder substituted by [`SelectorSpec::bind`]
pub const NAME_PLACEHOLDER: &str = "{name}";

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// XPath expression, evaluated relative to the scope
    XPath(String),
    /// Smallest element whose text contains the string
    Text(String),
    /// ARIA role with optional accessible name
    Role {
        /// Role name (button, link, textbox, ...)
        role: String,
        /// Accessible name filter
        name: Option<String>,
    },
    /// CSS selector filtered by text content, optionally followed by a
    /// descendant selector (`h4:has-text("iPhone") a`). The descendant may
    /// itself filter by text (`table:has-text("Order") td:has-text("Total")`).
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
        /// Descendant selector applied beneath each filtered match; always
        /// [`Selector::Css`] or [`Selector::CssWithText`]
        descendant: Option<Box<Selector>>,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Create a role selector
    #[must_use]
    pub fn role(role: impl Into<String>, name: Option<&str>) -> Self {
        Self::Role {
            role: role.into(),
            name: name.map(str::to_string),
        }
    }

    /// Create a CSS selector filtered by text
    #[must_use]
    pub fn css_with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::CssWithText {
            css: css.into(),
            text: text.into(),
            descendant: None,
        }
    }

    /// Parse a single locator expression.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Configuration`] for empty input, unterminated
    /// quotes, or a non-CSS descendant after `:has-text()`.
    pub fn parse(input: &str) -> ShopResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ShopError::configuration("empty selector"));
        }

        if let Some(rest) = input.strip_prefix("text=") {
            return Ok(Self::Text(unquoted(rest.trim())));
        }
        if let Some(rest) = input.strip_prefix("xpath=") {
            return Ok(Self::XPath(rest.trim().to_string()));
        }
        if let Some(rest) = input.strip_prefix("role=") {
            return parse_role(rest.trim());
        }
        if let Some(idx) = input.find(":has-text(") {
            return parse_has_text(input, idx);
        }

        Ok(Self::Css(input.to_string()))
    }

    /// Replace [`NAME_PLACEHOLDER`] in every string field
    #[must_use]
    pub fn substitute(&self, value: &str) -> Self {
        let sub = |s: &str| s.replace(NAME_PLACEHOLDER, value);
        match self {
            Self::Css(s) => Self::Css(sub(s)),
            Self::XPath(s) => Self::XPath(sub(s)),
            Self::Text(s) => Self::Text(sub(s)),
            Self::Role { role, name } => Self::Role {
                role: sub(role),
                name: name.as_deref().map(sub),
            },
            Self::CssWithText {
                css,
                text,
                descendant,
            } => Self::CssWithText {
                css: sub(css),
                text: sub(text),
                descendant: descendant.as_ref().map(|d| Box::new(d.substitute(value))),
            },
        }
    }

    /// JavaScript expression evaluating to an `Array` of matching elements,
    /// in document order, searched beneath `scope` (a JS expression).
    #[must_use]
    pub fn to_js(&self, scope: &str) -> String {
        match self {
            Self::Css(s) => format!("Array.from({scope}.querySelectorAll({}))", js_str(s)),
            Self::XPath(x) => format!(
                "(() => {{ const r = document.evaluate({}, {scope}, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; \
                 for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); \
                 return out; }})()",
                js_str(x)
            ),
            Self::Text(t) => format!(
                "Array.from({scope}.querySelectorAll('*')).filter(el => \
                 el.textContent.includes({t}) && \
                 !Array.from(el.children).some(c => c.textContent.includes({t})))",
                t = js_str(t)
            ),
            Self::Role { role, name } => {
                let base = format!(
                    "Array.from({scope}.querySelectorAll({}))",
                    js_str(&role_css(role))
                );
                match name {
                    Some(n) => format!(
                        "{base}.filter(el => ((el.getAttribute('aria-label') || '') + ' ' + \
                         (el.textContent || '') + ' ' + (el.value || '')).includes({}))",
                        js_str(n)
                    ),
                    None => base,
                }
            }
            Self::CssWithText {
                css,
                text,
                descendant,
            } => {
                let filtered = format!(
                    "Array.from({scope}.querySelectorAll({})).filter(el => el.textContent.includes({}))",
                    js_str(css),
                    js_str(text)
                );
                match descendant {
                    Some(d) => format!(
                        "{filtered}.flatMap(el => {}).filter((el, i, all) => all.indexOf(el) === i)",
                        d.to_js("el")
                    ),
                    None => filtered,
                }
            }
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => f.write_str(s),
            Self::XPath(x) => write!(f, "xpath={x}"),
            Self::Text(t) if is_bare_text(t) => write!(f, "text={t}"),
            Self::Text(t) => write!(f, "text={}", quoted(t)),
            Self::Role { role, name: None } => write!(f, "role={role}"),
            Self::Role {
                role,
                name: Some(n),
            } => write!(f, "role={role}[name={}]", quoted(n)),
            Self::CssWithText {
                css,
                text,
                descendant,
            } => {
                write!(f, "{css}:has-text({})", quoted(text))?;
                if let Some(d) = descendant {
                    write!(f, " {d}")?;
                }
                Ok(())
            }
        }
    }
}

impl Serialize for Selector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Selector {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn role_css(role: &str) -> String {
    match role {
        "button" => "button, [role=button], input[type=submit], input[type=button]".to_string(),
        "link" => "a[href], [role=link]".to_string(),
        "textbox" => {
            "input:not([type]), input[type=text], input[type=email], textarea, [role=textbox]"
                .to_string()
        }
        "checkbox" => "input[type=checkbox], [role=checkbox]".to_string(),
        "radio" => "input[type=radio], [role=radio]".to_string(),
        "heading" => "h1, h2, h3, h4, h5, h6, [role=heading]".to_string(),
        other => format!("[role={other}]"),
    }
}

/// `s` in double quotes with `\` and `"` backslash-escaped
fn quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Inverse of [`quoted`] for either quote style; bare input is kept as is
fn unquoted(s: &str) -> String {
    let Some(first @ ('"' | '\'')) = s.chars().next() else {
        return s.to_string();
    };
    if s.len() < 2 || !s.ends_with(first) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;
    for c in s[1..s.len() - 1].chars() {
        if escaped {
            out.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else {
            out.push(c);
        }
    }
    out
}

/// Text that survives `text=` and fallback splitting without quotes
fn is_bare_text(t: &str) -> bool {
    !t.is_empty()
        && t.trim() == t
        && !t.contains(|c| matches!(c, ',' | '"' | '\'' | '\\' | '(' | ')' | '[' | ']'))
}

fn parse_role(rest: &str) -> ShopResult<Selector> {
    let Some(open) = rest.find('[') else {
        return Ok(Selector::role(rest, None));
    };
    let role = rest[..open].trim();
    let attrs = rest[open..]
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| ShopError::configuration(format!("unterminated role filter: {rest}")))?;
    let name = attrs
        .trim()
        .strip_prefix("name=")
        .ok_or_else(|| ShopError::configuration(format!("unsupported role filter: {attrs}")))?;
    Ok(Selector::role(role, Some(&unquoted(name.trim()))))
}

fn parse_has_text(input: &str, idx: usize) -> ShopResult<Selector> {
    let css = input[..idx].trim();
    let css = if css.is_empty() { "*" } else { css };
    let after = &input[idx + ":has-text(".len()..];

    let mut chars = after.char_indices();
    let quote = match chars.next() {
        Some((_, q @ ('"' | '\''))) => q,
        _ => {
            return Err(ShopError::configuration(format!(
                ":has-text() expects a quoted argument: {input}"
            )))
        }
    };

    let mut text = String::new();
    let mut escaped = false;
    let mut close = None;
    for (i, c) in chars {
        if escaped {
            text.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            close = Some(i);
            break;
        } else {
            text.push(c);
        }
    }
    let close = close
        .ok_or_else(|| ShopError::configuration(format!("unterminated quote in: {input}")))?;

    let tail = after[close + 1..]
        .strip_prefix(')')
        .ok_or_else(|| ShopError::configuration(format!("missing ')' in: {input}")))?
        .trim();

    let descendant = if tail.is_empty() {
        None
    } else {
        match Selector::parse(tail)? {
            d @ (Selector::Css(_) | Selector::CssWithText { .. }) => Some(Box::new(d)),
            _ => {
                return Err(ShopError::configuration(format!(
                    "descendant after :has-text() must be CSS: {input}"
                )))
            }
        }
    };

    Ok(Selector::CssWithText {
        css: css.to_string(),
        text,
        descendant,
    })
}

/// Split a comma-separated fallback string into candidate expressions.
///
/// Commas inside quotes, brackets or parentheses do not split.
#[must_use]
pub fn split_fallbacks(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(_), _) if escaped => escaped = false,
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(input[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(input[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

/// Ordered fallback chain for one semantic element.
///
/// Immutable once built; the first candidate that resolves wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorSpec {
    name: String,
    candidates: Vec<Selector>,
}

impl SelectorSpec {
    /// Create a spec from explicit candidates
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Configuration`] if `candidates` is empty.
    pub fn new(name: impl Into<String>, candidates: Vec<Selector>) -> ShopResult<Self> {
        let name = name.into();
        if candidates.is_empty() {
            return Err(ShopError::configuration(format!(
                "selector chain for '{name}' is empty"
            )));
        }
        Ok(Self { name, candidates })
    }

    /// Parse a comma-separated fallback chain
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Configuration`] if the chain is empty or any
    /// candidate fails to parse.
    pub fn parse(name: impl Into<String>, chain: &str) -> ShopResult<Self> {
        let name = name.into();
        let candidates = split_fallbacks(chain)
            .into_iter()
            .map(Selector::parse)
            .collect::<ShopResult<Vec<_>>>()
            .map_err(|e| ShopError::configuration(format!("'{name}': {e}")))?;
        Self::new(name, candidates)
    }

    /// Semantic element name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Candidates in priority order
    #[must_use]
    pub fn candidates(&self) -> &[Selector] {
        &self.candidates
    }

    /// Number of candidates
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Always false for a constructed spec
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Substitute [`NAME_PLACEHOLDER`] in every candidate, producing a new spec
    #[must_use]
    pub fn bind(&self, value: &str) -> Self {
        Self {
            name: format!("{}[{value}]", self.name),
            candidates: self.candidates.iter().map(|c| c.substitute(value)).collect(),
        }
    }
}

impl fmt::Display for SelectorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.candidates.iter().map(ToString::to_string).collect();
        f.write_str(&joined.join(", "))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod parse_tests {
        use super::*;

        #[test]
        fn test_plain_css() {
            assert_eq!(
                Selector::parse(".cart-btn").unwrap(),
                Selector::css(".cart-btn")
            );
            assert_eq!(
                Selector::parse("  input[name=\"Query\"] ").unwrap(),
                Selector::css("input[name=\"Query\"]")
            );
        }

        #[test]
        fn test_text_prefix() {
            assert_eq!(
                Selector::parse("text=There are no items in this cart").unwrap(),
                Selector::text("There are no items in this cart")
            );
            assert_eq!(
                Selector::parse("text=\"Quoted\"").unwrap(),
                Selector::text("Quoted")
            );
        }

        #[test]
        fn test_xpath_prefix() {
            assert_eq!(Selector::parse("xpath=..").unwrap(), Selector::xpath(".."));
        }

        #[test]
        fn test_role() {
            assert_eq!(
                Selector::parse("role=button[name=Checkout]").unwrap(),
                Selector::role("button", Some("Checkout"))
            );
            assert_eq!(
                Selector::parse("role=link").unwrap(),
                Selector::role("link", None)
            );
            assert!(Selector::parse("role=button[name=Checkout").is_err());
            assert!(Selector::parse("role=button[level=2]").is_err());
        }

        #[test]
        fn test_has_text() {
            assert_eq!(
                Selector::parse("a:has-text(\"Log in\")").unwrap(),
                Selector::css_with_text("a", "Log in")
            );
            assert_eq!(
                Selector::parse("button:has-text('+')").unwrap(),
                Selector::css_with_text("button", "+")
            );
        }

        #[test]
        fn test_has_text_with_descendant() {
            assert_eq!(
                Selector::parse("h4:has-text(\"iPhone 6s\") a").unwrap(),
                Selector::CssWithText {
                    css: "h4".into(),
                    text: "iPhone 6s".into(),
                    descendant: Some(Box::new(Selector::css("a"))),
                }
            );
        }

        #[test]
        fn test_has_text_without_base() {
            let sel = Selector::parse(":has-text(\"Subtotal\")").unwrap();
            assert_eq!(sel, Selector::css_with_text("*", "Subtotal"));
        }

        #[test]
        fn test_has_text_errors() {
            assert!(Selector::parse("a:has-text(Checkout)").is_err());
            assert!(Selector::parse("a:has-text(\"Checkout)").is_err());
            assert!(Selector::parse("a:has-text(\"Checkout\"").is_err());
            assert!(Selector::parse("h4:has-text(\"x\") text=Buy")
                .unwrap_err()
                .is_configuration());
        }

        #[test]
        fn test_chained_has_text() {
            let sel =
                Selector::parse("table:has-text(\"Order summary\") td:has-text(\"Subtotal\")")
                    .unwrap();
            assert_eq!(
                sel,
                Selector::CssWithText {
                    css: "table".into(),
                    text: "Order summary".into(),
                    descendant: Some(Box::new(Selector::css_with_text("td", "Subtotal"))),
                }
            );
        }

        #[test]
        fn test_empty_rejected() {
            assert!(Selector::parse("").unwrap_err().is_configuration());
            assert!(Selector::parse("   ").unwrap_err().is_configuration());
        }

        #[test]
        fn test_escaped_quote_in_text() {
            let sel = Selector::parse(r#"a:has-text("Say \"hi\"")"#).unwrap();
            assert_eq!(sel, Selector::css_with_text("a", "Say \"hi\""));
        }
    }

    mod split_tests {
        use super::*;

        #[test]
        fn test_simple_split() {
            assert_eq!(
                split_fallbacks(".logo a, .site-logo a, .header-logo a"),
                vec![".logo a", ".site-logo a", ".header-logo a"]
            );
        }

        #[test]
        fn test_commas_in_quotes_do_not_split() {
            assert_eq!(
                split_fallbacks("a:has-text(\"Hello, world\"), .greeting"),
                vec!["a:has-text(\"Hello, world\")", ".greeting"]
            );
        }

        #[test]
        fn test_commas_in_brackets_do_not_split() {
            assert_eq!(
                split_fallbacks("li:is(.a, .b), input[name=\"x,y\"]"),
                vec!["li:is(.a, .b)", "input[name=\"x,y\"]"]
            );
        }

        #[test]
        fn test_escaped_quotes_keep_commas_together() {
            assert_eq!(
                split_fallbacks(r#"a:has-text("say \"a, b\""), .next"#),
                vec![r#"a:has-text("say \"a, b\"")"#, ".next"]
            );
        }

        #[test]
        fn test_empty_segments_dropped() {
            assert_eq!(split_fallbacks(" , .a ,, "), vec![".a"]);
            assert!(split_fallbacks("").is_empty());
        }
    }

    mod spec_tests {
        use super::*;

        #[test]
        fn test_parse_chain_preserves_order() {
            let spec = SelectorSpec::parse(
                "checkout_button",
                "a:has-text(\"Checkout\"), button:has-text(\"Checkout\"), .checkout-link",
            )
            .unwrap();
            assert_eq!(spec.name(), "checkout_button");
            assert_eq!(spec.len(), 3);
            assert_eq!(spec.candidates()[2], Selector::css(".checkout-link"));
        }

        #[test]
        fn test_empty_chain_is_configuration_error() {
            let err = SelectorSpec::parse("nothing", " , ").unwrap_err();
            assert!(err.is_configuration());
            assert!(SelectorSpec::new("nothing", vec![]).is_err());
        }

        #[test]
        fn test_bad_candidate_names_element() {
            let err = SelectorSpec::parse("broken", ".ok, a:has-text(oops)").unwrap_err();
            assert!(err.to_string().contains("broken"));
        }

        #[test]
        fn test_bind_substitutes_all_candidates() {
            let spec = SelectorSpec::parse(
                "product_link",
                "h4:has-text(\"{name}\") a, a:has-text(\"{name}\")",
            )
            .unwrap();
            let bound = spec.bind("iPhone 6s");
            assert_eq!(bound.name(), "product_link[iPhone 6s]");
            assert_eq!(
                bound.candidates()[1],
                Selector::css_with_text("a", "iPhone 6s")
            );
            // the registered spec is untouched
            assert!(spec.to_string().contains("{name}"));
        }

        #[test]
        fn test_display_roundtrips_through_parse() {
            let chain = "h1, text=Thank you, role=button[name=\"Place order\"], \
                         tbody tr:has-text(\"$\") td, xpath=//td[2]";
            let spec = SelectorSpec::parse("mixed", chain).unwrap();
            let again = SelectorSpec::parse("mixed", &spec.to_string()).unwrap();
            assert_eq!(spec, again);
        }

        #[test]
        fn test_quotes_and_backslashes_survive_display() {
            let tricky = [
                Selector::css_with_text("a", "Say \"hi\""),
                Selector::css_with_text("td", r"C:\shop\"),
                Selector::role("button", Some("Add \"Pro\", 2")),
                Selector::text("Total (incl. tax), \"net\""),
                Selector::parse("table:has-text(\"Order \\\"A\\\"\") td:has-text(\"x\")").unwrap(),
            ];
            for sel in tricky {
                let shown = sel.to_string();
                assert_eq!(Selector::parse(&shown).unwrap(), sel, "{shown}");
                let json = serde_json::to_string(&sel).unwrap();
                assert_eq!(serde_json::from_str::<Selector>(&json).unwrap(), sel);
            }
            let spec = SelectorSpec::new("tricky", vec![
                Selector::text("a, b"),
                Selector::css_with_text("li", "x\", y"),
            ])
            .unwrap();
            assert_eq!(SelectorSpec::parse("tricky", &spec.to_string()).unwrap(), spec);
        }

        #[test]
        fn test_serde_selector_as_string() {
            let sel: Selector = serde_json::from_str("\"a:has-text(\\\"Log in\\\")\"").unwrap();
            assert_eq!(sel, Selector::css_with_text("a", "Log in"));
            let json = serde_json::to_string(&Selector::text("Hi")).unwrap();
            assert_eq!(json, "\"text=Hi\"");
        }
    }

    mod js_tests {
        use super::*;

        #[test]
        fn test_css_query() {
            let js = Selector::css("button.primary").to_js("document");
            assert!(js.contains("document.querySelectorAll(\"button.primary\")"));
        }

        #[test]
        fn test_text_query_prefers_deepest() {
            let js = Selector::text("Thank you").to_js("scope");
            assert!(js.contains("scope.querySelectorAll('*')"));
            assert!(js.contains("children"));
        }

        #[test]
        fn test_has_text_with_descendant_query() {
            let sel = Selector::parse("h4:has-text(\"iPhone\") a").unwrap();
            let js = sel.to_js("document");
            assert!(js.contains("flatMap"));
            assert!(js.contains("\"iPhone\""));
            assert!(js.contains("el.querySelectorAll(\"a\")"));
        }

        #[test]
        fn test_role_query_expands_implicit_roles() {
            let js = Selector::role("button", Some("Checkout")).to_js("document");
            assert!(js.contains("input[type=submit]"));
            assert!(js.contains("\"Checkout\""));
        }

        #[test]
        fn test_xpath_query_uses_scope() {
            let js = Selector::xpath("..").to_js("el");
            assert!(js.contains("document.evaluate(\"..\", el"));
        }

        #[test]
        fn test_js_escaping() {
            let js = Selector::text("say \"hi\"").to_js("document");
            assert!(js.contains(r#""say \"hi\"""#));
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn class_chains_split_into_same_count(classes in proptest::collection::vec("[a-z][a-z0-9-]{0,12}", 1..6)) {
                let chain = classes.iter().map(|c| format!(".{c}")).collect::<Vec<_>>().join(", ");
                let spec = SelectorSpec::parse("el", &chain).unwrap();
                prop_assert_eq!(spec.len(), classes.len());
                for (sel, class) in spec.candidates().iter().zip(&classes) {
                    prop_assert_eq!(sel, &Selector::css(format!(".{class}")));
                }
            }

            #[test]
            fn has_text_keeps_arbitrary_text(text in "[A-Za-z0-9 ,$.()]{1,24}") {
                let raw = format!("a:has-text(\"{text}\")");
                let sel = Selector::parse(&raw).unwrap();
                prop_assert_eq!(sel, Selector::css_with_text("a", text));
            }

            #[test]
            fn quoted_text_survives_display(text in "[A-Za-z0-9 ,$.()\"'\\\\]{1,24}") {
                for sel in [
                    Selector::css_with_text("td", text.clone()),
                    Selector::text(text.clone()),
                    Selector::role("button", Some(&text)),
                ] {
                    let spec = SelectorSpec::new("el", vec![sel.clone(), Selector::css(".next")]).unwrap();
                    let again = SelectorSpec::parse("el", &spec.to_string()).unwrap();
                    prop_assert_eq!(again.candidates(), &[sel, Selector::css(".next")][..]);
                }
            }
        }
    }
}
