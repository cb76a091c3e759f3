//! Selectors command handler

use shopcheck::{pages, CheckoutLayout, SelectorRegistry, SuiteConfig};
use std::fmt::Write as _;

use crate::commands::SelectorsArgs;
use crate::error::{CliError, CliResult};

/// Registries after overrides, as `page` headings with `element: chain` rows
pub fn render_selectors(
    config: &SuiteConfig,
    page: Option<&str>,
    layout: Option<CheckoutLayout>,
) -> CliResult<String> {
    let layout = layout.unwrap_or(config.checkout_layout);
    let all = pages::registries(layout, &config.overrides()?)?;

    let chosen: Vec<&SelectorRegistry> = match page {
        Some(name) => {
            let found: Vec<_> = all.iter().filter(|r| r.page() == name).collect();
            if found.is_empty() {
                let known: Vec<&str> = all.iter().map(SelectorRegistry::page).collect();
                return Err(CliError::invalid_argument(format!(
                    "unknown page '{name}' (expected one of: {})",
                    known.join(", ")
                )));
            }
            found
        }
        None => all.iter().collect(),
    };

    let mut out = String::new();
    for registry in chosen {
        let _ = writeln!(out, "{}", registry.page());
        let width = registry.names().iter().map(|n| n.len()).max().unwrap_or(0);
        for spec in registry.iter() {
            let _ = writeln!(out, "  {:width$}  {spec}", format!("{}:", spec.name()), width = width + 1);
        }
    }
    Ok(out)
}

/// Execute the selectors command
pub fn execute_selectors(config: &SuiteConfig, args: &SelectorsArgs) -> CliResult<()> {
    let layout = args.layout.map(CheckoutLayout::from);
    print!("{}", render_selectors(config, args.page.as_deref(), layout)?);
    Ok(())
}
