//! Reset command handler

use shopcheck::{Category, DataResetFixture, SuiteConfig};

use super::session_provider;
use crate::commands::ResetArgs;
use crate::config::CliConfig;
use crate::error::CliResult;

/// Category from `--category`, or the configured one
pub fn reset_category(config: &SuiteConfig, arg: Option<&str>) -> CliResult<Category> {
    Ok(match arg {
        Some(slug) => slug.parse::<Category>()?,
        None => config.reset_category,
    })
}

/// Execute the reset command
pub async fn execute_reset(config: SuiteConfig, cli: CliConfig, args: &ResetArgs) -> CliResult<()> {
    let category = reset_category(&config, args.category.as_deref())?;
    let provider = session_provider(&config, args.mock)?;
    let mut fixture = DataResetFixture::new(provider, config).with_category(category);
    fixture.reset().await?;
    if !cli.verbosity.is_quiet() {
        println!("storefront reset: cart emptied, {category} listing open");
    }
    Ok(())
}
