//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shopcheck: end-to-end scenarios for SimplCommerce storefronts
#[derive(Parser, Debug)]
#[command(name = "shopcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Suite configuration file
    #[arg(short, long, env = "SHOPCHECK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Storefront origin, overriding file and environment
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Show the browser window
    #[arg(long, global = true)]
    pub headed: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reset the storefront, then run scenarios
    Run(RunArgs),

    /// Reset the storefront to a known state
    Reset(ResetArgs),

    /// Print selector registries after overrides
    Selectors(SelectorsArgs),

    /// Print the effective configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Only scenarios whose name contains this
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Use the simulated storefront instead of a browser
    #[arg(long)]
    pub mock: bool,

    /// Stop after the first failing scenario
    #[arg(long)]
    pub fail_fast: bool,

    /// Skip the global data reset
    #[arg(long)]
    pub no_reset: bool,

    /// List matching scenarios without running them
    #[arg(long)]
    pub list: bool,

    /// Output directory for the report and screenshots
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the reset command
#[derive(Parser, Debug, Default)]
pub struct ResetArgs {
    /// Category page to open after emptying the cart
    #[arg(long)]
    pub category: Option<String>,

    /// Use the simulated storefront instead of a browser
    #[arg(long)]
    pub mock: bool,
}

/// Arguments for the selectors command
#[derive(Parser, Debug, Default)]
pub struct SelectorsArgs {
    /// Only this page (header, home, product, cart, checkout, login)
    #[arg(short, long)]
    pub page: Option<String>,

    /// Checkout markup variant
    #[arg(long)]
    pub layout: Option<LayoutArg>,
}

/// Arguments for the config command
#[derive(Parser, Debug, Default)]
pub struct ConfigArgs {
    /// Output format
    #[arg(short, long, default_value = "yaml")]
    pub format: ConfigFormat,
}

/// Configuration output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML, loadable as shopcheck.yaml
    #[default]
    Yaml,
    /// JSON
    Json,
}

/// Checkout markup variant
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutArg {
    /// Billing, payment and confirmation on separate steps
    MultiStep,
    /// Everything on one page
    SinglePage,
}

impl From<LayoutArg> for shopcheck::CheckoutLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::MultiStep => Self::MultiStep,
            LayoutArg::SinglePage => Self::SinglePage,
        }
    }
}

/// Log line format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Color output argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_run_command() {
            let cli = Cli::parse_from(["shopcheck", "run", "--mock", "--filter", "cart"]);
            match cli.command {
                Commands::Run(args) => {
                    assert!(args.mock);
                    assert_eq!(args.filter.as_deref(), Some("cart"));
                    assert!(!args.fail_fast);
                }
                other => panic!("expected run, got {other:?}"),
            }
        }

        #[test]
        fn test_global_flags_after_subcommand() {
            let cli = Cli::parse_from([
                "shopcheck",
                "config",
                "--base-url",
                "http://localhost:5000",
                "-vv",
            ]);
            assert_eq!(cli.base_url.as_deref(), Some("http://localhost:5000"));
            assert_eq!(cli.verbose, 2);
        }

        #[test]
        fn test_selectors_layout() {
            let cli = Cli::parse_from(["shopcheck", "selectors", "--layout", "single-page"]);
            match cli.command {
                Commands::Selectors(args) => assert_eq!(args.layout, Some(LayoutArg::SinglePage)),
                other => panic!("expected selectors, got {other:?}"),
            }
        }

        #[test]
        fn test_subcommand_required() {
            assert!(Cli::try_parse_from(["shopcheck"]).is_err());
        }
    }

    mod conversion_tests {
        use super::*;
        use crate::config::ColorChoice;

        #[test]
        fn test_color_conversion() {
            assert_eq!(ColorChoice::from(ColorArg::Never), ColorChoice::Never);
            assert_eq!(ColorChoice::from(ColorArg::Always), ColorChoice::Always);
        }

        #[test]
        fn test_layout_conversion() {
            assert_eq!(
                shopcheck::CheckoutLayout::from(LayoutArg::SinglePage),
                shopcheck::CheckoutLayout::SinglePage
            );
        }
    }
}
