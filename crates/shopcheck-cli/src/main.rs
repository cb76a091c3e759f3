//! Shopcheck CLI: storefront end-to-end scenarios
//!
//! ## Usage
//!
//! ```bash
//! shopcheck run --mock                  # Simulated storefront
//! shopcheck run --filter checkout       # Only checkout scenarios
//! shopcheck reset --category computers  # Empty the cart, open a category
//! shopcheck selectors --page cart       # Effective selector chains
//! shopcheck config --format json        # Effective configuration
//! ```

use clap::Parser;
use shopcheck_cli::{
    handlers, init_tracing, load_suite_config, CliConfig, CliError, CliResult, Cli, ColorChoice,
    Commands, FlagOverrides, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(ColorChoice::from(cli.color));
    init_tracing(config.verbosity, cli.log_format, config.color.should_color());

    let flags = FlagOverrides {
        base_url: cli.base_url.clone(),
        headed: cli.headed,
        output_dir: match &cli.command {
            Commands::Run(args) => args.output.clone(),
            _ => None,
        },
    };
    let cwd = std::env::current_dir()?;
    let suite = load_suite_config(
        cli.config.as_deref(),
        &cwd,
        |key| std::env::var(key).ok(),
        &flags,
    )?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Io)?;

    match cli.command {
        Commands::Run(args) => runtime
            .block_on(handlers::execute_run(suite, config, &args))
            .map(|_| ()),
        Commands::Reset(args) => runtime.block_on(handlers::execute_reset(suite, config, &args)),
        Commands::Selectors(args) => handlers::execute_selectors(&suite, &args),
        Commands::Config(args) => handlers::execute_config(&suite, &args),
    }
}
