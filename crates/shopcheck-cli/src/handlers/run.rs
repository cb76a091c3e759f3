//! Run command handler

use shopcheck::{
    scenarios, DataResetFixture, RunOptions, Scenario, ScenarioData, SuiteConfig, SuiteReport,
    SuiteRunner, TestData,
};
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::info;

use super::session_provider;
use crate::commands::RunArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::Reporter;

/// Report file name inside the output directory
pub const REPORT_FILE: &str = "report.json";

fn selected(filter: Option<&str>) -> CliResult<Vec<Scenario>> {
    let chosen = scenarios::select(filter);
    if chosen.is_empty() {
        return Err(CliError::invalid_argument(format!(
            "no scenario matches '{}'",
            filter.unwrap_or_default()
        )));
    }
    Ok(chosen)
}

/// Names and descriptions of the scenarios `filter` selects
pub fn list_scenarios(filter: Option<&str>) -> CliResult<String> {
    let chosen = selected(filter)?;
    let width = chosen.iter().map(|s| s.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for scenario in chosen {
        let _ = writeln!(out, "{:width$}  {}", scenario.name, scenario.description);
    }
    Ok(out)
}

/// Execute the run command.
///
/// The report is written to `<output_dir>/report.json` even when
/// scenarios fail.
pub async fn execute_run(
    config: SuiteConfig,
    cli: CliConfig,
    args: &RunArgs,
) -> CliResult<Option<SuiteReport>> {
    if args.list {
        print!("{}", list_scenarios(args.filter.as_deref())?);
        return Ok(None);
    }
    let chosen = selected(args.filter.as_deref())?;

    let data = ScenarioData::load(&TestData::new(&config.data_dir))?;
    let provider = session_provider(&config, args.mock)?;

    let mut runner = SuiteRunner::new(config.clone(), provider.clone()).with_data(data);
    if args.no_reset {
        info!("data reset skipped");
    } else {
        runner = runner.with_fixture(DataResetFixture::new(provider, config.clone()));
    }

    let options = RunOptions {
        filter: None,
        fail_fast: args.fail_fast,
    };
    let report = runner.run(&chosen, &options).await?;

    println!("{}", Reporter::new(cli).render(&report));

    let path: PathBuf = config.output_dir.join(REPORT_FILE);
    report.write_json(&path)?;
    if !cli.verbosity.is_quiet() {
        println!("report: {}", path.display());
    }

    if report.is_success() {
        Ok(Some(report))
    } else {
        Err(CliError::scenario_failure(report.summary()))
    }
}
