//! Terminal reporting for scenario runs

use console::{style, Style};
use shopcheck::{ScenarioResult, ScenarioStatus, SuiteReport};
use std::fmt::Write as _;

use crate::config::CliConfig;

/// Formats run results for the terminal
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    config: CliConfig,
    color: bool,
}

impl Reporter {
    /// Reporter honoring verbosity and color settings
    #[must_use]
    pub fn new(config: CliConfig) -> Self {
        Self {
            config,
            color: config.color.should_color(),
        }
    }

    fn paint(&self, style: &Style, text: &str) -> String {
        if self.color {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// One line per scenario
    #[must_use]
    pub fn scenario_line(&self, result: &ScenarioResult) -> String {
        let (mark, paint) = match result.status {
            ScenarioStatus::Passed => ("✓", Style::new().green().bold()),
            ScenarioStatus::Failed => ("✗", Style::new().red().bold()),
            ScenarioStatus::Skipped => ("-", Style::new().yellow()),
        };
        let mut line = format!(
            "{} {} ({}ms)",
            self.paint(&paint, mark),
            result.name,
            result.duration.as_millis()
        );
        if let Some(error) = &result.error {
            let _ = write!(line, "\n    {}", self.paint(&Style::new().red(), error));
        }
        if let Some(failure) = &result.failure {
            let _ = write!(line, " [{failure}]");
        }
        if let Some(shot) = &result.screenshot {
            let _ = write!(line, "\n    screenshot: {}", shot.display());
        }
        line
    }

    /// The whole report, or just failures when quiet
    #[must_use]
    pub fn render(&self, report: &SuiteReport) -> String {
        let mut out = String::new();
        for result in &report.results {
            if self.config.verbosity.is_quiet() && result.status != ScenarioStatus::Failed {
                continue;
            }
            out.push_str(&self.scenario_line(result));
            out.push('\n');
        }
        let summary = report.summary();
        let summary = if !self.color {
            summary
        } else if report.is_success() {
            style(summary).green().to_string()
        } else {
            style(summary).red().to_string()
        };
        out.push_str(&summary);
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ColorChoice;
    use std::time::Duration;

    fn result(name: &str, status: ScenarioStatus, error: Option<&str>) -> ScenarioResult {
        ScenarioResult {
            name: name.to_string(),
            status,
            duration: Duration::from_millis(12),
            error: error.map(str::to_string),
            failure: None,
            screenshot: None,
        }
    }

    fn plain() -> Reporter {
        Reporter::new(CliConfig::new().with_color(ColorChoice::Never))
    }

    #[test]
    fn test_passed_line() {
        let line = plain().scenario_line(&result("cart_page_loads", ScenarioStatus::Passed, None));
        assert_eq!(line, "✓ cart_page_loads (12ms)");
    }

    #[test]
    fn test_failed_line_carries_error() {
        let line = plain().scenario_line(&result(
            "remove_product",
            ScenarioStatus::Failed,
            Some("cart still has 2 lines"),
        ));
        assert!(line.starts_with("✗ remove_product"));
        assert!(line.contains("cart still has 2 lines"));
    }
}
