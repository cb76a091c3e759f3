//! CLI configuration.
//!
//! The suite configuration is layered: `shopcheck.yaml` (or `--config`),
//! then environment variables, then command-line flags.

use serde::{Deserialize, Serialize};
use shopcheck::{SuiteConfig, CONFIG_FILE};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CliError, CliResult};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - minimal output
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// From the `-q` flag and the `-v` count
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Default log filter for this level
    #[must_use]
    pub const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "shopcheck=warn",
            Self::Normal => "shopcheck=info",
            Self::Verbose => "shopcheck=debug",
            Self::Debug => "shopcheck=trace,shopcheck_cli=debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stdout().features().colors_supported(),
        }
    }
}

/// CLI output settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }
}

/// Flag values that override the file and the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagOverrides {
    /// `--base-url`
    pub base_url: Option<String>,
    /// `--headed`
    pub headed: bool,
    /// `run --output`
    pub output_dir: Option<PathBuf>,
}

/// Load the suite configuration.
///
/// An explicit `path` must exist; otherwise `shopcheck.yaml` in `cwd` is
/// used when present and defaults when not.
///
/// # Errors
///
/// [`CliError::Config`] for an unreadable or invalid file, or an invalid
/// result after overrides.
pub fn load_suite_config(
    path: Option<&Path>,
    cwd: &Path,
    lookup: impl Fn(&str) -> Option<String>,
    flags: &FlagOverrides,
) -> CliResult<SuiteConfig> {
    let file = match path {
        Some(p) => Some(p.to_path_buf()),
        None => Some(cwd.join(CONFIG_FILE)).filter(|p| p.is_file()),
    };

    let mut config = match file {
        Some(file) => {
            debug!(path = %file.display(), "loading suite configuration");
            SuiteConfig::load(&file)
                .map_err(|e| CliError::config(format!("{}: {e}", file.display())))?
        }
        None => SuiteConfig::default(),
    }
    .with_env(lookup);

    if let Some(url) = &flags.base_url {
        config.base_url.clone_from(url);
    }
    if flags.headed {
        config.browser.headless = false;
    }
    if let Some(dir) = &flags.output_dir {
        config.output_dir.clone_from(dir);
    }

    config
        .validate()
        .map_err(|e| CliError::config(e.to_string()))?;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    mod verbosity_tests {
        use super::*;

        #[test]
        fn test_from_flags() {
            assert_eq!(Verbosity::from_flags(true, 3), Verbosity::Quiet);
            assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
            assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
            assert_eq!(Verbosity::from_flags(false, 5), Verbosity::Debug);
        }

        #[test]
        fn test_log_filter() {
            assert_eq!(Verbosity::Normal.log_filter(), "shopcheck=info");
            assert!(Verbosity::Verbose.is_verbose());
            assert!(!Verbosity::Normal.is_quiet());
        }

        #[test]
        fn test_color_never() {
            assert!(!ColorChoice::Never.should_color());
            assert!(ColorChoice::Always.should_color());
        }
    }

    mod layering_tests {
        use super::*;

        #[test]
        fn test_defaults_without_file() {
            let dir = TempDir::new().unwrap();
            let config =
                load_suite_config(None, dir.path(), no_env, &FlagOverrides::default()).unwrap();
            assert_eq!(config, SuiteConfig::default());
        }

        #[test]
        fn test_file_then_env_then_flags() {
            let dir = TempDir::new().unwrap();
            std::fs::write(
                dir.path().join(CONFIG_FILE),
                "base_url: http://file.test\nreset_category: tablets\n",
            )
            .unwrap();

            let from_file =
                load_suite_config(None, dir.path(), no_env, &FlagOverrides::default()).unwrap();
            assert_eq!(from_file.base_url, "http://file.test");

            let env = |k: &str| (k == "BASE_URL").then(|| "http://env.test".to_string());
            let from_env =
                load_suite_config(None, dir.path(), env, &FlagOverrides::default()).unwrap();
            assert_eq!(from_env.base_url, "http://env.test");

            let flags = FlagOverrides {
                base_url: Some("http://flag.test".into()),
                headed: true,
                output_dir: Some(PathBuf::from("out")),
            };
            let from_flags = load_suite_config(None, dir.path(), env, &flags).unwrap();
            assert_eq!(from_flags.base_url, "http://flag.test");
            assert!(!from_flags.browser.headless);
            assert_eq!(from_flags.output_dir, PathBuf::from("out"));
            assert_eq!(from_flags.reset_category, shopcheck::Category::Tablets);
        }

        #[test]
        fn test_explicit_missing_file_is_error() {
            let dir = TempDir::new().unwrap();
            let missing = dir.path().join("nope.yaml");
            let err = load_suite_config(Some(&missing), dir.path(), no_env, &FlagOverrides::default())
                .unwrap_err();
            assert!(matches!(err, CliError::Config { .. }));
            assert!(err.to_string().contains("nope.yaml"));
        }

        #[test]
        fn test_invalid_base_url_rejected() {
            let dir = TempDir::new().unwrap();
            let flags = FlagOverrides {
                base_url: Some("ftp://shop".into()),
                ..FlagOverrides::default()
            };
            let err = load_suite_config(None, dir.path(), no_env, &flags).unwrap_err();
            assert!(err.to_string().contains("base_url must be http(s)"));
        }
    }
}
