//! Config command handler

use shopcheck::SuiteConfig;

use crate::commands::{ConfigArgs, ConfigFormat};
use crate::error::CliResult;

/// Effective configuration in `format`
pub fn render_config(config: &SuiteConfig, format: ConfigFormat) -> CliResult<String> {
    Ok(match format {
        ConfigFormat::Yaml => serde_yaml_ng::to_string(config)?,
        ConfigFormat::Json => serde_json::to_string_pretty(config)? + "\n",
    })
}

/// Execute the config command
pub fn execute_config(config: &SuiteConfig, args: &ConfigArgs) -> CliResult<()> {
    print!("{}", render_config(config, args.format)?);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_reloads() {
        let config = SuiteConfig::default();
        let yaml = render_config(&config, ConfigFormat::Yaml).unwrap();
        assert!(yaml.contains("base_url"));
        assert_eq!(SuiteConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn test_json() {
        let json = render_config(&SuiteConfig::default(), ConfigFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["checkout_layout"], "multi-step");
    }
}
