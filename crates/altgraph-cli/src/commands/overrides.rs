//! Overrides command implementation.

use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use altgraph_resolver::OverrideSource;

/// Execute the overrides command.
///
/// Shows the rules as the next refresh would load them.
pub fn execute_overrides(config: &Config, formatter: &Formatter) -> Result<()> {
    let source = OverrideSource::new(config.overrides_path());
    let rules = source.load();
    tracing::debug!("Loaded {} override rules from {}", rules.len(), source.path().display());
    println!("{}", formatter.format_overrides(&rules)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use tempfile::TempDir;

    #[test]
    fn test_overrides_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let formatter = Formatter::new(OutputFormat::Table, false);
        execute_overrides(&config, &formatter).unwrap();
    }

    #[test]
    fn test_overrides_file() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        std::fs::write(
            config.overrides_path(),
            r#"{"eve": {"alts": ["mallory"]}, "p1": {"alts": ["p2"], "ips": ["1.1.1.1"]}}"#,
        )
        .unwrap();
        let formatter = Formatter::new(OutputFormat::Json, false);
        execute_overrides(&config, &formatter).unwrap();
    }
}
