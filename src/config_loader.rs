use crate::config::AnalysisConfig;
use color_eyre::eyre::{Context, Result};
use log::info;
use std::fs::File;
use std::path::Path;

/// Load and validate analysis configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<AnalysisConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .with_context(|| format!("Failed to open config file: {}", config_path.display()))?;

    let config: AnalysisConfig = serde_yaml::from_reader(file)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

    config.validate()?;

    Ok(config)
}

/// Load the configuration file when one is given, the reference defaults otherwise
pub fn load_or_default(config_path: Option<&Path>) -> Result<AnalysisConfig> {
    match config_path {
        Some(path) => load_config(path),
        None => {
            info!("No configuration file given, using reference defaults");
            Ok(AnalysisConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "baseline_method: PUSHOUT-1.0\nlink_rate_gbps: 400\nbase_rtt: 10us\nmethods: [PUSHOUT-1.0, DT-1.0]"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.baseline_method, "PUSHOUT-1.0");
        assert_eq!(config.link_rate_gbps, 400.0);
        assert_eq!(config.base_rtt, Duration::from_micros(10));
        assert_eq!(
            config.methods,
            Some(vec!["PUSHOUT-1.0".to_string(), "DT-1.0".to_string()])
        );
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "performance_parameters: [not_a_metric]").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_without_path() {
        let config = load_or_default(None).unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }
}
