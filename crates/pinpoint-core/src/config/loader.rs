use super::schema::PinpointConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Where `load_default` looks, in order: `./pinpoint.yaml`, then
    /// `~/.pinpoint/config.yaml`.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./pinpoint.yaml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".pinpoint").join("config.yaml"));
        }
        paths
    }

    /// First existing file from [`Self::search_paths`], else the defaults.
    pub async fn load_default() -> Result<PinpointConfig, ConfigError> {
        for path in Self::search_paths() {
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Self::load_from(&path).await;
            }
        }
        debug!("no config file found, using defaults");
        Ok(PinpointConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<PinpointConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::parse(&content)?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parses and checks a YAML document. Blank input yields the defaults.
    pub fn parse(content: &str) -> Result<PinpointConfig, ConfigError> {
        // serde_yaml reads an empty document as unit, not a mapping
        if content.trim().is_empty() {
            return Ok(PinpointConfig::default());
        }
        let config: PinpointConfig = serde_yaml::from_str(content)?;
        validate(&config)?;
        Ok(config)
    }
}

fn validate(config: &PinpointConfig) -> Result<(), ConfigError> {
    let ratios = [
        ("grid.image_ratio", config.grid.image_ratio),
        ("grid.date_text_ratio", config.grid.date_text_ratio),
        (
            "recovery.bbox_overlap_threshold",
            f64::from(config.recovery.bbox_overlap_threshold),
        ),
    ];
    for (field, value) in ratios {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::Invalid {
                field,
                reason: format!("{} is outside 0..=1", value),
            });
        }
    }
    if config.grid.sample_size == 0 {
        return Err(ConfigError::Invalid {
            field: "grid.sample_size",
            reason: "must sample at least one row".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_starts_in_working_directory() {
        let paths = ConfigLoader::search_paths();
        assert_eq!(paths[0], PathBuf::from("./pinpoint.yaml"));
        assert!(paths.iter().skip(1).all(|p| p.ends_with(".pinpoint/config.yaml")));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = ConfigLoader::parse("grid:\n  image_ratio: 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "grid.image_ratio", .. }));

        let err = ConfigLoader::parse("grid:\n  sample_size: 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "grid.sample_size", .. }));

        assert!(ConfigLoader::parse("recovery:\n  bbox_overlap_threshold: 0.5").is_ok());
    }
}
