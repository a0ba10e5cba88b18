use pinpoint_core::config::{ConfigError, ConfigLoader};
use std::io::Write;
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_load_from_partial_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "selector:\n  max_depth: 8\ngrid:\n  boolean_values: [ja, nein]\nrecovery:\n  bbox_overlap_threshold: 0.5"
    )
    .unwrap();

    let config = ConfigLoader::load_from(file.path()).await.unwrap();
    assert_eq!(config.selector.max_depth, 8);
    assert_eq!(config.selector.text_max_len, 100);
    assert_eq!(config.grid.boolean_values, vec!["ja", "nein"]);
    assert_eq!(config.grid.image_ratio, 0.4);
    assert_eq!(config.recovery.bbox_overlap_threshold, 0.5);
}

#[tokio::test]
async fn test_empty_file_gives_defaults() {
    let file = NamedTempFile::new().unwrap();
    let config = ConfigLoader::load_from(file.path()).await.unwrap();
    assert_eq!(config.grid.sample_size, 10);
    assert_eq!(config.grid.date_text_ratio, 0.6);
}

#[tokio::test]
async fn test_load_errors() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "grid: [not, a, map]").unwrap();
    assert!(matches!(
        ConfigLoader::load_from(file.path()).await,
        Err(ConfigError::Parse(_))
    ));

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "grid:\n  date_text_ratio: 60").unwrap();
    assert!(matches!(
        ConfigLoader::load_from(file.path()).await,
        Err(ConfigError::Invalid { field: "grid.date_text_ratio", .. })
    ));

    let missing = std::path::Path::new("/nonexistent/pinpoint.yaml");
    assert!(matches!(
        ConfigLoader::load_from(missing).await,
        Err(ConfigError::Io(_))
    ));
}
