use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PinpointConfig {
    #[serde(default)]
    pub selector: SelectorConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Upper bound on ancestor walks (anchor climbing, path building).
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_text_max_len")]
    pub text_max_len: usize,
    /// Ids longer than this are treated as machine-generated.
    #[serde(default = "default_generated_id_max_len")]
    pub generated_id_max_len: usize,
    /// Mixed letter/digit ids at least this long are treated as machine-generated.
    #[serde(default = "default_generated_id_mixed_min_len")]
    pub generated_id_mixed_min_len: usize,
    #[serde(default = "default_test_attributes")]
    pub test_attributes: Vec<String>,
    #[serde(default = "default_max_path_classes")]
    pub max_path_classes: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            text_max_len: default_text_max_len(),
            generated_id_max_len: default_generated_id_max_len(),
            generated_id_mixed_min_len: default_generated_id_mixed_min_len(),
            test_attributes: default_test_attributes(),
            max_path_classes: default_max_path_classes(),
        }
    }
}

fn default_max_depth() -> usize {
    64
}

fn default_text_max_len() -> usize {
    100
}

fn default_generated_id_max_len() -> usize {
    16
}

fn default_generated_id_mixed_min_len() -> usize {
    10
}

fn default_test_attributes() -> Vec<String> {
    ["data-testid", "data-test-id", "data-test", "data-qa", "data-cy"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_path_classes() -> usize {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
    #[serde(default = "default_image_ratio")]
    pub image_ratio: f64,
    #[serde(default = "default_date_text_ratio")]
    pub date_text_ratio: f64,
    #[serde(default = "default_boolean_values")]
    pub boolean_values: Vec<String>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            sample_size: default_sample_size(),
            preview_rows: default_preview_rows(),
            image_ratio: default_image_ratio(),
            date_text_ratio: default_date_text_ratio(),
            boolean_values: default_boolean_values(),
        }
    }
}

fn default_sample_size() -> usize {
    10
}

fn default_preview_rows() -> usize {
    3
}

fn default_image_ratio() -> f64 {
    0.4
}

fn default_date_text_ratio() -> f64 {
    0.6
}

fn default_boolean_values() -> Vec<String> {
    [
        "true", "false", "yes", "no", "on", "off", "active", "inactive", "enabled", "disabled",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    #[serde(default = "default_bbox_overlap_threshold")]
    pub bbox_overlap_threshold: f32,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            bbox_overlap_threshold: default_bbox_overlap_threshold(),
        }
    }
}

fn default_bbox_overlap_threshold() -> f32 {
    0.7
}
