use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::state::ChartKind;

/// Default configuration, written out by `--print-config`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# campaign-filter configuration

# Column whose proportions are compared before and after filtering
target_column = "y"

# Numeric column driving the range filter
age_column = "age"

# Rows shown in table previews
preview_rows = 5

# File name stem for exports (<stem>_filtered.csv, ...)
dataset_stem = "bank"

# "bar" or "pie"; only affects rendering
chart = "bar"
"#;

/// Analysis settings. Every field falls back to its default when missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub target_column: String,
    pub age_column: String,
    pub preview_rows: usize,
    pub dataset_stem: String,
    pub chart: ChartKind,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            target_column: "y".to_string(),
            age_column: "age".to_string(),
            preview_rows: 5,
            dataset_stem: "bank".to_string(),
            chart: ChartKind::Bar,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(text: &str) -> PipelineResult<Self> {
        toml::from_str(text).map_err(|e| PipelineError::Config(e.to_string()))
    }

    /// Read a TOML file.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> PipelineResult<String> {
        toml::to_string(self).map_err(|e| PipelineError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_template_matches_defaults() {
        let parsed = AnalysisConfig::from_toml_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(parsed, AnalysisConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let parsed = AnalysisConfig::from_toml_str("target_column = \"poutcome\"\nchart = \"pie\"").unwrap();
        assert_eq!(parsed.target_column, "poutcome");
        assert_eq!(parsed.chart, ChartKind::Pie);
        assert_eq!(parsed.age_column, "age");
    }

    #[test]
    fn test_bad_chart_kind() {
        let err = AnalysisConfig::from_toml_str("chart = \"line\"").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "preview_rows = 10").unwrap();
        let parsed = AnalysisConfig::load(file.path()).unwrap();
        assert_eq!(parsed.preview_rows, 10);

        let round = AnalysisConfig::from_toml_str(&parsed.to_toml_string().unwrap()).unwrap();
        assert_eq!(round, parsed);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AnalysisConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }
}
