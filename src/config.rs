use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ReportError, Result};

/// Environment variable naming an optional JSON configuration file
pub const CONFIG_ENV: &str = "REPORT_CONFIG";

/// Runtime configuration for the report pipeline and its front ends.
///
/// Every field has a default, so a config file only needs to name the
/// values it overrides.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// Banner rows above the header row
    pub header_rows: usize,

    /// Values that count as "not filled" once trimmed
    pub blank_markers: Vec<String>,

    /// Raw cell values that the loader turns into missing cells
    pub missing_markers: Vec<String>,

    /// Placeholder shown next to a revocation without a reason
    pub reason_missing_label: String,

    /// Address the web front end listens on
    pub bind_address: String,

    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            header_rows: 4,
            blank_markers: ["", "nan", "None"].iter().map(|s| s.to_string()).collect(),
            missing_markers: [
                "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
                "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            reason_missing_label: "Motivo não informado".to_string(),
            bind_address: "127.0.0.1:3000".to_string(),
            chart_width: 800,
            chart_height: 600,
        }
    }
}

impl ReportConfig {
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| ReportError::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Reads the file named by `REPORT_CONFIG`, or falls back to defaults.
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                log::info!("Loading configuration from {}", path);
                Self::from_file(path.trim())
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn blank_predicate(&self) -> BlankPredicate {
        BlankPredicate::new(self.blank_markers.iter().cloned())
    }

    pub fn is_missing_marker(&self, raw: &str) -> bool {
        self.missing_markers.iter().any(|m| m == raw)
    }
}

/// Decides whether a cell counts as "not filled".
///
/// The value is trimmed before comparison, so a whitespace-only cell is
/// blank whenever `""` is one of the markers.
#[derive(Clone, Debug, PartialEq)]
pub struct BlankPredicate {
    markers: Vec<String>,
}

impl BlankPredicate {
    pub fn new(markers: impl IntoIterator<Item = String>) -> Self {
        Self {
            markers: markers.into_iter().map(|m| m.trim().to_string()).collect(),
        }
    }

    pub fn is_blank(&self, cell: Option<&str>) -> bool {
        match cell {
            None => true,
            Some(value) => {
                let value = value.trim();
                self.markers.iter().any(|m| m == value)
            }
        }
    }

    pub fn is_filled(&self, cell: Option<&str>) -> bool {
        !self.is_blank(cell)
    }
}

impl Default for BlankPredicate {
    fn default() -> Self {
        ReportConfig::default().blank_predicate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_blank_markers() {
        let blank = BlankPredicate::default();
        assert!(blank.is_blank(None));
        assert!(blank.is_blank(Some("")));
        assert!(blank.is_blank(Some("   ")));
        assert!(blank.is_blank(Some(" nan ")));
        assert!(blank.is_blank(Some("None")));
        assert!(blank.is_filled(Some("NaN")));
        assert!(blank.is_filled(Some("none")));
        assert!(blank.is_filled(Some("x")));
        assert!(blank.is_filled(Some("0")));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ReportConfig::from_json_str(r#"{"header_rows": 2, "blank_markers": ["-"]}"#)
            .unwrap();
        assert_eq!(config.header_rows, 2);
        assert_eq!(config.bind_address, "127.0.0.1:3000");
        assert_eq!(config.reason_missing_label, "Motivo não informado");

        let blank = config.blank_predicate();
        assert!(blank.is_blank(Some(" - ")));
        assert!(blank.is_filled(Some("nan")));
    }

    #[test]
    fn invalid_json_is_a_config_error() {
        let err = ReportConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
        assert!(err.to_string().starts_with("Configuração inválida: "));
    }

    #[test]
    fn reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        std::fs::write(&path, r#"{"chart_width": 1024}"#).unwrap();

        let config = ReportConfig::from_file(&path).unwrap();
        assert_eq!(config.chart_width, 1024);
        assert_eq!(config.chart_height, 600);
    }
}
