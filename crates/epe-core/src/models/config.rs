//! Configuration structures for the bill pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::EpeError;

/// Main configuration for the epe pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EpeConfig {
    /// Line reconstruction configuration.
    pub layout: LayoutConfig,

    /// Client name heuristic configuration.
    pub client_name: ClientNameConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Price index configuration.
    pub inflation: InflationConfig,
}

/// Line reconstruction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Maximum vertical distance (in PDF units, after rounding) between two
    /// fragments considered to be on the same line.
    pub line_tolerance: i64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { line_tolerance: 3 }
    }
}

/// Bounds for the client name heuristic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientNameConfig {
    /// Number of non-blank lines scanned from the top of the document.
    pub scan_lines: usize,

    /// Minimum number of words.
    pub min_words: usize,

    /// Maximum number of words.
    pub max_words: usize,

    /// Minimum length in characters.
    pub min_length: usize,

    /// Maximum length in characters.
    pub max_length: usize,

    /// Terms rejected in addition to the built-in denylist.
    pub extra_denylist: Vec<String>,
}

impl Default for ClientNameConfig {
    fn default() -> Self {
        Self {
            scan_lines: 30,
            min_words: 2,
            max_words: 5,
            min_length: 8,
            max_length: 50,
            extra_denylist: Vec::new(),
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Maximum pages to read (0 = unlimited).
    pub max_pages: usize,

    /// Use flat text extraction when no positioned fragments are found.
    pub fallback_to_flat_text: bool,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            max_pages: 0,
            fallback_to_flat_text: true,
        }
    }
}

/// Price index (IPC) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InflationConfig {
    /// Local CPI index file. Defaults to the data directory when unset.
    pub cpi_path: Option<PathBuf>,

    /// Series API endpoint used by `cpi update`.
    pub series_url: String,
}

impl Default for InflationConfig {
    fn default() -> Self {
        Self {
            cpi_path: None,
            series_url: "https://apis.datos.gob.ar/series/api/series/?ids=148.3_INIVELNAL_DICI_M_26&format=json&limit=5000"
                .to_string(),
        }
    }
}

impl EpeConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| EpeError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_known_templates() {
        let config = EpeConfig::default();
        assert_eq!(config.layout.line_tolerance, 3);
        assert_eq!(config.client_name.scan_lines, 30);
        assert_eq!(config.client_name.min_words, 2);
        assert_eq!(config.client_name.max_words, 5);
        assert_eq!(config.client_name.min_length, 8);
        assert_eq!(config.client_name.max_length, 50);
    }

    #[test]
    fn test_from_file_reports_invalid_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = EpeConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, EpeError::Config(_)), "{:?}", err);

        let missing = EpeConfig::from_file(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, EpeError::Io(_)), "{:?}", missing);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut config = EpeConfig::default();
        config.layout.line_tolerance = 7;
        config.save(&path).unwrap();

        assert_eq!(EpeConfig::from_file(&path).unwrap().layout.line_tolerance, 7);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EpeConfig =
            serde_json::from_str(r#"{ "layout": { "line_tolerance": 5 } }"#).unwrap();
        assert_eq!(config.layout.line_tolerance, 5);
        assert_eq!(config.client_name.max_length, 50);
        assert!(config.pdf.fallback_to_flat_text);
    }
}
