//! Subcommands.

pub mod batch;
pub mod config;
pub mod cpi;
pub mod process;

use std::fs;
use std::path::Path;

use tracing::debug;

use epe_core::models::config::EpeConfig;

/// Load the configuration from an explicit path, the default location, or
/// fall back to defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<EpeConfig> {
    if let Some(path) = config_path {
        return Ok(EpeConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using config at {}", default_path.display());
        Ok(EpeConfig::from_file(&default_path)?)
    } else {
        Ok(EpeConfig::default())
    }
}

/// Logical document text of a bill file.
///
/// PDFs go through layout reconstruction, `.txt` files are taken as already
/// reconstructed text.
pub fn read_document_text(path: &Path, config: &EpeConfig) -> anyhow::Result<String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let text = match extension.as_str() {
        "pdf" => {
            let data = fs::read(path)?;
            epe_core::pdf::extract_document_text(&data, config)?
        }
        "txt" => fs::read_to_string(path)?,
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    };

    Ok(text)
}

/// File name used as the bill's source name.
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_string()
}

pub fn is_supported(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    matches!(ext.to_lowercase().as_str(), "pdf" | "txt")
}
