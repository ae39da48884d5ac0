//! Serialization of generated documents to JSON or YAML text and files.

use log::{error, info};
use serde::Serialize;
use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::error::{SwagError, SwagResult};

/// Base file name of exported documents
pub const DOCUMENT_FILE_STEM: &str = "swagger";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }

    /// Render `document` in this format
    pub fn render<T: Serialize>(&self, document: &T) -> SwagResult<String> {
        match self {
            OutputFormat::Json => to_json(document),
            OutputFormat::Yaml => to_yaml(document),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = SwagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            other => Err(SwagError::config(format!("Unknown output type: {}", other))),
        }
    }
}

/// Pretty-printed JSON text of a document
pub fn to_json<T: Serialize>(document: &T) -> SwagResult<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// JSON text of a document, or an empty string after logging the failure
pub fn to_json_lossy<T: Serialize>(document: &T) -> String {
    to_json(document).unwrap_or_else(|e| {
        error!("Failed to serialize document to JSON: {}", e);
        String::new()
    })
}

pub fn to_yaml<T: Serialize>(document: &T) -> SwagResult<String> {
    Ok(serde_yaml::to_string(document)?)
}

/// Write `document` to `path`, creating parent directories as needed
pub fn export_to_file<T: Serialize>(document: &T, path: impl AsRef<Path>, format: OutputFormat) -> SwagResult<()> {
    let path = path.as_ref();
    let content = format.render(document)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;

    info!("Exported {} document to {}", format, path.display());
    Ok(())
}

/// Write `document` once per format as `<output_dir>/swagger.<ext>`,
/// returning the written paths
pub fn export_all<T: Serialize>(
    document: &T,
    output_dir: impl AsRef<Path>,
    formats: &[OutputFormat],
) -> SwagResult<Vec<PathBuf>> {
    let output_dir = output_dir.as_ref();
    let mut written = Vec::with_capacity(formats.len());
    for format in formats {
        let path = output_dir.join(format!("{}.{}", DOCUMENT_FILE_STEM, format.extension()));
        export_to_file(document, &path, *format)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(" YML ".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert!(matches!("go".parse::<OutputFormat>(), Err(SwagError::Config(_))));
    }

    #[test]
    fn test_export_all_writes_each_format() {
        let dir = tempdir().unwrap();
        let document = json!({"swagger": "2.0", "paths": {}});

        let written = export_all(&document, dir.path().join("docs"), &[OutputFormat::Json, OutputFormat::Yaml]).unwrap();
        assert_eq!(written.len(), 2);

        let text = fs::read_to_string(&written[0]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, document);

        let yaml = fs::read_to_string(&written[1]).unwrap();
        let parsed: serde_json::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, document);
    }

    #[test]
    fn test_lossy_json() {
        assert_eq!(to_json_lossy(&json!({"a": 1})), "{\n  \"a\": 1\n}");
    }
}
