//! `xmlconf export`: dump the configuration tree as JSON, YAML or TOML.
//!
//! The tree goes through [`XmlConfig::to_json`](crate::XmlConfig::to_json)
//! first, so every format shares the same shape: attributes as `@name`
//! keys, mixed text as `#text`, repeated children as arrays.

use std::io::Write;

use serde_json::Value;

use crate::cli::{ExportArgs, ExportFormat};
use crate::error::XmlConfError;

/// Serialize an exported tree to a formatted string in the given format.
pub fn serialize_tree(tree: &Value, format: &ExportFormat) -> Result<String, XmlConfError> {
    match format {
        #[cfg(feature = "yaml")]
        ExportFormat::Yaml => serde_yml::to_string(tree)
            .map_err(|e| XmlConfError::Io(std::io::Error::other(e.to_string()))),

        #[cfg(not(feature = "yaml"))]
        ExportFormat::Yaml => Err(XmlConfError::UnsupportedFormat("yaml".into())),

        ExportFormat::Json => serde_json::to_string_pretty(tree)
            .map_err(|e| XmlConfError::Io(std::io::Error::other(e.to_string()))),

        #[cfg(feature = "toml")]
        ExportFormat::Toml => toml::to_string_pretty(tree)
            .map_err(|e| XmlConfError::Io(std::io::Error::other(e.to_string()))),

        #[cfg(not(feature = "toml"))]
        ExportFormat::Toml => Err(XmlConfError::UnsupportedFormat("toml".into())),
    }
}

pub fn execute(args: &ExportArgs) -> Result<(), XmlConfError> {
    let config = super::open(&args.target)?;
    let content = serialize_tree(&config.to_json(), &args.format)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &content)?;
            tracing::info!(output = %path.display(), "configuration exported");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Value {
        serde_json::json!({
            "configuration": {
                "@component": "gw",
                "global": { "delay": "250" }
            }
        })
    }

    #[test]
    fn json_is_pretty_printed() {
        let out = serialize_tree(&tree(), &ExportFormat::Json).unwrap();
        assert!(out.contains("\n  \"configuration\""));
        assert!(out.contains("\"@component\": \"gw\""));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_export() {
        let out = serialize_tree(&tree(), &ExportFormat::Yaml).unwrap();
        assert!(out.contains("delay:"));
        assert!(out.contains("@component"));
    }

    #[cfg(not(feature = "toml"))]
    #[test]
    fn toml_without_feature_is_unsupported() {
        let err = serialize_tree(&tree(), &ExportFormat::Toml).unwrap_err();
        assert!(matches!(err, XmlConfError::UnsupportedFormat(ref f) if f == "toml"));
    }
}
