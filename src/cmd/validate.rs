//! `xmlconf validate`: check a configuration file against its schema.
//!
//! Loads both files and reports every schema violation, in either
//! human-readable text or machine-readable JSON format.

use console::style;

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::error::XmlConfError;

pub fn execute(args: &ValidateArgs) -> Result<(), XmlConfError> {
    let path = &args.target.config;

    let config = match super::open(&args.target) {
        Ok(config) => config,
        Err(XmlConfError::Validation { errors }) => {
            match args.format {
                ValidateFormat::Text => {
                    eprintln!(
                        "{} {} has {} errors\n",
                        style("\u{2717}").red().bold(),
                        path.display(),
                        errors.len()
                    );
                    for error in &errors {
                        eprintln!("{error}");
                    }
                }
                ValidateFormat::Json => {
                    let json_errors: Vec<serde_json::Value> = errors
                        .iter()
                        .map(|e| serde_json::json!({ "path": e.path, "message": e.message }))
                        .collect();
                    println!(
                        "{}",
                        serde_json::json!({
                            "valid": false,
                            "errors": json_errors,
                        })
                    );
                }
            }
            return Err(XmlConfError::Validation { errors });
        }
        Err(e) => return Err(e),
    };

    let sections = config.get_sections().len();
    let tables = config
        .document()
        .descendants(config.document().root())
        .into_iter()
        .filter(|id| config.is_table(*id))
        .count();

    match args.format {
        ValidateFormat::Text => {
            println!(
                "{} {} is valid against {} ({sections} sections, {tables} tables)",
                style("\u{2713}").green().bold(),
                path.display(),
                config.schema_path().display()
            );
        }
        ValidateFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "valid": true,
                    "sections": sections,
                    "tables": tables,
                })
            );
        }
    }

    Ok(())
}
