//! `xmlconf get`: print the value of every node a path matches.
//!
//! A single match prints the bare value; several matches print one
//! `path<TAB>value` line each.

use crate::cli::GetArgs;
use crate::error::XmlConfError;
use crate::path::PathExpr;

pub fn execute(args: &GetArgs) -> Result<(), XmlConfError> {
    let config = super::open(&args.target)?;
    let expr = PathExpr::parse(&args.path)?;
    let attribute = args.attribute.as_deref().or_else(|| expr.attribute());

    let matches = expr.select(config.document());
    if matches.is_empty() {
        return Err(XmlConfError::Path {
            path: args.path.clone(),
            found: 0,
        });
    }

    let single = matches.len() == 1;
    for node in matches {
        let value = match attribute {
            Some(attribute) => config.document().attribute(node, attribute),
            None => config.get_value(node)?,
        }
        .unwrap_or_default();
        if single {
            println!("{value}");
        } else {
            println!("{}\t{value}", config.get_path(node));
        }
    }
    Ok(())
}
