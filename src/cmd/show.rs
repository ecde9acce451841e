//! `xmlconf show`: print sections, keys and tables.
//!
//! Keys the schema flags as hidden or advanced-only are skipped unless
//! `--all` is given. Scalar values carry their documented unit.

use console::style;

use crate::cli::ShowArgs;
use crate::error::XmlConfError;
use crate::store::XmlConfig;
use crate::tree::{NodeId, NodeKind};

pub fn execute(args: &ShowArgs) -> Result<(), XmlConfError> {
    let config = super::open(&args.target)?;
    let mut out = String::new();
    for section in config.get_sections() {
        if is_hidden(&config, config.get_name(section), args.all) {
            continue;
        }
        out.push_str(&format!("{}\n", style(config.get_name(section)).bold()));
        for key in config.get_keys(section) {
            render(&config, key, 1, args.all, &mut out)?;
        }
    }
    print!("{out}");
    Ok(())
}

fn is_hidden(config: &XmlConfig, name: &str, all: bool) -> bool {
    let schema = config.schema();
    schema.do_hide_adv(name, all) || (!all && schema.do_hide(name))
}

fn render(
    config: &XmlConfig,
    id: NodeId,
    depth: usize,
    all: bool,
    out: &mut String,
) -> Result<(), XmlConfError> {
    let name = config.get_name(id);
    if is_hidden(config, name, all) {
        return Ok(());
    }
    let indent = "  ".repeat(depth);
    let attributes = attribute_list(config.get_element_content(id));

    match config.document().kind(id) {
        NodeKind::Table => {
            let rows = config.get_table_elements(id);
            out.push_str(&format!(
                "{indent}{}{attributes} {}\n",
                style(name).cyan(),
                style(format!("({} entries)", rows.len())).dim()
            ));
            for row in rows {
                render(config, row, depth + 1, all, out)?;
            }
        }
        NodeKind::Row => {
            out.push_str(&format!("{indent}{name}{attributes}\n"));
        }
        _ => {
            let value = config.get_value(id)?.unwrap_or_default();
            let unit = config
                .schema()
                .get_unit(name, None)
                .map(|unit| format!(" {}", style(unit).dim()))
                .unwrap_or_default();
            out.push_str(&format!("{indent}{name}{attributes} = {value}{unit}\n"));
        }
    }
    Ok(())
}

fn attribute_list(attributes: &[(String, String)]) -> String {
    attributes
        .iter()
        .map(|(k, v)| format!(" {k}={v}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_render_inline() {
        let attrs = vec![("id".to_string(), "1".to_string()), ("gw".to_string(), "0".to_string())];
        assert_eq!(attribute_list(&attrs), " id=1 gw=0");
        assert_eq!(attribute_list(&[]), "");
    }
}
