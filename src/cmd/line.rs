//! `xmlconf line`: add, create or remove table rows.

use console::style;

use crate::cli::LineAction;
use crate::error::XmlConfError;

pub fn execute(action: &LineAction) -> Result<(), XmlConfError> {
    let (target, message) = match action {
        LineAction::Add { target, table } => {
            let mut config = super::open(target)?;
            let row = config.add_line(table)?;
            let path = config.get_path(row);
            config.write()?;
            (target, format!("added {path}"))
        }
        LineAction::Create {
            target,
            table,
            tag,
            attributes,
        } => {
            let mut config = super::open(target)?;
            let row = config.create_line(attributes.clone(), tag, table)?;
            let path = config.get_path(row);
            config.write()?;
            (target, format!("created {path}"))
        }
        LineAction::Remove {
            target,
            table,
            index,
        } => {
            let mut config = super::open(target)?;
            config.remove_line(table, *index)?;
            config.write()?;
            (target, format!("removed row {index} of {table}"))
        }
    };

    println!(
        "{} {}: {message}",
        style("\u{2713}").green().bold(),
        target.config.display()
    );
    Ok(())
}
