//! `xmlconf set`: update a key or attribute and write the file.

use console::style;

use crate::cli::SetArgs;
use crate::error::XmlConfError;

pub fn execute(args: &SetArgs) -> Result<(), XmlConfError> {
    let mut config = super::open(&args.target)?;

    let updated = match (&args.attribute, args.all) {
        (Some(attribute), true) => config.set_values(&args.value, &args.path, attribute)?,
        (attribute, _) => {
            config.set_value(&args.value, &args.path, attribute.as_deref())?;
            1
        }
    };
    config.write()?;

    println!(
        "{} {} updated ({updated} node{})",
        style("\u{2713}").green().bold(),
        config.path().display(),
        if updated == 1 { "" } else { "s" }
    );
    Ok(())
}
