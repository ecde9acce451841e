//! `xmlconf spot` and `xmlconf gw`: replicate or drop rows per spot or gateway.

use console::style;

use crate::cli::{GwAction, SpotAction, Target};
use crate::error::XmlConfError;

pub fn execute_spot(action: &SpotAction) -> Result<(), XmlConfError> {
    let (args, added) = match action {
        SpotAction::Add(args) => (args, true),
        SpotAction::Remove(args) => (args, false),
    };
    let mut config = super::open(&args.target)?;
    let count = if added {
        config.add_spot(&args.id)
    } else {
        config.remove_spot(&args.id)
    };
    config.write()?;
    report(&args.target, "spot", &args.id, added, count);
    Ok(())
}

pub fn execute_gw(action: &GwAction) -> Result<(), XmlConfError> {
    let (args, added) = match action {
        GwAction::Add(args) => (args, true),
        GwAction::Remove(args) => (args, false),
    };
    let mut config = super::open(&args.target)?;
    let count = match (&args.section, added) {
        (Some(section), true) => config.add_gw_in(section, &args.id)?,
        (Some(section), false) => config.remove_gw_in(section, &args.id)?,
        (None, true) => config.add_gw(&args.id),
        (None, false) => config.remove_gw(&args.id),
    };
    config.write()?;
    report(&args.target, "gateway", &args.id, added, count);
    Ok(())
}

fn report(target: &Target, what: &str, id: &str, added: bool, rows: usize) {
    let verb = if added { "added" } else { "removed" };
    println!(
        "{} {}: {what} {id} {verb} ({rows} rows)",
        style("\u{2713}").green().bold(),
        target.config.display()
    );
}
