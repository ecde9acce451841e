//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function initialises logging from the global flags and
//! routes the parsed CLI to the matching handler. Each handler lives in its
//! own submodule and exposes an `execute` function. Handlers that modify a
//! configuration always go through [`XmlConfig::write`](crate::XmlConfig::write),
//! so nothing invalid reaches the disk.

pub mod describe;
pub mod dimension;
pub mod export;
pub mod files;
pub mod get;
pub mod line;
pub mod set;
pub mod show;
pub mod validate;

use crate::cli::{Cli, Commands, Target};
use crate::error::XmlConfError;
use crate::logging;
use crate::store::XmlConfig;

pub fn dispatch(cli: Cli) -> Result<(), XmlConfError> {
    logging::init_from_args(&cli.logging);

    match cli.command {
        Some(Commands::Validate(ref args)) => validate::execute(args),
        Some(Commands::Show(ref args)) => show::execute(args),
        Some(Commands::Get(ref args)) => get::execute(args),
        Some(Commands::Set(ref args)) => set::execute(args),
        Some(Commands::Line { ref action }) => line::execute(action),
        Some(Commands::Spot { ref action }) => dimension::execute_spot(action),
        Some(Commands::Gw { ref action }) => dimension::execute_gw(action),
        Some(Commands::Files(ref args)) => files::execute(args),
        Some(Commands::Describe(ref args)) => describe::execute(args),
        Some(Commands::Export(ref args)) => export::execute(args),
        None => {
            print_welcome();
            Ok(())
        }
    }
}

/// Open the configuration a command targets.
pub(crate) fn open(target: &Target) -> Result<XmlConfig, XmlConfError> {
    XmlConfig::open(&target.config, target.schema_path())
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  xmlconf v{version}: schema-validated XML configuration store\n\n  \
         No command provided. To get started:\n\n    \
         xmlconf validate core.xml          Check core.xml against core.xsd\n    \
         xmlconf show core.xml              Print sections, keys and tables\n    \
         xmlconf describe core.xsd delay    Type, unit and hints of an element\n    \
         xmlconf --help                     See all commands and options\n"
    );
}
