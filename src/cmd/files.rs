//! `xmlconf files`: list file references with their adapted source names.

use crate::cli::FilesArgs;
use crate::error::XmlConfError;

pub fn execute(args: &FilesArgs) -> Result<(), XmlConfError> {
    let config = super::open(&args.target)?;
    let files = config.get_file_paths();

    if args.json {
        let json = serde_json::to_string_pretty(&files)
            .map_err(|e| XmlConfError::Io(std::io::Error::other(e.to_string())))?;
        println!("{json}");
        return Ok(());
    }

    for file in &files {
        println!(
            "{}\n  default: {}\n  source:  {}",
            file.path,
            file.default.as_deref().unwrap_or("-"),
            file.source.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
