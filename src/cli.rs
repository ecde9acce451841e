//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands, and their argument structs. Commands that work on a
//! configuration take the file path and an optional schema path; the
//! schema defaults to the configuration path with an `.xsd` extension.
//! Logging flags are global and have environment variable equivalents.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "xmlconf",
    version,
    about = "Schema-validated XML configuration store",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        xmlconf validate core.xml                        Check against core.xsd\n  \
        xmlconf show core.xml                            Sections, keys and tables\n  \
        xmlconf set core.xml /configuration/global/delay 250\n  \
        xmlconf spot add core.xml 3                      Replicate rows for spot 3"
)]
pub struct Cli {
    #[command(flatten)]
    pub logging: LogArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a configuration against its schema
    Validate(ValidateArgs),

    /// Print sections, keys and tables
    Show(ShowArgs),

    /// Print the value(s) at a path
    Get(GetArgs),

    /// Set a key or attribute and write the file
    Set(SetArgs),

    /// Add, create or remove table rows
    Line {
        #[command(subcommand)]
        action: LineAction,
    },

    /// Add or remove a spot in every section
    Spot {
        #[command(subcommand)]
        action: SpotAction,
    },

    /// Add or remove a gateway
    Gw {
        #[command(subcommand)]
        action: GwAction,
    },

    /// List file references with their default and adapted source names
    Files(FilesArgs),

    /// Describe an element or attribute from a schema
    Describe(DescribeArgs),

    /// Export the configuration tree as JSON, YAML or TOML
    Export(ExportArgs),
}

#[derive(Args)]
pub struct LogArgs {
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "warn", global = true)]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long, global = true)]
    pub log_pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, global = true, conflicts_with = "log_pretty")]
    pub log_json: bool,
}

#[derive(Args, Clone)]
pub struct Target {
    /// Configuration file
    #[arg(env = "XMLCONF_CONFIG")]
    pub config: PathBuf,

    /// Schema file [default: <config>.xsd]
    #[arg(short, long, env = "XMLCONF_SCHEMA")]
    pub schema: Option<PathBuf>,
}

impl Target {
    #[must_use]
    pub fn schema_path(&self) -> PathBuf {
        self.schema
            .clone()
            .unwrap_or_else(|| self.config.with_extension("xsd"))
    }
}

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub target: Target,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ValidateFormat,
}

#[derive(Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub target: Target,

    /// Include keys the schema marks as hidden or advanced
    #[arg(short, long)]
    pub all: bool,
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        xmlconf get core.xml /configuration/global/delay\n  \
        xmlconf get core.xml '//spot[@id=\"1\"]' -a gw\n  \
        xmlconf get core.xml '//carrier/@symbol_rate'")]
pub struct GetArgs {
    #[command(flatten)]
    pub target: Target,

    /// Path expression
    pub path: String,

    /// Attribute to read on the matched nodes
    #[arg(short, long)]
    pub attribute: Option<String>,
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        xmlconf set core.xml /configuration/global/delay 250\n  \
        xmlconf set core.xml '//carriers/carrier[2]' 64 -a symbol_rate\n  \
        xmlconf set core.xml '//carrier' 64 -a symbol_rate --all")]
pub struct SetArgs {
    #[command(flatten)]
    pub target: Target,

    /// Path expression
    pub path: String,

    /// New value
    pub value: String,

    /// Set this (existing) attribute instead of the text
    #[arg(short, long)]
    pub attribute: Option<String>,

    /// Update every match instead of exactly one
    #[arg(long, requires = "attribute")]
    pub all: bool,
}

#[derive(Subcommand)]
pub enum LineAction {
    /// Append a copy of the first row
    Add {
        #[command(flatten)]
        target: Target,

        /// Path of the table
        table: String,
    },

    /// Append a new row with the given attributes
    Create {
        #[command(flatten)]
        target: Target,

        /// Path of the table
        table: String,

        /// Row element name
        tag: String,

        /// Row attributes as key=value
        #[arg(value_parser = parse_key_value)]
        attributes: Vec<(String, String)>,
    },

    /// Remove a row
    Remove {
        #[command(flatten)]
        target: Target,

        /// Path of the table
        table: String,

        /// 0-based row index, comments not counted
        #[arg(short, long, default_value_t = 0)]
        index: usize,
    },
}

#[derive(Args)]
pub struct SpotArgs {
    #[command(flatten)]
    pub target: Target,

    /// Spot id
    pub id: String,
}

#[derive(Subcommand)]
pub enum SpotAction {
    /// Replicate spot rows for a new spot id
    Add(SpotArgs),
    /// Remove every row of a spot
    Remove(SpotArgs),
}

#[derive(Args)]
pub struct GwArgs {
    #[command(flatten)]
    pub target: Target,

    /// Gateway id
    pub id: String,

    /// Restrict to the section at this path
    #[arg(long)]
    pub section: Option<String>,
}

#[derive(Subcommand)]
pub enum GwAction {
    /// Replicate spot and gateway rows for a new gateway id
    Add(GwArgs),
    /// Remove every row of a gateway
    Remove(GwArgs),
}

#[derive(Args)]
pub struct FilesArgs {
    #[command(flatten)]
    pub target: Target,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        xmlconf describe core.xsd delay\n  \
        xmlconf describe core.xsd symbol_rate --parent carrier --json")]
pub struct DescribeArgs {
    /// Schema file
    pub schema: PathBuf,

    /// Element or attribute name
    pub name: String,

    /// Owning element, to describe an attribute
    #[arg(short, long)]
    pub parent: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub target: Target,

    /// Output format
    #[arg(short, long, default_value = "json")]
    pub format: ExportFormat,

    /// Output file path [default: stdout]
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ExportFormat {
    Yaml,
    Json,
    Toml,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ValidateFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_defaults_next_to_the_config() {
        let cli = Cli::parse_from(["xmlconf", "validate", "conf/core.xml"]);
        let Some(Commands::Validate(args)) = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(args.target.schema_path(), PathBuf::from("conf/core.xsd"));
    }

    #[test]
    fn line_create_parses_attributes() {
        let cli = Cli::parse_from([
            "xmlconf",
            "line",
            "create",
            "core.xml",
            "/configuration/global/carriers",
            "carrier",
            "id=3",
            "type=data",
        ]);
        let Some(Commands::Line {
            action: LineAction::Create { attributes, tag, .. },
        }) = cli.command
        else {
            panic!("expected line create");
        };
        assert_eq!(tag, "carrier");
        assert_eq!(
            attributes,
            vec![
                ("id".to_string(), "3".to_string()),
                ("type".to_string(), "data".to_string())
            ]
        );
    }

    #[test]
    fn set_all_requires_an_attribute() {
        assert!(Cli::try_parse_from(["xmlconf", "set", "core.xml", "//a", "1", "--all"]).is_err());
        assert!(Cli::try_parse_from(["xmlconf", "set", "core.xml", "//a", "1", "-a", "x", "--all"]).is_ok());
    }

    #[test]
    fn malformed_key_value_is_rejected() {
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
        assert_eq!(parse_key_value("k=a=b").unwrap(), ("k".into(), "a=b".into()));
    }
}
