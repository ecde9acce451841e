//! xmlconf is a schema-validated XML configuration store.
//!
//! It loads an XML configuration together with its XSD schema, exposes
//! path-addressed reads and structural edits, and only writes documents
//! that still validate. The schema doubles as a metadata source: types,
//! units, defaults, file templates and display hints are read from its
//! annotations.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution.
//! - [`tree`] -- Arena-backed document model, parsing and serialization.
//! - [`path`] -- XPath-style path expressions and canonical node paths.
//! - [`schema`] -- Schema introspection and validation.
//! - [`store`] -- [`XmlConfig`]: a document bound to its file and schema.
//! - [`dimension`] -- Spot and gateway row replication.
//! - [`filename`] -- Per-spot, per-gateway and per-line file names.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML export _(enabled by default)_ |
//! | `toml` | TOML export |

// Every fallible function returns XmlConfError, whose variants document the failures.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod dimension;
pub mod error;
pub mod filename;
pub mod logging;
pub mod path;
pub mod schema;
pub mod store;
pub mod tree;

pub use error::{ValidationError, XmlConfError};
pub use schema::SchemaIntrospector;
pub use store::{ConfigVersion, FileReference, XmlConfig};
pub use tree::{Document, NodeId, NodeKind, XmlElement};
