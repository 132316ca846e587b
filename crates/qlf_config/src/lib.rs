//! Parsing, validation and resolution of `qlfasm.toml` tool configuration.
//!
//! The configuration file is optional. Every setting it holds can also be
//! given on the command line, and [`resolve`] merges the two with the
//! command line taking precedence.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE_NAME};
pub use resolve::{resolve, DefaultBitstream, Overrides, ResolvedRun, DB_ROOT_ENV};
pub use types::*;
