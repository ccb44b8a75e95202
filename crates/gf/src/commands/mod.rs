//! Command implementations for the gf CLI.
//!
//! Each handler loads what it needs, calls the engine and prints through
//! [`crate::output`].

pub mod completions;
pub mod config;
pub mod edit;
pub mod inspect;
pub mod model_file;

use std::env;

use gridfilter_engine::{EngineConfig, ImportError, LogicError, TreeError};

use crate::cli::Cli;

/// Error type for command execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// A tree edit was rejected.
    #[error("{0}")]
    Tree(#[from] TreeError),

    /// A model file could not be read as a filter model.
    #[error("invalid model file: {0}")]
    Import(#[from] ImportError),

    /// A custom logic expression is invalid.
    #[error("invalid custom logic: {0}")]
    Logic(#[from] LogicError),

    /// A command-line value could not be used.
    #[error("{0}")]
    InvalidInput(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Context for command execution, containing common dependencies.
pub struct CommandContext {
    /// Whether to output JSON.
    pub json_output: bool,
    /// Whether to use colors.
    pub use_colors: bool,
    /// Whether to be quiet (errors only).
    pub quiet: bool,
    /// Whether to be verbose.
    pub verbose: bool,
    /// Engine policy from the config file.
    pub engine: EngineConfig,
}

impl CommandContext {
    /// Creates a context from CLI arguments and the loaded config.
    pub fn new(cli: &Cli, config: &config::Config) -> Self {
        let color_allowed = config.output.color.unwrap_or(true) && env::var_os("NO_COLOR").is_none();
        Self {
            json_output: cli.json,
            use_colors: !cli.no_color && color_allowed,
            quiet: cli.quiet,
            verbose: cli.verbose,
            engine: config.engine(),
        }
    }

    /// Prints human output unless quiet.
    pub fn print(&self, text: impl AsRef<str>) {
        if !self.quiet {
            println!("{}", text.as_ref());
        }
    }
}
