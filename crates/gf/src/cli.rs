//! CLI argument parsing using clap derive macros.
//!
//! Every editing command reads a model file (the JSON written by
//! `export_state`), applies one change and writes it back.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// gf - edit and translate multi-operator grid filters
#[derive(Parser, Debug)]
#[command(name = "gf")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Machine-readable JSON output
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output (also honours NO_COLOR)
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an empty model file
    New {
        /// Model file to create
        file: PathBuf,

        /// Grid column the filter belongs to
        #[arg(short, long, default_value = "filter")]
        column: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the filter tree
    #[command(alias = "s")]
    Show {
        /// Model file
        file: PathBuf,
    },

    /// Add a node to a group
    #[command(alias = "a")]
    Add {
        /// Model file
        file: PathBuf,

        #[command(subcommand)]
        node: AddCommands,
    },

    /// Remove a node and its subtree
    #[command(alias = "rm")]
    Remove {
        /// Model file
        file: PathBuf,

        /// Node ID
        id: String,
    },

    /// Change fields of one node
    Set(SetArgs),

    /// Move a node under another group
    #[command(alias = "mv")]
    Move {
        /// Model file
        file: PathBuf,

        /// Node ID
        id: String,

        /// Target group ID
        parent: String,

        /// Position among the target's children (default: last)
        #[arg(long)]
        index: Option<usize>,
    },

    /// Analyse node count, depth and operator use
    Complexity {
        /// Model file
        file: PathBuf,
    },

    /// Translate the filter into a query
    #[command(alias = "gen")]
    Generate {
        /// Model file
        file: PathBuf,

        /// Output form
        #[arg(short, long, value_enum, default_value = "sql")]
        target: Target,
    },

    /// Validate a custom logic expression
    Logic {
        /// Expression, e.g. "A AND (B OR NOT C)"
        expression: String,

        /// Number of children the expression may reference
        #[arg(short = 'n', long)]
        children: usize,
    },

    /// Evaluate the filter against JSON rows
    Eval {
        /// Model file
        file: PathBuf,

        /// JSON file holding an array of row objects
        rows: PathBuf,
    },

    /// View and manage configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Node kinds for `gf add`
#[derive(Subcommand, Debug)]
pub enum AddCommands {
    /// Single-column condition
    #[command(alias = "c")]
    Condition {
        /// Column to test
        column: String,

        /// Grid operator name (equals, greaterThan, contains, between, ...)
        operator: String,

        /// Comparison value (omit for unary operators such as isEmpty)
        value: Option<String>,

        /// How to read the value
        #[arg(short = 't', long = "type", value_enum, default_value = "auto")]
        value_type: ValueType,

        /// Parent group ID (default: root)
        #[arg(short, long)]
        parent: Option<String>,

        /// Add the condition disabled
        #[arg(long)]
        disabled: bool,
    },

    /// Group combining its children with an operator
    #[command(alias = "g")]
    Group {
        /// Logical operator (AND, OR, NOT, XOR, ...)
        #[arg(default_value = "AND")]
        operator: String,

        /// Parent group ID (default: root)
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Free-text formula such as "age > 18 AND status = 'active'"
    #[command(alias = "f")]
    Formula {
        /// Formula text
        formula: String,

        /// Parent group ID (default: root)
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Natural-language query, kept until an interpreter answers
    #[command(alias = "n")]
    Natural {
        /// Query text
        query: String,

        /// Parent group ID (default: root)
        #[arg(short, long)]
        parent: Option<String>,
    },
}

/// Arguments for `gf set`
#[derive(Args, Debug)]
pub struct SetArgs {
    /// Model file
    pub file: PathBuf,

    /// Node ID
    pub id: String,

    /// Group: logical operator
    #[arg(long)]
    pub operator: Option<String>,

    /// Group: custom logic expression (implies --operator CUSTOM)
    #[arg(long)]
    pub logic: Option<String>,

    /// Group: negate the combined result
    #[arg(long)]
    pub negated: Option<bool>,

    /// Condition: enable or disable
    #[arg(long)]
    pub enabled: Option<bool>,

    /// Condition: column
    #[arg(long)]
    pub column: Option<String>,

    /// Condition: grid operator name (requires --value unless unary)
    #[arg(long = "op")]
    pub condition_operator: Option<String>,

    /// Condition: comparison value
    #[arg(long)]
    pub value: Option<String>,

    /// Condition: how to read --value
    #[arg(short = 't', long = "type", value_enum, default_value = "auto")]
    pub value_type: ValueType,

    /// Condition: scoring weight
    #[arg(long)]
    pub weight: Option<f64>,

    /// Formula: new text
    #[arg(long)]
    pub formula: Option<String>,

    /// Natural-language: new query (drops any interpretation)
    #[arg(long)]
    pub query: Option<String>,

    /// Any node: display label
    #[arg(long)]
    pub label: Option<String>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Show config file path
    Path,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Query forms for `gf generate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    Sql,
    Document,
    Natural,
}

/// Value interpretation for condition values
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ValueType {
    /// Number, boolean or YYYY-MM-DD date when it parses as one, else text
    Auto,
    Text,
    Number,
    Date,
    Bool,
    /// Comma-separated list (for in, notIn and between)
    Set,
}

/// Supported shells for completions
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}
