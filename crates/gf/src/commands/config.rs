//! Config command implementation.
//!
//! The config file is located at ~/.config/gf/config.toml unless `GF_CONFIG`
//! or `XDG_CONFIG_HOME` say otherwise.

use std::env;
use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;
use gridfilter_engine::{ComplexityThresholds, EngineConfig, HistoryConfig};
use serde::{Deserialize, Serialize};

use super::{CommandContext, CommandError, Result};

/// Current config file version. Increment when making breaking changes to schema.
const CONFIG_VERSION: u32 = 1;

/// Default config file contents.
const DEFAULT_CONFIG: &str = r#"# gf - grid filter CLI configuration

# Config schema version (do not modify)
version = 1

# Node-count tiers and suggestion triggers for `gf complexity`
[complexity]
# excellent_below = 10
# good_below = 25
# fair_below = 50
# prune_above = 25
# flatten_depth_above = 5
# diversity_above = 4

# Undo snapshots kept per editing session
[history]
# capacity = 50

# Output preferences
[output]
# color = true   # Enable colors (respects NO_COLOR env)
"#;

/// Configuration file structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version for migrations.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Complexity thresholds.
    #[serde(default)]
    pub complexity: ComplexityThresholds,

    /// History settings.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            complexity: ComplexityThresholds::default(),
            history: HistoryConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// The engine policy this config describes.
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            complexity: self.complexity,
            history: self.history,
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Enable colors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

/// Gets the config file path.
///
/// Resolution order: `GF_CONFIG`, `$XDG_CONFIG_HOME/gf/config.toml`,
/// `~/.config/gf/config.toml`.
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = env::var("GF_CONFIG") {
        return Ok(PathBuf::from(path));
    }

    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config).join("gf").join("config.toml"));
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("gf").join("config.toml"))
        .ok_or_else(|| CommandError::Config("Could not determine config directory".to_string()))
}

/// Loads the configuration from disk. A missing file gives the defaults.
pub fn load_config() -> Result<Config> {
    let path = get_config_path()?;

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| CommandError::Config(format!("Failed to read config: {}", e)))?;

    parse_config(&content)
}

fn parse_config(content: &str) -> Result<Config> {
    let mut config: Config = toml::from_str(content)
        .map_err(|e| CommandError::Config(format!("Failed to parse config: {}", e)))?;

    if config.version > CONFIG_VERSION {
        return Err(CommandError::Config(format!(
            "Config version {} is newer than supported version {}",
            config.version, CONFIG_VERSION
        )));
    }
    config.version = CONFIG_VERSION;
    Ok(config)
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext) -> Result<()> {
    let config = load_config()?;
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        use owo_colors::OwoColorize;

        let header = "Configuration";
        if ctx.use_colors {
            println!("{}\n", header.green().bold());
        } else {
            println!("{}\n", header);
        }

        println!("File: {}", path.display());
        println!("Exists: {}\n", path.exists());

        let c = &config.complexity;
        println!("[complexity]");
        println!("  excellent_below: {}", c.excellent_below);
        println!("  good_below: {}", c.good_below);
        println!("  fair_below: {}", c.fair_below);
        println!("  prune_above: {}", c.prune_above);
        println!("  flatten_depth_above: {}", c.flatten_depth_above);
        println!("  diversity_above: {}", c.diversity_above);

        println!("\n[history]");
        println!("  capacity: {}", config.history.capacity);

        println!("\n[output]");
        match config.output.color {
            Some(color) => println!("  color: {}", color),
            None => println!("  color: (default)"),
        }
    }

    Ok(())
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

/// Executes the config init command.
pub fn execute_init(ctx: &CommandContext, force: bool) -> Result<()> {
    let path = get_config_path()?;

    if path.exists() && !force {
        return Err(CommandError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            CommandError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }
    fs::write(&path, DEFAULT_CONFIG)
        .map_err(|e| CommandError::Config(format!("Failed to write config: {}", e)))?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "created",
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        ctx.print(format!("Created default config at: {}", path.display()));
    }

    Ok(())
}
