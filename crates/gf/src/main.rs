use std::process::ExitCode;

use clap::Parser;

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands, ConfigCommands};
use commands::config::{load_config, Config};
use commands::{CommandContext, CommandError};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                let error_json = serde_json::json!({
                    "error": {
                        "code": error_code(&e),
                        "message": e.to_string(),
                    }
                });
                match serde_json::to_string_pretty(&error_json) {
                    Ok(text) => eprintln!("{text}"),
                    Err(_) => eprintln!("Error: {e}"),
                }
            } else {
                eprintln!("Error: {e}");
            }
            error_exit_code(&e)
        }
    }
}

/// Logs go to stderr. `GF_LOG` takes an `EnvFilter` directive and wins over
/// `--verbose` and `--quiet`.
fn init_tracing(cli: &Cli) {
    // Generation fallbacks are already shown next to the output.
    let default = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn,gridfilter_engine::codegen=error"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("GF_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(cli.verbose)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> commands::Result<()> {
    // A broken config file must not lock the user out of `gf config`.
    let config = match (&cli.command, load_config()) {
        (_, Ok(config)) => config,
        (Commands::Config { .. } | Commands::Completions { .. }, Err(e)) => {
            tracing::warn!(error = %e, "ignoring unreadable config");
            Config::default()
        }
        (_, Err(e)) => return Err(e),
    };
    let ctx = CommandContext::new(cli, &config);

    match &cli.command {
        Commands::New {
            file,
            column,
            force,
        } => commands::edit::execute_new(&ctx, file, column, *force),
        Commands::Show { file } => commands::inspect::execute_show(&ctx, file),
        Commands::Add { file, node } => commands::edit::execute_add(&ctx, file, node),
        Commands::Remove { file, id } => commands::edit::execute_remove(&ctx, file, id),
        Commands::Set(args) => commands::edit::execute_set(&ctx, args),
        Commands::Move {
            file,
            id,
            parent,
            index,
        } => commands::edit::execute_move(&ctx, file, id, parent, *index),
        Commands::Complexity { file } => commands::inspect::execute_complexity(&ctx, file),
        Commands::Generate { file, target } => {
            commands::inspect::execute_generate(&ctx, file, *target)
        }
        Commands::Logic {
            expression,
            children,
        } => commands::inspect::execute_logic(&ctx, expression, *children),
        Commands::Eval { file, rows } => commands::inspect::execute_eval(&ctx, file, rows),
        Commands::Config { command } => match command {
            None | Some(ConfigCommands::Show) => commands::config::execute_show(&ctx),
            Some(ConfigCommands::Path) => commands::config::execute_path(&ctx),
            Some(ConfigCommands::Init { force }) => commands::config::execute_init(&ctx, *force),
        },
        Commands::Completions { shell } => {
            commands::completions::execute(*shell).map_err(CommandError::from)
        }
    }
}

/// Returns the error code string for JSON output.
fn error_code(e: &CommandError) -> &'static str {
    match e {
        CommandError::Tree(_) => "TREE_ERROR",
        CommandError::Import(_) => "MODEL_ERROR",
        CommandError::Logic(_) => "LOGIC_ERROR",
        CommandError::InvalidInput(_) => "INVALID_INPUT",
        CommandError::Config(_) => "CONFIG_ERROR",
        CommandError::Io(_) => "IO_ERROR",
        CommandError::Json(_) => "JSON_ERROR",
    }
}

/// Returns the exit code for an error.
fn error_exit_code(e: &CommandError) -> ExitCode {
    match e {
        CommandError::Tree(_) | CommandError::Logic(_) | CommandError::InvalidInput(_) => {
            ExitCode::from(1)
        }
        CommandError::Import(_) | CommandError::Json(_) => ExitCode::from(4),
        CommandError::Io(_) => ExitCode::from(3),
        CommandError::Config(_) => ExitCode::from(5),
    }
}
