//! Read-only commands: show, complexity, generate, logic, eval.

use std::fs;
use std::path::Path;

use gridfilter_engine::custom_logic::{self, index_letter};
use gridfilter_engine::JsonRow;
use owo_colors::OwoColorize;
use serde_json::Value;

use super::model_file;
use super::{CommandContext, CommandError, Result};
use crate::cli::Target;
use crate::output;

/// Executes `gf show`.
pub fn execute_show(ctx: &CommandContext, file: &Path) -> Result<()> {
    let editor = model_file::load(file, ctx.engine)?;
    if ctx.json_output {
        println!("{}", output::format_model_json(editor.model())?);
    } else {
        ctx.print(output::format_model_tree(editor.model(), ctx.use_colors).trim_end());
    }
    Ok(())
}

/// Executes `gf complexity`.
pub fn execute_complexity(ctx: &CommandContext, file: &Path) -> Result<()> {
    let mut editor = model_file::load(file, ctx.engine)?;
    let report = editor.complexity();
    if ctx.json_output {
        println!("{}", output::format_complexity_json(report)?);
    } else {
        ctx.print(output::format_complexity_table(report, ctx.use_colors).trim_end());
    }
    Ok(())
}

/// Executes `gf generate`.
pub fn execute_generate(ctx: &CommandContext, file: &Path, target: Target) -> Result<()> {
    let editor = model_file::load(file, ctx.engine)?;

    let (name, json, text, warnings) = match target {
        Target::Sql => {
            let generated = editor.generate_sql();
            let json = output::format_generated_json("sql", &generated)?;
            ("sql", json, generated.output, generated.warnings)
        }
        Target::Document => {
            let generated = editor.generate_document();
            let json = output::format_generated_json("document", &generated)?;
            let text = serde_json::to_string_pretty(&generated.output)?;
            ("document", json, text, generated.warnings)
        }
        Target::Natural => {
            let generated = editor.generate_natural();
            let json = output::format_generated_json("natural", &generated)?;
            ("natural", json, generated.output, generated.warnings)
        }
    };
    tracing::debug!(target = name, warnings = warnings.len(), "generated query");

    if ctx.json_output {
        println!("{json}");
    } else {
        ctx.print(output::format_generated_text(&text, &warnings, ctx.use_colors).trim_end());
    }
    Ok(())
}

/// Executes `gf logic`. An invalid expression is reported as an error.
pub fn execute_logic(ctx: &CommandContext, expression: &str, children: usize) -> Result<()> {
    let expr = custom_logic::compile(expression, children)?;
    let references: Vec<String> = expr
        .references()
        .into_iter()
        .filter_map(index_letter)
        .map(String::from)
        .collect();

    if ctx.json_output {
        let output = serde_json::json!({
            "valid": true,
            "expression": expr.to_string(),
            "references": references,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let status = if ctx.use_colors {
            "valid".green().to_string()
        } else {
            "valid".to_string()
        };
        ctx.print(format!("{status}: {expr}"));
        if ctx.verbose {
            ctx.print(format!("references: {}", references.join(", ")));
        }
    }
    Ok(())
}

/// Executes `gf eval`.
pub fn execute_eval(ctx: &CommandContext, file: &Path, rows_file: &Path) -> Result<()> {
    let editor = model_file::load(file, ctx.engine)?;

    let content = fs::read_to_string(rows_file).map_err(|e| {
        CommandError::InvalidInput(format!("cannot read {}: {}", rows_file.display(), e))
    })?;
    let Value::Array(values) = serde_json::from_str::<Value>(&content)? else {
        return Err(CommandError::InvalidInput(format!(
            "{} must hold a JSON array of row objects",
            rows_file.display()
        )));
    };

    let rows: Vec<JsonRow<'_>> = values.iter().map(JsonRow).collect();
    let matched: Vec<&Value> = editor.filter_rows(&rows).into_iter().map(|row| row.0).collect();

    if ctx.json_output {
        println!("{}", output::format_eval_json(&matched, values.len())?);
    } else {
        ctx.print(output::format_eval_text(&matched, values.len()).trim_end());
    }
    Ok(())
}
