//! Output formatting for the gf CLI.
//!
//! - [`tree`] - model and filter tree output (show)
//! - [`report`] - complexity, generated queries and evaluation results

mod report;
mod tree;

pub use report::{
    format_complexity_json, format_complexity_table, format_eval_json, format_eval_text,
    format_generated_json, format_generated_text,
};
pub use tree::{format_model_json, format_model_tree};
