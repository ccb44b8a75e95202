//! Filter tree output formatting.

use gridfilter_engine::{GroupNode, MultiFilterModel, NodeRef};
use owo_colors::OwoColorize;
use serde::Serialize;

/// JSON output structure for `gf show`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowOutput<'a> {
    pub column_id: &'a str,
    pub version: u64,
    pub root_node: &'a GroupNode,
}

/// Formats the model as JSON.
pub fn format_model_json(model: &MultiFilterModel) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&ShowOutput {
        column_id: model.column_id(),
        version: model.version(),
        root_node: model.root_node(),
    })
}

/// Formats the model as an indented tree.
pub fn format_model_tree(model: &MultiFilterModel, use_colors: bool) -> String {
    let header = format!(
        "Filter on '{}' (version {})",
        model.column_id(),
        model.version()
    );
    let mut output = if use_colors {
        format!("{}\n", header.bold())
    } else {
        format!("{header}\n")
    };
    write_node(&mut output, NodeRef::Group(model.root_node()), "", use_colors);
    output
}

fn write_node(output: &mut String, node: NodeRef<'_>, indent: &str, use_colors: bool) {
    let id = if use_colors {
        format!("[{}]", node.id()).dimmed().to_string()
    } else {
        format!("[{}]", node.id())
    };
    let label = node
        .metadata()
        .and_then(|m| m.label.as_deref())
        .map(|label| format!("  \"{label}\""))
        .unwrap_or_default();

    output.push_str(&format!("{indent}{id} {}{label}\n", describe(node, use_colors)));

    let child_indent = format!("{indent}  ");
    for child in node.children() {
        write_node(output, child.as_node_ref(), &child_indent, use_colors);
    }
}

fn describe(node: NodeRef<'_>, use_colors: bool) -> String {
    let paint = |text: String, flag: bool| -> String {
        if use_colors && flag {
            text.yellow().to_string()
        } else {
            text
        }
    };

    match node {
        NodeRef::Group(group) => {
            let mut text = group.operator.to_string();
            if use_colors {
                text = text.cyan().bold().to_string();
            }
            if let Some(logic) = group.custom_logic() {
                text.push_str(&format!(" \"{logic}\""));
            }
            if group.negated {
                text = format!("NOT {text}");
            }
            if group.children.is_empty() {
                text.push_str(&paint(" (empty)".to_string(), true));
            }
            text
        }
        NodeRef::Condition(condition) => {
            let mut text = format!(
                "{} {} {}",
                condition.column_id, condition.filter.operator, condition.filter.value
            );
            if !condition.enabled {
                text = paint(format!("{text} (disabled)"), true);
            }
            text
        }
        NodeRef::Formula(formula) => {
            let mut text = format!("formula: {}", formula.formula());
            if formula.compiled().is_none() {
                text = paint(format!("{text} (does not compile)"), true);
            }
            text
        }
        NodeRef::Natural(natural) => match &natural.parsed {
            Some(parsed) => format!(
                "natural: \"{}\" -> {} ({:.0}%)",
                natural.query,
                parsed.interpretation,
                natural.confidence * 100.0
            ),
            None => paint(format!("natural: \"{}\" (uninterpreted)", natural.query), true),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gridfilter_engine::{
        ConditionFilter, ConditionNode, FilterValue, FormulaNode, LogicalOperator,
    };

    fn model() -> MultiFilterModel {
        let root = GroupNode::new("root", LogicalOperator::Or)
            .with_child(ConditionNode::new(
                "n1",
                "age",
                ConditionFilter::new("greaterThan", FilterValue::Number(18.0)),
            ))
            .with_child(
                GroupNode::new("n2", LogicalOperator::And)
                    .negated(true)
                    .with_child(
                        ConditionNode::new(
                            "n3",
                            "status",
                            ConditionFilter::new("equals", FilterValue::Text("active".into())),
                        )
                        .enabled(false),
                    )
                    .with_child(FormulaNode::new("n4", "score >")),
            );
        MultiFilterModel::with_root("customers", root, Utc::now()).unwrap()
    }

    #[test]
    fn test_tree_without_colors() {
        let text = format_model_tree(&model(), false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Filter on 'customers' (version 0)");
        assert_eq!(lines[1], "[root] OR");
        assert_eq!(lines[2], "  [n1] age greaterThan 18");
        assert_eq!(lines[3], "  [n2] NOT AND");
        assert_eq!(lines[4], "    [n3] status equals \"active\" (disabled)");
        assert_eq!(lines[5], "    [n4] formula: score > (does not compile)");
    }

    #[test]
    fn test_model_json_shape() {
        let json: serde_json::Value =
            serde_json::from_str(&format_model_json(&model()).unwrap()).unwrap();
        assert_eq!(json["columnId"], "customers");
        assert_eq!(json["rootNode"]["children"].as_array().unwrap().len(), 2);
    }
}
