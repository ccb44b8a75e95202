//! Complexity, generation and evaluation output formatting.

use gridfilter_engine::{FilterComplexity, Generated, GenerationWarning, PerformanceTier};
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;

fn tier_label(tier: PerformanceTier, use_colors: bool) -> String {
    let label = tier.as_str();
    if !use_colors {
        return label.to_string();
    }
    match tier {
        PerformanceTier::Excellent => label.green().to_string(),
        PerformanceTier::Good => label.blue().to_string(),
        PerformanceTier::Fair => label.yellow().to_string(),
        PerformanceTier::Poor => label.red().to_string(),
    }
}

/// Formats a complexity report as JSON.
pub fn format_complexity_json(report: &FilterComplexity) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Formats a complexity report as text.
pub fn format_complexity_table(report: &FilterComplexity, use_colors: bool) -> String {
    let mut output = String::new();
    output.push_str(&format!("Nodes:        {}\n", report.node_count));
    output.push_str(&format!("Max depth:    {}\n", report.max_depth));
    output.push_str(&format!("Operators:    {}\n", report.operator_diversity));
    output.push_str(&format!(
        "Performance:  {}\n",
        tier_label(report.estimated_performance, use_colors)
    ));

    if !report.optimization_suggestions.is_empty() {
        output.push_str("\nSuggestions:\n");
        for suggestion in &report.optimization_suggestions {
            output.push_str(&format!("  - {suggestion}\n"));
        }
    }
    output
}

/// JSON output structure for `gf generate`.
#[derive(Serialize)]
pub struct GeneratedOutput<'a, T: Serialize> {
    pub target: &'a str,
    pub faithful: bool,
    pub output: &'a T,
    pub warnings: &'a [GenerationWarning],
}

/// Formats generator output as JSON.
pub fn format_generated_json<T: Serialize>(
    target: &str,
    generated: &Generated<T>,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&GeneratedOutput {
        target,
        faithful: generated.is_faithful(),
        output: &generated.output,
        warnings: &generated.warnings,
    })
}

/// Formats generator output as text; fallbacks get a `WARN` badge.
pub fn format_generated_text(text: &str, warnings: &[GenerationWarning], use_colors: bool) -> String {
    let body = if text.is_empty() {
        "(no conditions)".to_string()
    } else {
        text.to_string()
    };
    if warnings.is_empty() {
        return format!("{body}\n");
    }

    let badge = if use_colors {
        " WARN ".black().on_yellow().to_string()
    } else {
        "[WARN]".to_string()
    };
    let mut output = format!("{badge} {body}\n");
    for warning in warnings {
        output.push_str(&format!("  - {warning}\n"));
    }
    output
}

/// Formats an evaluation as JSON: counts plus the matching rows.
pub fn format_eval_json(matched: &[&Value], total: usize) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "matched": matched.len(),
        "total": total,
        "rows": matched,
    }))
}

/// Formats an evaluation as text, one matching row per line.
pub fn format_eval_text(matched: &[&Value], total: usize) -> String {
    let mut output = format!("{} of {} rows match\n", matched.len(), total);
    for row in matched {
        output.push_str(&format!("  {row}\n"));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> FilterComplexity {
        FilterComplexity {
            node_count: 12,
            max_depth: 3,
            operator_diversity: 2,
            estimated_performance: PerformanceTier::Good,
            optimization_suggestions: vec!["group 'g' has a single child".to_string()],
        }
    }

    #[test]
    fn test_complexity_table() {
        let text = format_complexity_table(&report(), false);
        assert!(text.contains("Nodes:        12"));
        assert!(text.contains("Performance:  good"));
        assert!(text.contains("  - group 'g' has a single child"));
    }

    #[test]
    fn test_faithful_output_has_no_badge() {
        assert_eq!(format_generated_text("a = ?", &[], false), "a = ?\n");
        assert_eq!(format_generated_text("", &[], false), "(no conditions)\n");
    }

    #[test]
    fn test_fallback_output_is_badged() {
        let warnings = vec![GenerationWarning::UncompiledFormula {
            node_id: "f1".to_string(),
        }];
        let text = format_generated_text("a = ?", &warnings, false);
        assert!(text.starts_with("[WARN] a = ?\n"));
        assert!(text.contains("f1"));
    }

    #[test]
    fn test_eval_text() {
        let rows = [serde_json::json!({ "age": 30 })];
        let matched: Vec<&Value> = rows.iter().collect();
        assert_eq!(
            format_eval_text(&matched, 4),
            "1 of 4 rows match\n  {\"age\":30}\n"
        );
    }
}
