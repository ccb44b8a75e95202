//! Complexity metrics and performance tier of a filter tree.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::node::{FilterNode, GroupNode};
use crate::operator::LogicalOperator;

/// Policy constants for the performance tiers and optimization hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityThresholds {
    /// Node counts below this are `excellent`.
    pub excellent_below: usize,
    /// Node counts below this are `good`.
    pub good_below: usize,
    /// Node counts below this are `fair`; anything else is `poor`.
    pub fair_below: usize,
    /// Suggest pruning above this node count.
    pub prune_above: usize,
    /// Suggest flattening above this group depth.
    pub flatten_depth_above: usize,
    /// Suggest consolidating above this many distinct operators.
    pub diversity_above: usize,
}

impl Default for ComplexityThresholds {
    fn default() -> Self {
        Self {
            excellent_below: 10,
            good_below: 25,
            fair_below: 50,
            prune_above: 25,
            flatten_depth_above: 5,
            diversity_above: 4,
        }
    }
}

/// Estimated evaluation cost of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceTier {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl PerformanceTier {
    /// Classifies a node count.
    pub fn classify(node_count: usize, thresholds: &ComplexityThresholds) -> Self {
        if node_count < thresholds.excellent_below {
            PerformanceTier::Excellent
        } else if node_count < thresholds.good_below {
            PerformanceTier::Good
        } else if node_count < thresholds.fair_below {
            PerformanceTier::Fair
        } else {
            PerformanceTier::Poor
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PerformanceTier::Excellent => "excellent",
            PerformanceTier::Good => "good",
            PerformanceTier::Fair => "fair",
            PerformanceTier::Poor => "poor",
        }
    }
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metrics of a filter subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterComplexity {
    /// Every node, including the root group.
    pub node_count: usize,
    /// Longest chain of nested groups; 1 for a group without group children.
    pub max_depth: usize,
    /// Distinct operators across all groups.
    pub operator_diversity: usize,
    pub estimated_performance: PerformanceTier,
    pub optimization_suggestions: Vec<String>,
}

#[derive(Default)]
struct Stats<'a> {
    node_count: usize,
    disabled: usize,
    operators: BTreeSet<LogicalOperator>,
    single_child: Vec<&'a str>,
}

impl<'a> Stats<'a> {
    /// Visits a group and returns its group depth.
    fn visit_group(&mut self, group: &'a GroupNode) -> usize {
        self.node_count += 1;
        self.operators.insert(group.operator);
        if group.children.len() == 1
            && matches!(group.operator, LogicalOperator::And | LogicalOperator::Or)
        {
            self.single_child.push(&group.id);
        }

        let mut deepest = 0;
        for child in &group.children {
            match &**child {
                FilterNode::Group(inner) => deepest = deepest.max(self.visit_group(inner)),
                FilterNode::Condition(condition) => {
                    self.node_count += 1;
                    if !condition.enabled {
                        self.disabled += 1;
                    }
                }
                FilterNode::Formula(_) | FilterNode::Natural(_) => self.node_count += 1,
            }
        }
        deepest + 1
    }
}

/// Computes the complexity of the subtree rooted at `root`.
pub fn analyze(root: &GroupNode, thresholds: &ComplexityThresholds) -> FilterComplexity {
    let mut stats = Stats::default();
    let max_depth = stats.visit_group(root);
    let operator_diversity = stats.operators.len();

    let mut suggestions = Vec::new();
    if stats.node_count > thresholds.prune_above {
        suggestions.push(format!(
            "{} nodes: consider pruning redundant conditions",
            stats.node_count
        ));
    }
    if max_depth > thresholds.flatten_depth_above {
        suggestions.push(format!(
            "groups are nested {max_depth} levels deep: consider flattening"
        ));
    }
    if operator_diversity > thresholds.diversity_above {
        suggestions.push(format!(
            "{operator_diversity} different operators: consider consolidating operator use"
        ));
    }
    if stats.disabled > 0 {
        suggestions.push(format!(
            "{} disabled condition(s) are still in the tree: remove them if they are no longer needed",
            stats.disabled
        ));
    }
    for id in &stats.single_child {
        suggestions.push(format!(
            "group '{id}' has a single child: its operator has no effect"
        ));
    }

    FilterComplexity {
        node_count: stats.node_count,
        max_depth,
        operator_diversity,
        estimated_performance: PerformanceTier::classify(stats.node_count, thresholds),
        optimization_suggestions: suggestions,
    }
}
