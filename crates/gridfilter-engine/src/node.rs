//! Filter tree node model.
//!
//! A filter is a tree of [`FilterNode`]s under a root [`GroupNode`]. Group
//! children are reference counted so that history snapshots share every
//! subtree an edit did not touch.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::custom_logic::{self, LogicExpr, LogicResult};
use crate::formula::{self, FormulaExpr, FormulaResult};
use crate::operator::LogicalOperator;
use crate::ports::ParsedNaturalQuery;

/// Identifier of a node, unique within one model.
pub type NodeId = String;

/// Canvas coordinate owned by the UI. Never affects evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Creates a position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Presentation-only node metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Typed value payload of a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FilterValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Boolean(bool),
    Set(Vec<String>),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(text) => write!(f, "\"{text}\""),
            FilterValue::Number(n) => write!(f, "{n}"),
            FilterValue::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            FilterValue::Boolean(b) => write!(f, "{b}"),
            FilterValue::Set(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

/// Operator and value a condition tests its column with.
///
/// The operator is the grid's own name (`equals`, `greaterThan`, ...). It is
/// kept as an open string because grids add operators faster than query
/// backends learn them; generators fall back for names they do not know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionFilter {
    pub operator: String,
    pub value: FilterValue,
}

impl ConditionFilter {
    /// Creates a condition filter.
    pub fn new(operator: impl Into<String>, value: FilterValue) -> Self {
        Self {
            operator: operator.into(),
            value,
        }
    }
}

/// Kind tag of a node, used in errors and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Group,
    Condition,
    Formula,
    Natural,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Group => "group",
            NodeKind::Condition => "condition",
            NodeKind::Formula => "formula",
            NodeKind::Natural => "natural",
        };
        f.write_str(name)
    }
}

/// A node of the filter tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FilterNode {
    Group(GroupNode),
    Condition(ConditionNode),
    Formula(FormulaNode),
    Natural(NaturalNode),
}

impl FilterNode {
    /// Returns the node id.
    pub fn id(&self) -> &str {
        self.as_node_ref().id()
    }

    /// Returns the node kind.
    pub fn kind(&self) -> NodeKind {
        self.as_node_ref().kind()
    }

    /// Borrows the node as a [`NodeRef`].
    pub fn as_node_ref(&self) -> NodeRef<'_> {
        match self {
            FilterNode::Group(g) => NodeRef::Group(g),
            FilterNode::Condition(c) => NodeRef::Condition(c),
            FilterNode::Formula(f) => NodeRef::Formula(f),
            FilterNode::Natural(n) => NodeRef::Natural(n),
        }
    }

    /// Returns the group payload, if this is a group.
    pub fn as_group(&self) -> Option<&GroupNode> {
        match self {
            FilterNode::Group(g) => Some(g),
            _ => None,
        }
    }

    pub(crate) fn as_group_mut(&mut self) -> Option<&mut GroupNode> {
        match self {
            FilterNode::Group(g) => Some(g),
            _ => None,
        }
    }

    pub(crate) fn position_mut(&mut self) -> &mut Position {
        match self {
            FilterNode::Group(g) => &mut g.position,
            FilterNode::Condition(c) => &mut c.position,
            FilterNode::Formula(f) => &mut f.position,
            FilterNode::Natural(n) => &mut n.position,
        }
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut Option<NodeMetadata> {
        match self {
            FilterNode::Group(g) => &mut g.metadata,
            FilterNode::Condition(c) => &mut c.metadata,
            FilterNode::Formula(f) => &mut f.metadata,
            FilterNode::Natural(n) => &mut n.metadata,
        }
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        match self {
            FilterNode::Group(g) => g.id = id,
            FilterNode::Condition(c) => c.id = id,
            FilterNode::Formula(f) => f.id = id,
            FilterNode::Natural(n) => n.id = id,
        }
    }
}

impl From<GroupNode> for FilterNode {
    fn from(node: GroupNode) -> Self {
        FilterNode::Group(node)
    }
}

impl From<ConditionNode> for FilterNode {
    fn from(node: ConditionNode) -> Self {
        FilterNode::Condition(node)
    }
}

impl From<FormulaNode> for FilterNode {
    fn from(node: FormulaNode) -> Self {
        FilterNode::Formula(node)
    }
}

impl From<NaturalNode> for FilterNode {
    fn from(node: NaturalNode) -> Self {
        FilterNode::Natural(node)
    }
}

/// Borrowed view of any node, including the root group.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Group(&'a GroupNode),
    Condition(&'a ConditionNode),
    Formula(&'a FormulaNode),
    Natural(&'a NaturalNode),
}

impl<'a> NodeRef<'a> {
    /// Returns the node id.
    pub fn id(&self) -> &'a str {
        match self {
            NodeRef::Group(g) => &g.id,
            NodeRef::Condition(c) => &c.id,
            NodeRef::Formula(f) => &f.id,
            NodeRef::Natural(n) => &n.id,
        }
    }

    /// Returns the node kind.
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::Group(_) => NodeKind::Group,
            NodeRef::Condition(_) => NodeKind::Condition,
            NodeRef::Formula(_) => NodeKind::Formula,
            NodeRef::Natural(_) => NodeKind::Natural,
        }
    }

    /// Returns the children of a group; leaves have none.
    pub fn children(&self) -> &'a [Arc<FilterNode>] {
        match self {
            NodeRef::Group(g) => &g.children,
            NodeRef::Condition(_) | NodeRef::Formula(_) | NodeRef::Natural(_) => &[],
        }
    }

    /// Returns the presentation metadata.
    pub fn metadata(&self) -> Option<&'a NodeMetadata> {
        match self {
            NodeRef::Group(g) => g.metadata.as_ref(),
            NodeRef::Condition(c) => c.metadata.as_ref(),
            NodeRef::Formula(f) => f.metadata.as_ref(),
            NodeRef::Natural(n) => n.metadata.as_ref(),
        }
    }

    /// Clones the viewed node into an owned [`FilterNode`].
    pub fn to_owned_node(&self) -> FilterNode {
        match self {
            NodeRef::Group(g) => FilterNode::Group((*g).clone()),
            NodeRef::Condition(c) => FilterNode::Condition((*c).clone()),
            NodeRef::Formula(f) => FilterNode::Formula((*f).clone()),
            NodeRef::Natural(n) => FilterNode::Natural((*n).clone()),
        }
    }
}

/// A node combining its children with a logical operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupNode {
    pub id: NodeId,
    #[serde(default)]
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NodeMetadata>,
    pub operator: LogicalOperator,
    /// Applies NOT after the operator's own combination.
    #[serde(default)]
    pub negated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    custom_logic: Option<String>,
    #[serde(skip)]
    compiled_logic: Option<LogicExpr>,
    #[serde(default)]
    pub children: Vec<Arc<FilterNode>>,
}

impl GroupNode {
    /// Creates an empty group.
    pub fn new(id: impl Into<NodeId>, operator: LogicalOperator) -> Self {
        Self {
            id: id.into(),
            position: Position::default(),
            metadata: None,
            operator,
            negated: false,
            custom_logic: None,
            compiled_logic: None,
            children: Vec::new(),
        }
    }

    /// Appends a child, builder style.
    pub fn with_child(mut self, child: impl Into<FilterNode>) -> Self {
        self.children.push(Arc::new(child.into()));
        self
    }

    /// Sets the negation flag, builder style.
    pub fn negated(mut self, negated: bool) -> Self {
        self.negated = negated;
        self
    }

    /// Sets custom logic, builder style.
    ///
    /// # Errors
    ///
    /// Returns the [`custom_logic::LogicError`] if the expression does not
    /// compile against the group's current children.
    pub fn with_custom_logic(mut self, logic: impl Into<String>) -> LogicResult<Self> {
        self.set_custom_logic(Some(logic.into()))?;
        Ok(self)
    }

    /// Returns the raw custom logic text.
    pub fn custom_logic(&self) -> Option<&str> {
        self.custom_logic.as_deref()
    }

    /// Returns the compiled custom logic.
    pub fn compiled_logic(&self) -> Option<&LogicExpr> {
        self.compiled_logic.as_ref()
    }

    /// Replaces the custom logic, compiling it against the current children.
    ///
    /// On error nothing changes.
    pub fn set_custom_logic(&mut self, logic: Option<String>) -> LogicResult<()> {
        match logic {
            Some(text) => {
                let compiled = custom_logic::compile(&text, self.children.len())?;
                self.custom_logic = Some(text);
                self.compiled_logic = Some(compiled);
            }
            None => {
                self.custom_logic = None;
                self.compiled_logic = None;
            }
        }
        Ok(())
    }

    /// Rebuilds the compiled custom logic from the stored text.
    pub(crate) fn recompile_logic(&mut self) -> LogicResult<()> {
        self.compiled_logic = match &self.custom_logic {
            Some(text) => Some(custom_logic::compile(text, self.children.len())?),
            None => None,
        };
        Ok(())
    }
}

fn default_enabled() -> bool {
    true
}

fn default_weight() -> f64 {
    1.0
}

/// A leaf testing one column with one operator and value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionNode {
    pub id: NodeId,
    #[serde(default)]
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NodeMetadata>,
    pub column_id: String,
    /// Disabled conditions stay in the tree but are skipped everywhere else.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub filter: ConditionFilter,
    /// Used only by external scoring.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl ConditionNode {
    /// Creates an enabled condition with weight 1.0.
    pub fn new(id: impl Into<NodeId>, column_id: impl Into<String>, filter: ConditionFilter) -> Self {
        Self {
            id: id.into(),
            position: Position::default(),
            metadata: None,
            column_id: column_id.into(),
            enabled: true,
            filter,
            weight: default_weight(),
        }
    }

    /// Sets the enabled flag, builder style.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// A leaf holding a free-text formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaNode {
    pub id: NodeId,
    #[serde(default)]
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NodeMetadata>,
    formula: String,
    #[serde(skip)]
    compiled: Option<FormulaExpr>,
}

impl FormulaNode {
    /// Creates a formula node and compiles its text.
    ///
    /// A formula that does not compile is still stored; [`FormulaNode::compiled`]
    /// is then `None`.
    pub fn new(id: impl Into<NodeId>, formula: impl Into<String>) -> Self {
        let mut node = Self {
            id: id.into(),
            position: Position::default(),
            metadata: None,
            formula: String::new(),
            compiled: None,
        };
        // The compile error is recoverable through `compile_error`.
        let _ = node.set_formula(formula.into());
        node
    }

    /// Returns the formula text.
    pub fn formula(&self) -> &str {
        &self.formula
    }

    /// Returns the compiled formula, if the text compiles.
    pub fn compiled(&self) -> Option<&FormulaExpr> {
        self.compiled.as_ref()
    }

    /// Replaces the formula text and recompiles.
    ///
    /// The text is kept even when compilation fails, so the user can continue
    /// editing it.
    pub fn set_formula(&mut self, formula: String) -> FormulaResult<()> {
        self.formula = formula;
        self.recompile()
    }

    /// Returns the compilation error for the current text, if any.
    pub fn compile_error(&self) -> Option<formula::FormulaError> {
        formula::compile(&self.formula).err()
    }

    pub(crate) fn recompile(&mut self) -> FormulaResult<()> {
        match formula::compile(&self.formula) {
            Ok(expr) => {
                self.compiled = Some(expr);
                Ok(())
            }
            Err(e) => {
                self.compiled = None;
                Err(e)
            }
        }
    }
}

/// A leaf holding a natural-language query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NaturalNode {
    pub id: NodeId,
    #[serde(default)]
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NodeMetadata>,
    pub query: String,
    /// Filled in by an external interpreter once it answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed: Option<ParsedNaturalQuery>,
    #[serde(default)]
    pub confidence: f64,
}

impl NaturalNode {
    /// Creates an uninterpreted natural-language node.
    pub fn new(id: impl Into<NodeId>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position: Position::default(),
            metadata: None,
            query: query.into(),
            parsed: None,
            confidence: 0.0,
        }
    }

    /// Returns the interpretation as a group, with child ids derived from
    /// this node's id.
    pub fn interpreted_group(&self) -> Option<GroupNode> {
        let parsed = self.parsed.as_ref()?;
        let mut counter = 0usize;
        Some(parsed.to_group(self.id.clone(), || {
            counter += 1;
            format!("{}.{}", self.id, counter)
        }))
    }
}
