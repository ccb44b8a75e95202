//! Multi-operator filter expressions for data grids.
//!
//! A column's filter is a tree: groups combine their children with a logical
//! operator (AND, OR, XOR, IF_THEN, a free-form `CUSTOM` expression, ...), and
//! leaves are single-column conditions, formulas or natural-language queries.
//! This crate edits such trees with validation and undo/redo, analyses their
//! complexity, evaluates them against rows and translates them into SQL, a
//! document-store query or an English sentence.
//!
//! Most callers only need [`FilterEditor`]:
//!
//! ```
//! use gridfilter_engine::{ConditionFilter, FilterEditor, FilterValue, LogicalOperator, NodePatch};
//!
//! let mut editor = FilterEditor::new("orders");
//! let root = editor.root_id().to_string();
//! editor.add_condition(&root, "total", ConditionFilter::new("greaterThan", FilterValue::Number(100.0)))?;
//! editor.add_condition(&root, "status", ConditionFilter::new("equals", FilterValue::Text("open".into())))?;
//!
//! editor.update(&root, &NodePatch::new().operator(LogicalOperator::Custom).custom_logic("A OR NOT B"))?;
//! assert_eq!(editor.generate_sql().output, "total > ? OR NOT status = ?");
//! # Ok::<(), gridfilter_engine::TreeError>(())
//! ```

pub mod codegen;
pub mod complexity;
pub mod config;
pub mod custom_logic;
pub mod editor;
pub mod evaluator;
pub mod formula;
pub mod history;
pub mod model;
pub mod node;
pub mod operator;
pub mod ports;
pub mod tree;

pub use codegen::{
    DocumentGenerator, Generated, GenerationWarning, NaturalLanguageGenerator, SqlGenerator,
};
pub use complexity::{ComplexityThresholds, FilterComplexity, PerformanceTier};
pub use config::{EngineConfig, HistoryConfig};
pub use custom_logic::{LogicError, ValidationResult};
pub use editor::FilterEditor;
pub use evaluator::{ConditionResolver, FilterEvaluator, JsonRow};
pub use model::{ImportError, ModelMetadata, MultiFilterModel};
pub use node::{
    ConditionFilter, ConditionNode, FilterNode, FilterValue, FormulaNode, GroupNode, NaturalNode,
    NodeId, NodeKind, NodeRef,
};
pub use operator::LogicalOperator;
pub use tree::{FlatNode, NodePatch, TreeError, TreeResult};
