//! The owning mutation layer over one [`MultiFilterModel`].
//!
//! Every edit runs on a working copy of the tree. Only when it succeeds is
//! the previous tree pushed onto the undo history and the model's version,
//! timestamp and metadata cache updated; a rejected edit leaves both the
//! model and the history exactly as they were.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::codegen::{DocumentGenerator, Generated, NaturalLanguageGenerator, SqlGenerator};
use crate::complexity::FilterComplexity;
use crate::config::EngineConfig;
use crate::custom_logic::{self, ValidationResult};
use crate::evaluator::{ConditionResolver, FilterEvaluator};
use crate::history::HistoryManager;
use crate::model::{ImportError, MultiFilterModel};
use crate::node::{
    ConditionFilter, ConditionNode, FilterNode, FormulaNode, GroupNode, NaturalNode, NodeId,
    NodeRef,
};
use crate::operator::LogicalOperator;
use crate::ports::{
    Clock, IdGenerator, ParsedNaturalQuery, Suggestion, SuggestionAction, SystemClock,
    UuidGenerator,
};
use crate::tree::{self, NodePatch, TreeError, TreeResult};

/// Edits one filter model with undo/redo.
///
/// # Example
///
/// ```
/// use gridfilter_engine::{ConditionFilter, FilterEditor, FilterValue};
///
/// let mut editor = FilterEditor::new("customers");
/// let root = editor.root_id().to_string();
/// editor
///     .add_condition(&root, "age", ConditionFilter::new("greaterThan", FilterValue::Number(18.0)))
///     .unwrap();
/// editor
///     .add_condition(&root, "status", ConditionFilter::new("equals", FilterValue::Text("active".into())))
///     .unwrap();
///
/// assert_eq!(editor.generate_sql().output, "age > ? AND status = ?");
/// assert!(editor.undo());
/// assert_eq!(editor.generate_sql().output, "age > ?");
/// ```
#[derive(Debug)]
pub struct FilterEditor<C = SystemClock, G = UuidGenerator> {
    model: MultiFilterModel,
    history: HistoryManager<GroupNode>,
    config: EngineConfig,
    clock: C,
    ids: G,
}

impl FilterEditor {
    /// Creates an editor for a fresh model with default policy, the wall
    /// clock and UUID ids.
    pub fn new(column_id: impl Into<String>) -> Self {
        Self::with_collaborators(column_id, EngineConfig::default(), SystemClock, UuidGenerator)
    }
}

impl<C: Clock, G: IdGenerator> FilterEditor<C, G> {
    /// Creates an editor for a fresh model.
    pub fn with_collaborators(
        column_id: impl Into<String>,
        config: EngineConfig,
        clock: C,
        ids: G,
    ) -> Self {
        let model = MultiFilterModel::new(column_id, clock.now());
        Self::from_model(model, config, clock, ids)
    }

    /// Wraps an existing model. The history starts empty.
    pub fn from_model(model: MultiFilterModel, config: EngineConfig, clock: C, ids: G) -> Self {
        Self {
            model,
            history: HistoryManager::new(config.history),
            config,
            clock,
            ids,
        }
    }

    pub fn model(&self) -> &MultiFilterModel {
        &self.model
    }

    pub fn into_model(self) -> MultiFilterModel {
        self.model
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn root(&self) -> &GroupNode {
        self.model.root_node()
    }

    pub fn root_id(&self) -> &str {
        &self.model.root_node().id
    }

    pub fn find(&self, id: &str) -> Option<NodeRef<'_>> {
        tree::find(self.model.root_node(), id)
    }

    /// Runs `edit` on a copy of the tree and commits it if it succeeds.
    fn commit<R>(
        &mut self,
        action: &'static str,
        edit: impl FnOnce(&mut GroupNode) -> TreeResult<R>,
    ) -> TreeResult<R> {
        let mut working = self.model.root_node().clone();
        let result = match edit(&mut working) {
            Ok(result) => result,
            Err(e) => {
                debug!(action, error = %e, "rejected edit");
                return Err(e);
            }
        };

        let previous = self.model.root_node().clone();
        self.history.save(previous);
        self.model.set_root(working);
        self.model.touch(self.clock.now());
        debug!(action, version = self.model.version(), "committed edit");
        Ok(result)
    }

    // ==================== Structure ====================

    /// Inserts a caller-built node under `parent_id`.
    ///
    /// # Errors
    ///
    /// See [`tree::insert`].
    pub fn insert(
        &mut self,
        parent_id: &str,
        node: impl Into<FilterNode>,
        index: Option<usize>,
    ) -> TreeResult<()> {
        let node = node.into();
        self.commit("insert", |root| tree::insert(root, parent_id, node, index))
    }

    /// Appends a new enabled condition and returns its id.
    pub fn add_condition(
        &mut self,
        parent_id: &str,
        column_id: impl Into<String>,
        filter: ConditionFilter,
    ) -> TreeResult<NodeId> {
        let column_id = column_id.into();
        tree::check_column(&column_id)?;
        let id = self.ids.next_id();
        let node = ConditionNode::new(id.clone(), column_id, filter);
        self.commit("add_condition", |root| {
            tree::insert(root, parent_id, node.into(), None)
        })?;
        Ok(id)
    }

    /// Appends a new empty group and returns its id.
    ///
    /// Operators with a fixed child count cannot start empty; build the group
    /// as `AND`, add its children, then switch the operator.
    pub fn add_group(&mut self, parent_id: &str, operator: LogicalOperator) -> TreeResult<NodeId> {
        let id = self.ids.next_id();
        let node = GroupNode::new(id.clone(), operator);
        self.commit("add_group", |root| tree::insert(root, parent_id, node.into(), None))?;
        Ok(id)
    }

    /// Appends a formula node and returns its id. Text that does not compile
    /// is kept; see [`FormulaNode::compile_error`].
    pub fn add_formula(&mut self, parent_id: &str, formula: impl Into<String>) -> TreeResult<NodeId> {
        let id = self.ids.next_id();
        let node = FormulaNode::new(id.clone(), formula);
        self.commit("add_formula", |root| tree::insert(root, parent_id, node.into(), None))?;
        Ok(id)
    }

    /// Appends an uninterpreted natural-language node and returns its id.
    pub fn add_natural(&mut self, parent_id: &str, query: impl Into<String>) -> TreeResult<NodeId> {
        let id = self.ids.next_id();
        let node = NaturalNode::new(id.clone(), query);
        self.commit("add_natural", |root| tree::insert(root, parent_id, node.into(), None))?;
        Ok(id)
    }

    /// Duplicates a node and its subtree with fresh ids.
    ///
    /// The copy goes right after the original, or at the end of
    /// `target_parent_id` when given. Returns the copy's id.
    pub fn copy_node(&mut self, id: &str, target_parent_id: Option<&str>) -> TreeResult<NodeId> {
        if id == self.root_id() {
            return Err(TreeError::InvalidField {
                field: "id",
                reason: "the root group cannot be copied".to_string(),
            });
        }
        let original = self.find(id).ok_or_else(|| TreeError::not_found(id))?;
        let mut copy = original.to_owned_node();
        reassign_ids(&mut copy, &self.ids);
        let copy_id = copy.id().to_string();

        let (parent_id, index) = match target_parent_id {
            Some(parent_id) => (parent_id.to_string(), None),
            None => {
                let parent = tree::parent_of(self.root(), id).ok_or_else(|| TreeError::not_found(id))?;
                let position = parent.children.iter().position(|child| child.id() == id);
                (parent.id.clone(), position.map(|p| p + 1))
            }
        };

        self.commit("copy_node", |root| tree::insert(root, &parent_id, copy, index))?;
        Ok(copy_id)
    }

    /// Removes a node and its subtree.
    pub fn remove(&mut self, id: &str) -> TreeResult<FilterNode> {
        self.commit("remove", |root| tree::remove(root, id))
    }

    /// Applies a partial update to one node.
    pub fn update(&mut self, id: &str, patch: &NodePatch) -> TreeResult<FilterNode> {
        self.commit("update", |root| tree::update(root, id, patch))
    }

    /// Enables or disables a condition without removing it.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> TreeResult<()> {
        self.commit("set_enabled", |root| {
            tree::update(root, id, &NodePatch::new().enabled(enabled)).map(|_| ())
        })
    }

    /// Moves a node under another group.
    pub fn move_node(&mut self, id: &str, new_parent_id: &str, index: Option<usize>) -> TreeResult<()> {
        self.commit("move_node", |root| tree::move_node(root, id, new_parent_id, index))
    }

    // ==================== External Results ====================

    /// Stores an interpreter's answer on a natural-language node.
    pub fn apply_natural_parse(&mut self, id: &str, parsed: ParsedNaturalQuery) -> TreeResult<()> {
        let patch = NodePatch::new().parsed(parsed);
        self.commit("apply_natural_parse", |root| {
            tree::update(root, id, &patch).map(|_| ())
        })
    }

    /// Replaces an interpreted natural-language node with the group its
    /// interpretation describes. Returns the new group's id.
    pub fn fold_natural(&mut self, id: &str) -> TreeResult<NodeId> {
        let node = self.find(id).ok_or_else(|| TreeError::not_found(id))?;
        let NodeRef::Natural(natural) = node else {
            return Err(TreeError::PatchMismatch {
                id: id.to_string(),
                field: "parsed",
                kind: node.kind(),
            });
        };
        let parsed = natural.parsed.as_ref().ok_or_else(|| TreeError::InvalidField {
            field: "parsed",
            reason: format!("natural-language node '{id}' has not been interpreted"),
        })?;

        let group_id = self.ids.next_id();
        let mut group = parsed.to_group(group_id.clone(), || self.ids.next_id());
        group.metadata = natural.metadata.clone();
        group.position = natural.position;

        self.commit("fold_natural", |root| tree::replace(root, id, group.into()))?;
        Ok(group_id)
    }

    /// Applies a suggestion's action. Returns the id of a node it created.
    pub fn apply_suggestion(&mut self, suggestion: &Suggestion) -> TreeResult<Option<NodeId>> {
        debug!(title = %suggestion.title, "applying suggestion");
        match &suggestion.action {
            SuggestionAction::AddCondition {
                parent_id,
                column_id,
                filter,
            } => self
                .add_condition(parent_id, column_id.clone(), filter.clone())
                .map(Some),
            SuggestionAction::Update { node_id, patch } => self.update(node_id, patch).map(|_| None),
            SuggestionAction::Remove { node_id } => self.remove(node_id).map(|_| None),
        }
    }

    // ==================== History ====================

    /// Restores the tree before the last edit. Returns false if there is
    /// nothing to undo.
    pub fn undo(&mut self) -> bool {
        let current = self.model.root_node().clone();
        let Some(previous) = self.history.undo(current) else {
            return false;
        };
        self.model.set_root(previous);
        self.model.touch(self.clock.now());
        debug!(version = self.model.version(), "undo");
        true
    }

    /// Re-applies the last undone edit. Returns false if there is nothing to
    /// redo.
    pub fn redo(&mut self) -> bool {
        let current = self.model.root_node().clone();
        let Some(next) = self.history.redo(current) else {
            return false;
        };
        self.model.set_root(next);
        self.model.touch(self.clock.now());
        debug!(version = self.model.version(), "redo");
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ==================== Views ====================

    /// Complexity of the current tree, computed at most once per version.
    pub fn complexity(&mut self) -> &FilterComplexity {
        self.model.complexity(&self.config.complexity)
    }

    pub fn generate_sql(&self) -> Generated<String> {
        SqlGenerator::generate(self.model.root_node())
    }

    pub fn generate_document(&self) -> Generated<Value> {
        DocumentGenerator::generate(self.model.root_node())
    }

    pub fn generate_natural(&self) -> Generated<String> {
        NaturalLanguageGenerator::generate(self.model.root_node())
    }

    /// Checks custom logic against a group's current children without
    /// changing anything, for inline feedback while the user types.
    pub fn validate_custom_logic(&self, group_id: &str, logic: &str) -> TreeResult<ValidationResult> {
        match self.find(group_id) {
            Some(NodeRef::Group(group)) => Ok(custom_logic::validate(logic, group.children.len())),
            Some(other) => Err(TreeError::PatchMismatch {
                id: group_id.to_string(),
                field: "customLogic",
                kind: other.kind(),
            }),
            None => Err(TreeError::not_found(group_id)),
        }
    }

    /// Returns whether a row passes the filter.
    pub fn evaluate<R: ConditionResolver + ?Sized>(&self, row: &R) -> bool {
        FilterEvaluator::new(self.model.root_node()).matches(row)
    }

    /// Keeps the rows that pass the filter.
    pub fn filter_rows<'r, R: ConditionResolver>(&self, rows: &'r [R]) -> Vec<&'r R> {
        FilterEvaluator::new(self.model.root_node()).filter_rows(rows)
    }

    // ==================== Persistence ====================

    /// Serialises the model with its complexity metadata filled in.
    pub fn export_state(&mut self) -> serde_json::Result<String> {
        self.model.complexity(&self.config.complexity);
        self.model.export_state()
    }

    /// Replaces the model with an imported snapshot and clears the history.
    pub fn import_state(&mut self, json: &str) -> Result<(), ImportError> {
        self.model = MultiFilterModel::import_state(json)?;
        self.history.clear();
        debug!(version = self.model.version(), "imported state");
        Ok(())
    }
}

/// Gives a node and all its descendants fresh ids.
fn reassign_ids(node: &mut FilterNode, ids: &impl IdGenerator) {
    node.set_id(ids.next_id());
    if let Some(group) = node.as_group_mut() {
        for child in group.children.iter_mut() {
            reassign_ids(Arc::make_mut(child), ids);
        }
    }
}

#[cfg(test)]
mod tests;
