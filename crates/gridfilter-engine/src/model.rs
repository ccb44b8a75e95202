//! The root aggregate of one column's filter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::complexity::{self, ComplexityThresholds, FilterComplexity, PerformanceTier};
use crate::node::{GroupNode, NodeId};
use crate::operator::LogicalOperator;
use crate::tree::{self, TreeError, TreeResult};

/// Snapshot format written by [`MultiFilterModel::export_state`].
pub const FORMAT_VERSION: u32 = 1;

/// Errors from [`MultiFilterModel::import_state`].
#[derive(Debug, Error)]
pub enum ImportError {
    /// The snapshot is not valid JSON or does not have the model's shape.
    #[error("invalid snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// The snapshot was written by a newer format.
    #[error("snapshot format {found} is newer than the supported format {supported}")]
    UnsupportedFormat { found: u32, supported: u32 },

    /// The snapshot parses but its tree breaks an invariant.
    #[error("invalid filter tree: {0}")]
    Tree(#[from] TreeError),
}

/// Denormalised complexity figures for consumers that do not recompute them.
///
/// Empty while stale; every change to the tree clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<FilterComplexity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceTier>,
}

/// A filter tree plus its bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiFilterModel {
    root_node: GroupNode,
    column_id: String,
    version: u64,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
    #[serde(default)]
    metadata: ModelMetadata,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportedState<'a> {
    format_version: u32,
    model: &'a MultiFilterModel,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportedState {
    format_version: u32,
    model: serde_json::Value,
}

impl MultiFilterModel {
    /// Id of the root group of a fresh model.
    pub const DEFAULT_ROOT_ID: &'static str = "root";

    /// Creates a model with an empty AND root.
    pub fn new(column_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            root_node: GroupNode::new(Self::DEFAULT_ROOT_ID, LogicalOperator::And),
            column_id: column_id.into(),
            version: 0,
            created_at: now,
            modified_at: now,
            metadata: ModelMetadata::default(),
        }
    }

    /// Creates a model around an existing tree.
    ///
    /// # Errors
    ///
    /// Returns the first invariant the tree breaks.
    pub fn with_root(
        column_id: impl Into<String>,
        mut root: GroupNode,
        now: DateTime<Utc>,
    ) -> TreeResult<Self> {
        tree::prepare_root(&mut root)?;
        let mut model = Self::new(column_id, now);
        model.root_node = root;
        Ok(model)
    }

    pub fn root_node(&self) -> &GroupNode {
        &self.root_node
    }

    pub fn root_id(&self) -> &NodeId {
        &self.root_node.id
    }

    pub fn column_id(&self) -> &str {
        &self.column_id
    }

    /// Bumped by every committed change, undo and redo included.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    /// Cached figures; empty when stale.
    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn is_metadata_stale(&self) -> bool {
        self.metadata.complexity.is_none()
    }

    pub(crate) fn set_root(&mut self, root: GroupNode) {
        self.root_node = root;
    }

    /// Records a change: bumps the version, stamps the time and marks the
    /// cached metadata stale.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.modified_at = now;
        self.metadata = ModelMetadata::default();
    }

    /// Returns the complexity, computing it only if the cache is stale.
    pub fn complexity(&mut self, thresholds: &ComplexityThresholds) -> &FilterComplexity {
        if self.metadata.complexity.is_none() {
            self.refresh_metadata(thresholds);
        }
        let root = &self.root_node;
        self.metadata
            .complexity
            .get_or_insert_with(|| complexity::analyze(root, thresholds))
    }

    /// Recomputes the cached metadata unconditionally.
    pub fn refresh_metadata(&mut self, thresholds: &ComplexityThresholds) {
        let report = complexity::analyze(&self.root_node, thresholds);
        self.metadata = ModelMetadata {
            performance: Some(report.estimated_performance),
            complexity: Some(report),
        };
    }

    /// Serialises the model as a versioned JSON snapshot.
    pub fn export_state(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&ExportedState {
            format_version: FORMAT_VERSION,
            model: self,
        })
    }

    /// Restores a model from [`MultiFilterModel::export_state`] output.
    ///
    /// The tree is validated and its compiled caches rebuilt; cached metadata
    /// from the snapshot is discarded.
    ///
    /// # Errors
    ///
    /// - `ImportError::Json` for malformed JSON or a wrong shape.
    /// - `ImportError::UnsupportedFormat` for snapshots from a newer format.
    /// - `ImportError::Tree` when the tree breaks an invariant.
    pub fn import_state(json: &str) -> Result<Self, ImportError> {
        let state: ImportedState = serde_json::from_str(json)?;
        if state.format_version > FORMAT_VERSION {
            return Err(ImportError::UnsupportedFormat {
                found: state.format_version,
                supported: FORMAT_VERSION,
            });
        }

        let mut model: MultiFilterModel = serde_json::from_value(state.model)?;
        tree::prepare_root(&mut model.root_node)?;
        model.metadata = ModelMetadata::default();
        Ok(model)
    }
}
