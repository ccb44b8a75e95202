//! Reading and writing model files.
//!
//! A model file is the JSON snapshot produced by `export_state`. Nodes added
//! from the command line get short ids (`n1`, `n2`, ...) so they can be typed
//! back in later commands.

use std::cell::Cell;
use std::fs;
use std::path::Path;

use gridfilter_engine::ports::{IdGenerator, SystemClock};
use gridfilter_engine::tree::flatten;
use gridfilter_engine::{EngineConfig, FilterEditor, GroupNode, MultiFilterModel, NodeId};
use tracing::debug;

use super::{CommandError, Result};

/// The editor type every command works with.
pub type Editor = FilterEditor<SystemClock, ShortIds>;

/// `n1`, `n2`, ... continuing after the highest such id already in a tree.
#[derive(Debug)]
pub struct ShortIds {
    next: Cell<u64>,
}

impl ShortIds {
    /// Starts after every `n<number>` id in `root`.
    pub fn after(root: &GroupNode) -> Self {
        let highest = flatten(root)
            .iter()
            .filter_map(|node| node.id().strip_prefix('n')?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Self {
            next: Cell::new(highest.saturating_add(1)),
        }
    }
}

impl IdGenerator for ShortIds {
    fn next_id(&self) -> NodeId {
        let n = self.next.get();
        self.next.set(n.saturating_add(1));
        format!("n{n}")
    }
}

/// Reads a model file into an editor.
pub fn load(path: &Path, config: EngineConfig) -> Result<Editor> {
    let json = fs::read_to_string(path).map_err(|e| {
        CommandError::InvalidInput(format!("cannot read {}: {}", path.display(), e))
    })?;
    let model = MultiFilterModel::import_state(&json)?;
    debug!(path = %path.display(), version = model.version(), "loaded model");
    let ids = ShortIds::after(model.root_node());
    Ok(FilterEditor::from_model(model, config, SystemClock, ids))
}

/// Writes an editor's model back to its file, complexity metadata included.
pub fn save(path: &Path, editor: &mut Editor) -> Result<()> {
    let json = editor.export_state()?;
    fs::write(path, json)?;
    debug!(path = %path.display(), version = editor.model().version(), "saved model");
    Ok(())
}

/// Creates a model file holding an empty AND root.
pub fn create(path: &Path, column: &str, force: bool, config: EngineConfig) -> Result<Editor> {
    if path.exists() && !force {
        return Err(CommandError::InvalidInput(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    let model = MultiFilterModel::new(column, chrono::Utc::now());
    let ids = ShortIds::after(model.root_node());
    let mut editor = FilterEditor::from_model(model, config, SystemClock, ids);
    save(path, &mut editor)?;
    Ok(editor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfilter_engine::{ConditionFilter, FilterValue, LogicalOperator};
    use tempfile::TempDir;

    #[test]
    fn test_short_ids_continue_after_existing() {
        let root = GroupNode::new("root", LogicalOperator::And)
            .with_child(GroupNode::new("n7", LogicalOperator::Or))
            .with_child(GroupNode::new("custom", LogicalOperator::Or))
            .with_child(GroupNode::new("nx", LogicalOperator::Or));
        let ids = ShortIds::after(&root);
        assert_eq!(ids.next_id(), "n8");
        assert_eq!(ids.next_id(), "n9");
    }

    #[test]
    fn test_create_load_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("filter.json");

        create(&path, "orders", false, EngineConfig::default()).unwrap();
        assert!(create(&path, "orders", false, EngineConfig::default()).is_err());

        let mut editor = load(&path, EngineConfig::default()).unwrap();
        let id = editor
            .add_condition("root", "total", ConditionFilter::new("lessThan", FilterValue::Number(5.0)))
            .unwrap();
        assert_eq!(id, "n1");
        save(&path, &mut editor).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["model"]["metadata"]["complexity"]["nodeCount"], 2);

        let reloaded = load(&path, EngineConfig::default()).unwrap();
        assert_eq!(reloaded.root(), editor.root());
        assert_eq!(reloaded.model().version(), editor.model().version());
        assert_eq!(reloaded.model().column_id(), "orders");
    }

    #[test]
    fn test_short_ids_saturate_at_the_largest_id() {
        let root = GroupNode::new("root", LogicalOperator::And)
            .with_child(GroupNode::new(format!("n{}", u64::MAX), LogicalOperator::Or));
        let ids = ShortIds::after(&root);
        assert_eq!(ids.next_id(), format!("n{}", u64::MAX));
        assert_eq!(ids.next_id(), format!("n{}", u64::MAX));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("absent.json"), EngineConfig::default()).unwrap_err();
        assert!(matches!(err, CommandError::InvalidInput(_)));
    }
}
