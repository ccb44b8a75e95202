//! Document-query generation (`$and` / `$or` style objects).
//!
//! Only the shape of the query is produced; every value is the `"?"`
//! placeholder.

use serde_json::{json, Map, Value};

use super::operators::{ConditionOperator, DocumentForm};
use super::{generate, Dialect, Generated};
use crate::node::{ConditionFilter, GroupNode};
use crate::operator::LogicalOperator;

const PLACEHOLDER: &str = "?";

/// Renders document queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentGenerator;

impl DocumentGenerator {
    /// Generates the query object; an empty filter gives `{"$<op>": []}`.
    pub fn generate(root: &GroupNode) -> Generated<Value> {
        generate(&mut DocumentGenerator, root)
    }
}

fn operator_key(operator: LogicalOperator) -> String {
    format!("${}", operator.as_str().to_ascii_lowercase())
}

fn predicate(form: DocumentForm) -> Value {
    match form {
        DocumentForm::Op(op) => json!({ op: PLACEHOLDER }),
        DocumentForm::Exists(exists) => json!({ "$exists": exists }),
        DocumentForm::Regex => json!({ "$regex": PLACEHOLDER }),
        DocumentForm::NotRegex => json!({ "$not": { "$regex": PLACEHOLDER } }),
        DocumentForm::Range => json!({ "$gte": PLACEHOLDER, "$lte": PLACEHOLDER }),
        DocumentForm::Set(op) => json!({ op: [PLACEHOLDER] }),
    }
}

impl Dialect for DocumentGenerator {
    type Output = Value;

    fn fallback(&self) -> Option<&'static str> {
        Some("$eq")
    }

    fn condition(
        &mut self,
        column_id: &str,
        operator: Option<ConditionOperator>,
        _filter: &ConditionFilter,
    ) -> Value {
        let form = operator.map_or(DocumentForm::Op("$eq"), ConditionOperator::document);
        let mut object = Map::new();
        object.insert(column_id.to_string(), predicate(form));
        Value::Object(object)
    }

    fn combine(&mut self, operator: LogicalOperator, operands: Vec<Value>) -> Value {
        let mut object = Map::new();
        object.insert(operator_key(operator), Value::Array(operands));
        Value::Object(object)
    }

    fn negate(&mut self, inner: Value) -> Value {
        json!({ "$nor": [inner] })
    }

    fn empty(&mut self, root_operator: LogicalOperator) -> Value {
        self.combine(root_operator, Vec::new())
    }
}
