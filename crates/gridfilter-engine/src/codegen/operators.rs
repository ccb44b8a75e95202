//! Condition operator table shared by the generators and the evaluator.

use std::fmt;

/// How a condition operator is written in a document query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentForm {
    /// `{ col: { "$op": value } }`
    Op(&'static str),
    /// `{ col: { "$exists": bool } }`
    Exists(bool),
    /// `{ col: { "$regex": value } }`
    Regex,
    /// `{ col: { "$not": { "$regex": value } } }`
    NotRegex,
    /// `{ col: { "$gte": low, "$lte": high } }`
    Range,
    /// `{ col: { "$in" | "$nin": [value] } }`
    Set(&'static str),
}

/// The condition operators the engine knows how to translate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    IsEmpty,
    IsNotEmpty,
    Between,
    In,
    NotIn,
    Before,
    After,
}

impl ConditionOperator {
    pub const ALL: [ConditionOperator; 17] = [
        ConditionOperator::Equals,
        ConditionOperator::NotEquals,
        ConditionOperator::GreaterThan,
        ConditionOperator::GreaterThanOrEqual,
        ConditionOperator::LessThan,
        ConditionOperator::LessThanOrEqual,
        ConditionOperator::Contains,
        ConditionOperator::NotContains,
        ConditionOperator::StartsWith,
        ConditionOperator::EndsWith,
        ConditionOperator::IsEmpty,
        ConditionOperator::IsNotEmpty,
        ConditionOperator::Between,
        ConditionOperator::In,
        ConditionOperator::NotIn,
        ConditionOperator::Before,
        ConditionOperator::After,
    ];

    /// The grid's name for the operator.
    pub fn name(self) -> &'static str {
        match self {
            ConditionOperator::Equals => "equals",
            ConditionOperator::NotEquals => "notEquals",
            ConditionOperator::GreaterThan => "greaterThan",
            ConditionOperator::GreaterThanOrEqual => "greaterThanOrEqual",
            ConditionOperator::LessThan => "lessThan",
            ConditionOperator::LessThanOrEqual => "lessThanOrEqual",
            ConditionOperator::Contains => "contains",
            ConditionOperator::NotContains => "notContains",
            ConditionOperator::StartsWith => "startsWith",
            ConditionOperator::EndsWith => "endsWith",
            ConditionOperator::IsEmpty => "isEmpty",
            ConditionOperator::IsNotEmpty => "isNotEmpty",
            ConditionOperator::Between => "between",
            ConditionOperator::In => "in",
            ConditionOperator::NotIn => "notIn",
            ConditionOperator::Before => "before",
            ConditionOperator::After => "after",
        }
    }

    /// SQL predicate following the column name; `?` marks bound values.
    pub fn sql(self) -> &'static str {
        match self {
            ConditionOperator::Equals => "= ?",
            ConditionOperator::NotEquals => "!= ?",
            ConditionOperator::GreaterThan | ConditionOperator::After => "> ?",
            ConditionOperator::GreaterThanOrEqual => ">= ?",
            ConditionOperator::LessThan | ConditionOperator::Before => "< ?",
            ConditionOperator::LessThanOrEqual => "<= ?",
            ConditionOperator::Contains
            | ConditionOperator::StartsWith
            | ConditionOperator::EndsWith => "LIKE ?",
            ConditionOperator::NotContains => "NOT LIKE ?",
            ConditionOperator::IsEmpty => "IS NULL",
            ConditionOperator::IsNotEmpty => "IS NOT NULL",
            ConditionOperator::Between => "BETWEEN ? AND ?",
            ConditionOperator::In => "IN (?)",
            ConditionOperator::NotIn => "NOT IN (?)",
        }
    }

    pub fn document(self) -> DocumentForm {
        match self {
            ConditionOperator::Equals => DocumentForm::Op("$eq"),
            ConditionOperator::NotEquals => DocumentForm::Op("$ne"),
            ConditionOperator::GreaterThan | ConditionOperator::After => DocumentForm::Op("$gt"),
            ConditionOperator::GreaterThanOrEqual => DocumentForm::Op("$gte"),
            ConditionOperator::LessThan | ConditionOperator::Before => DocumentForm::Op("$lt"),
            ConditionOperator::LessThanOrEqual => DocumentForm::Op("$lte"),
            ConditionOperator::Contains
            | ConditionOperator::StartsWith
            | ConditionOperator::EndsWith => DocumentForm::Regex,
            ConditionOperator::NotContains => DocumentForm::NotRegex,
            ConditionOperator::IsEmpty => DocumentForm::Exists(false),
            ConditionOperator::IsNotEmpty => DocumentForm::Exists(true),
            ConditionOperator::Between => DocumentForm::Range,
            ConditionOperator::In => DocumentForm::Set("$in"),
            ConditionOperator::NotIn => DocumentForm::Set("$nin"),
        }
    }

    /// English phrase placed between the column and the value.
    pub fn phrase(self) -> &'static str {
        match self {
            ConditionOperator::Equals => "is",
            ConditionOperator::NotEquals => "is not",
            ConditionOperator::GreaterThan => "is greater than",
            ConditionOperator::GreaterThanOrEqual => "is at least",
            ConditionOperator::LessThan => "is less than",
            ConditionOperator::LessThanOrEqual => "is at most",
            ConditionOperator::Contains => "contains",
            ConditionOperator::NotContains => "does not contain",
            ConditionOperator::StartsWith => "starts with",
            ConditionOperator::EndsWith => "ends with",
            ConditionOperator::IsEmpty => "is empty",
            ConditionOperator::IsNotEmpty => "is not empty",
            ConditionOperator::Between => "is between",
            ConditionOperator::In => "is one of",
            ConditionOperator::NotIn => "is not one of",
            ConditionOperator::Before => "is before",
            ConditionOperator::After => "is after",
        }
    }

    /// Operators that test presence and take no value.
    pub fn is_unary(self) -> bool {
        matches!(self, ConditionOperator::IsEmpty | ConditionOperator::IsNotEmpty)
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Looks up an operator by name, ignoring case.
pub fn lookup(name: &str) -> Option<ConditionOperator> {
    let name = name.trim();
    ConditionOperator::ALL
        .into_iter()
        .find(|op| op.name().eq_ignore_ascii_case(name))
}

/// Suggests the known operator closest to an unknown name.
pub fn suggest(name: &str) -> Option<&'static str> {
    let name = name.trim().to_ascii_lowercase();
    ConditionOperator::ALL
        .into_iter()
        .map(|op| {
            let score = strsim::jaro_winkler(&name, &op.name().to_ascii_lowercase());
            (op.name(), score)
        })
        .filter(|(_, score)| *score >= 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(name, _)| name)
}
