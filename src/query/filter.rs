//! Predicate filtering for queries
//!
//! Predicates are evaluated in memory against decoded JSON documents.
//! No type coercion: numbers compare with numbers, strings with strings.

use serde_json::{Map, Value};

use crate::error::{PrefDbError, Result};

/// A predicate over one JSON document
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document
    All,

    /// Field equals value (or, for array fields, contains it)
    Eq(String, Value),
    /// Negation of `Eq`; missing fields match
    Ne(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),

    /// Field equals any of the values
    In(String, Vec<Value>),
    /// Field equals none of the values; missing fields match
    Nin(String, Vec<Value>),

    /// Field presence
    Exists(String, bool),

    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(path.into(), value.into())
    }

    pub fn ne(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Ne(path.into(), value.into())
    }

    pub fn gt(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gt(path.into(), value.into())
    }

    pub fn gte(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gte(path.into(), value.into())
    }

    pub fn lt(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Lt(path.into(), value.into())
    }

    pub fn lte(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Lte(path.into(), value.into())
    }

    pub fn is_in(path: impl Into<String>, values: Vec<Value>) -> Self {
        Filter::In(path.into(), values)
    }

    pub fn not_in(path: impl Into<String>, values: Vec<Value>) -> Self {
        Filter::Nin(path.into(), values)
    }

    pub fn exists(path: impl Into<String>, present: bool) -> Self {
        Filter::Exists(path.into(), present)
    }

    /// Conjunction of `self` and `other`
    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::All => other,
            Filter::And(mut clauses) => {
                clauses.push(other);
                Filter::And(clauses)
            }
            first => Filter::And(vec![first, other]),
        }
    }

    /// Disjunction of `self` and `other`
    pub fn or(self, other: Filter) -> Self {
        match self {
            Filter::Or(mut clauses) => {
                clauses.push(other);
                Filter::Or(clauses)
            }
            first => Filter::Or(vec![first, other]),
        }
    }

    /// Checks if a document matches this predicate
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(path, expected) => {
                resolve_path(document, path).is_some_and(|actual| eq_match(actual, expected))
            }
            Filter::Ne(path, expected) => {
                !resolve_path(document, path).is_some_and(|actual| eq_match(actual, expected))
            }
            Filter::Gt(path, bound) => range_match(document, path, bound, |o| o.is_gt()),
            Filter::Gte(path, bound) => range_match(document, path, bound, |o| o.is_ge()),
            Filter::Lt(path, bound) => range_match(document, path, bound, |o| o.is_lt()),
            Filter::Lte(path, bound) => range_match(document, path, bound, |o| o.is_le()),
            Filter::In(path, candidates) => resolve_path(document, path)
                .is_some_and(|actual| candidates.iter().any(|c| eq_match(actual, c))),
            Filter::Nin(path, candidates) => !resolve_path(document, path)
                .is_some_and(|actual| candidates.iter().any(|c| eq_match(actual, c))),
            Filter::Exists(path, present) => resolve_path(document, path).is_some() == *present,
            Filter::And(clauses) => clauses.iter().all(|c| c.matches(document)),
            Filter::Or(clauses) => clauses.iter().any(|c| c.matches(document)),
            Filter::Not(inner) => !inner.matches(document),
        }
    }

    // =========================================================================
    // Query Document Parsing
    // =========================================================================

    /// Parse a query document
    ///
    /// ```text
    /// {}                                    → All
    /// {"name": "Test"}                      → Eq
    /// {"age": {"$gte": 18, "$lt": 65}}      → And[Gte, Lt]
    /// {"$or": [{"a": 1}, {"b": 2}]}         → Or
    /// {"tags": {"$not": {"$in": ["x"]}}}    → Not(In)
    /// ```
    pub fn from_query(query: &Value) -> Result<Filter> {
        match query {
            Value::Null => Ok(Filter::All),
            Value::Object(fields) => Self::parse_object(fields),
            other => Err(PrefDbError::InvalidQuery(format!(
                "query must be an object, got {}",
                other
            ))),
        }
    }

    fn parse_object(fields: &Map<String, Value>) -> Result<Filter> {
        let mut clauses = Vec::with_capacity(fields.len());

        for (key, value) in fields {
            let clause = match key.as_str() {
                "$and" => Filter::And(Self::parse_list(key, value)?),
                "$or" => Filter::Or(Self::parse_list(key, value)?),
                "$nor" => Filter::Not(Box::new(Filter::Or(Self::parse_list(key, value)?))),
                "$not" => Filter::Not(Box::new(Self::from_query(value)?)),
                op if op.starts_with('$') => {
                    return Err(PrefDbError::InvalidQuery(format!(
                        "unknown top-level operator {}",
                        op
                    )))
                }
                path => Self::parse_field(path, value)?,
            };
            clauses.push(clause);
        }

        Ok(Self::conjunction(clauses))
    }

    fn parse_list(op: &str, value: &Value) -> Result<Vec<Filter>> {
        match value {
            Value::Array(items) => items.iter().map(Self::from_query).collect(),
            _ => Err(PrefDbError::InvalidQuery(format!("{} expects an array", op))),
        }
    }

    fn parse_field(path: &str, value: &Value) -> Result<Filter> {
        let operators = match value {
            Value::Object(map) if !map.is_empty() && map.keys().all(|k| k.starts_with('$')) => map,
            literal => return Ok(Filter::Eq(path.to_string(), literal.clone())),
        };

        let mut clauses = Vec::with_capacity(operators.len());
        for (op, operand) in operators {
            let field = path.to_string();
            let clause = match op.as_str() {
                "$eq" => Filter::Eq(field, operand.clone()),
                "$ne" => Filter::Ne(field, operand.clone()),
                "$gt" => Filter::Gt(field, operand.clone()),
                "$gte" => Filter::Gte(field, operand.clone()),
                "$lt" => Filter::Lt(field, operand.clone()),
                "$lte" => Filter::Lte(field, operand.clone()),
                "$in" => Filter::In(field, Self::operand_list(op, operand)?),
                "$nin" => Filter::Nin(field, Self::operand_list(op, operand)?),
                "$exists" => match operand {
                    Value::Bool(present) => Filter::Exists(field, *present),
                    _ => {
                        return Err(PrefDbError::InvalidQuery(
                            "$exists expects a boolean".to_string(),
                        ))
                    }
                },
                "$not" => Filter::Not(Box::new(Self::parse_field(path, operand)?)),
                unknown => {
                    return Err(PrefDbError::InvalidQuery(format!(
                        "unknown operator {} on {}",
                        unknown, path
                    )))
                }
            };
            clauses.push(clause);
        }

        Ok(Self::conjunction(clauses))
    }

    fn operand_list(op: &str, operand: &Value) -> Result<Vec<Value>> {
        match operand {
            Value::Array(items) => Ok(items.clone()),
            _ => Err(PrefDbError::InvalidQuery(format!("{} expects an array", op))),
        }
    }

    fn conjunction(mut clauses: Vec<Filter>) -> Filter {
        match clauses.len() {
            0 => Filter::All,
            1 => clauses.remove(0),
            _ => Filter::And(clauses),
        }
    }
}

/// Resolve a dotted path (`position.x`, `tags.0`) inside a document
///
/// An empty path resolves to the document itself.
pub fn resolve_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(document);
    }

    path.split('.').try_fold(document, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Equality with numeric normalization; array fields match on any element
fn eq_match(actual: &Value, expected: &Value) -> bool {
    if values_equal(actual, expected) {
        return true;
    }
    match actual {
        Value::Array(items) if !expected.is_array() => {
            items.iter().any(|item| values_equal(item, expected))
        }
        _ => false,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(xf), Some(yf)) => xf == yf,
            _ => x == y,
        },
        _ => a == b,
    }
}

fn range_match<F>(document: &Value, path: &str, bound: &Value, accept: F) -> bool
where
    F: Fn(std::cmp::Ordering) -> bool,
{
    let actual = match resolve_path(document, path) {
        Some(v) => v,
        None => return false,
    };

    let ordering = match (actual, bound) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(af), Some(bf)) => af.partial_cmp(&bf),
            _ => None,
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    };

    ordering.is_some_and(accept)
}
