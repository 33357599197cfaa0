//! Evaluation of parsed queries against JSON documents.
//!
//! Evaluation follows the service's three-valued logic: a property that is
//! missing, or a comparison between values of different kinds, is
//! *undefined* (`None`), and only documents whose condition is exactly
//! `true` are returned.

use std::cmp::Ordering;

use serde_json::{Number, Value};

use common::{RepoError, RepoResult};
use domain::{Comparison, DataType, IndexingPolicy};

use super::parser::{Expr, Function};
use crate::sql::SqlQuerySpec;

/// Evaluation context: parameters bound to the query.
pub struct Scope<'a> {
    spec: &'a SqlQuerySpec,
}

impl<'a> Scope<'a> {
    pub fn new(spec: &'a SqlQuerySpec) -> Self {
        Self { spec }
    }

    fn parameter(&self, name: &str) -> RepoResult<&'a Value> {
        self.spec
            .parameter(name)
            .ok_or_else(|| RepoError::bad_request(format!("Parameter `{}` is not bound", name)))
    }

    /// Whether `condition` holds for `document`.
    pub fn matches(&self, condition: &Expr, document: &Value) -> RepoResult<bool> {
        Ok(matches!(self.eval(condition, document)?, Some(Value::Bool(true))))
    }

    fn eval(&self, expr: &Expr, document: &Value) -> RepoResult<Option<Value>> {
        let value = match expr {
            Expr::Literal(value) => Some(value.clone()),
            Expr::Parameter(name) => Some(self.parameter(name)?.clone()),
            Expr::Path(segments) => lookup(document, segments).cloned(),
            Expr::Compare(left, op, right) => {
                let left = self.eval(left, document)?;
                let right = self.eval(right, document)?;
                match (left, right) {
                    (Some(l), Some(r)) => compare(&l, *op, &r).map(Value::Bool),
                    _ => None,
                }
            }
            Expr::In(needle, haystack) => match self.eval(needle, document)? {
                Some(needle) => {
                    let mut found = false;
                    for candidate in haystack {
                        if let Some(candidate) = self.eval(candidate, document)? {
                            if compare(&needle, Comparison::Eq, &candidate) == Some(true) {
                                found = true;
                                break;
                            }
                        }
                    }
                    Some(Value::Bool(found))
                }
                None => None,
            },
            Expr::Call(function, args) => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg, document)?);
                }
                call(*function, &values)
            }
            Expr::And(left, right) => {
                let left = truth(self.eval(left, document)?);
                let right = truth(self.eval(right, document)?);
                match (left, right) {
                    (Some(false), _) | (_, Some(false)) => Some(Value::Bool(false)),
                    (Some(true), Some(true)) => Some(Value::Bool(true)),
                    _ => None,
                }
            }
            Expr::Or(left, right) => {
                let left = truth(self.eval(left, document)?);
                let right = truth(self.eval(right, document)?);
                match (left, right) {
                    (Some(true), _) | (_, Some(true)) => Some(Value::Bool(true)),
                    (Some(false), Some(false)) => Some(Value::Bool(false)),
                    _ => None,
                }
            }
            Expr::Not(inner) => truth(self.eval(inner, document)?).map(|b| Value::Bool(!b)),
        };
        Ok(value)
    }

    /// Reject predicates the indexing policy cannot serve, unless scans are allowed.
    pub fn check_indexed(&self, condition: &Expr, policy: &IndexingPolicy) -> RepoResult<()> {
        match condition {
            Expr::And(left, right) | Expr::Or(left, right) => {
                self.check_indexed(left, policy)?;
                self.check_indexed(right, policy)
            }
            Expr::Not(inner) => self.check_indexed(inner, policy),
            Expr::Compare(left, op, right) => match (left.as_ref(), right.as_ref()) {
                (Expr::Path(path), other) | (other, Expr::Path(path)) if !matches!(other, Expr::Path(_)) => {
                    let value = self.constant(other)?;
                    require_index(policy, path, value.as_ref(), op.is_range())
                }
                (Expr::Path(left), Expr::Path(right)) => Err(RepoError::QueryRequiresScan(format!(
                    "comparison between `{}` and `{}` cannot use an index",
                    left.join("."),
                    right.join(".")
                ))),
                _ => Ok(()),
            },
            Expr::In(needle, items) => {
                if let Expr::Path(path) = needle.as_ref() {
                    for item in items {
                        let value = self.constant(item)?;
                        require_index(policy, path, value.as_ref(), false)?;
                    }
                }
                Ok(())
            }
            Expr::Call(Function::StartsWith | Function::Contains, args) => {
                if let [Expr::Path(path), _] = args.as_slice() {
                    require_index(policy, path, Some(&Value::String(String::new())), true)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn constant(&self, expr: &Expr) -> RepoResult<Option<Value>> {
        match expr {
            Expr::Literal(value) => Ok(Some(value.clone())),
            Expr::Parameter(name) => Ok(Some(self.parameter(name)?.clone())),
            _ => Ok(None),
        }
    }
}

fn require_index(
    policy: &IndexingPolicy,
    path: &[String],
    value: Option<&Value>,
    range: bool,
) -> RepoResult<()> {
    let data_type = match value {
        Some(Value::Number(_)) => DataType::Number,
        Some(Value::String(_)) => DataType::String,
        // Booleans, nulls and computed operands are not constrained here.
        _ => return Ok(()),
    };

    let dotted = path.join(".");
    if policy.serves(&dotted, data_type, range) {
        Ok(())
    } else {
        Err(RepoError::QueryRequiresScan(format!(
            "path `{}` has no {} index for {:?} values; enable scan in query or add the index",
            dotted,
            if range { "range" } else { "equality" },
            data_type
        )))
    }
}

fn lookup<'v>(document: &'v Value, segments: &[String]) -> Option<&'v Value> {
    segments
        .iter()
        .try_fold(document, |current, segment| current.get(segment.as_str()))
}

fn truth(value: Option<Value>) -> Option<bool> {
    match value {
        Some(Value::Bool(b)) => Some(b),
        _ => None,
    }
}

fn compare(left: &Value, op: Comparison, right: &Value) -> Option<bool> {
    let ordering = match (left, right) {
        (Value::Number(l), Value::Number(r)) => compare_numbers(l, r),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    };

    match (op, ordering) {
        (Comparison::Eq, Some(ordering)) => Some(ordering == Ordering::Equal),
        (Comparison::Ne, Some(ordering)) => Some(ordering != Ordering::Equal),
        // Arrays and objects compare structurally; mixed kinds are never equal.
        (Comparison::Eq, None) => Some(left == right),
        (Comparison::Ne, None) => Some(left != right),
        (Comparison::Gt, Some(ordering)) => Some(ordering == Ordering::Greater),
        (Comparison::Gte, Some(ordering)) => Some(ordering != Ordering::Less),
        (Comparison::Lt, Some(ordering)) => Some(ordering == Ordering::Less),
        (Comparison::Lte, Some(ordering)) => Some(ordering != Ordering::Greater),
        _ => None,
    }
}

/// Integers compare exactly; a float on either side compares as `f64`.
fn compare_numbers(left: &Number, right: &Number) -> Option<Ordering> {
    match (integer(left), integer(right)) {
        (Some(l), Some(r)) => Some(l.cmp(&r)),
        _ => left.as_f64()?.partial_cmp(&right.as_f64()?),
    }
}

fn integer(number: &Number) -> Option<i128> {
    number
        .as_i64()
        .map(i128::from)
        .or_else(|| number.as_u64().map(i128::from))
}

fn call(function: Function, args: &[Option<Value>]) -> Option<Value> {
    match (function, args) {
        (Function::IsDefined, [value]) => Some(Value::Bool(value.is_some())),
        (Function::StartsWith, [Some(Value::String(s)), Some(Value::String(prefix))]) => {
            Some(Value::Bool(s.starts_with(prefix.as_str())))
        }
        (Function::Contains, [Some(Value::String(s)), Some(Value::String(needle))]) => {
            Some(Value::Bool(s.contains(needle.as_str())))
        }
        _ => None,
    }
}
