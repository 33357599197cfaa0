//! Fluent filter expressions over document properties.
//!
//! Filters are plain data. The repository translates them into the query
//! language of the remote service, so callers never write query text for the
//! common cases:
//!
//! ```ignore
//! use domain::filter::field;
//!
//! let big_acme_orders = field("customer").eq("acme").and(field("total").gte(100));
//! ```

use std::ops::Not;

use serde_json::Value;

/// Creates a fluent filter builder for a document property.
///
/// Nested properties are addressed with dots (`"address.city"`).
pub fn field(path: &str) -> FieldFilter {
    FieldFilter {
        path: path.to_string(),
    }
}

/// Comparison operators supported in property filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    /// Query-language spelling of the operator
    pub fn operator(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "!=",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
        }
    }

    /// Whether the operator needs an ordered (range) index
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            Comparison::Gt | Comparison::Gte | Comparison::Lt | Comparison::Lte
        )
    }
}

/// A boolean predicate over documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document
    All,
    /// `path <op> value`
    Compare {
        path: String,
        op: Comparison,
        value: Value,
    },
    /// `path IN (values...)`
    In { path: String, values: Vec<Value> },
    /// String property starts with a prefix
    StartsWith { path: String, prefix: String },
    /// String property contains a substring
    Contains { path: String, needle: String },
    /// Property is present on the document
    IsDefined { path: String },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    /// A filter matching every document.
    pub fn all() -> Filter {
        Filter::All
    }

    /// Conjunction of two filters. `All` operands are absorbed.
    pub fn and(self, other: Filter) -> Filter {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), f) => {
                left.push(f);
                Filter::And(left)
            }
            (f, Filter::And(mut right)) => {
                right.insert(0, f);
                Filter::And(right)
            }
            (left, right) => Filter::And(vec![left, right]),
        }
    }

    /// Disjunction of two filters. An `All` operand makes the result `All`.
    pub fn or(self, other: Filter) -> Filter {
        match (self, other) {
            (Filter::All, _) | (_, Filter::All) => Filter::All,
            (Filter::Or(mut left), Filter::Or(right)) => {
                left.extend(right);
                Filter::Or(left)
            }
            (Filter::Or(mut left), f) => {
                left.push(f);
                Filter::Or(left)
            }
            (f, Filter::Or(mut right)) => {
                right.insert(0, f);
                Filter::Or(right)
            }
            (left, right) => Filter::Or(vec![left, right]),
        }
    }

    /// Whether the filter places no restriction on documents
    pub fn is_all(&self) -> bool {
        matches!(self, Filter::All)
    }
}

impl Not for Filter {
    type Output = Filter;

    fn not(self) -> Filter {
        match self {
            Filter::Not(inner) => *inner,
            other => Filter::Not(Box::new(other)),
        }
    }
}

/// A fluent builder for filters on one property.
#[derive(Debug, Clone)]
pub struct FieldFilter {
    path: String,
}

impl FieldFilter {
    fn compare(self, op: Comparison, value: Value) -> Filter {
        Filter::Compare {
            path: self.path,
            op,
            value,
        }
    }

    /// Property equals `value`
    pub fn eq<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(Comparison::Eq, value.into())
    }

    /// Property differs from `value`
    pub fn ne<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(Comparison::Ne, value.into())
    }

    pub fn gt<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(Comparison::Gt, value.into())
    }

    pub fn gte<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(Comparison::Gte, value.into())
    }

    pub fn lt<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(Comparison::Lt, value.into())
    }

    pub fn lte<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(Comparison::Lte, value.into())
    }

    /// Property equals one of `values`. An empty list matches nothing.
    pub fn in_list<I, T>(self, values: I) -> Filter
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Filter::In {
            path: self.path,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn starts_with(self, prefix: impl Into<String>) -> Filter {
        Filter::StartsWith {
            path: self.path,
            prefix: prefix.into(),
        }
    }

    pub fn contains(self, needle: impl Into<String>) -> Filter {
        Filter::Contains {
            path: self.path,
            needle: needle.into(),
        }
    }

    pub fn is_defined(self) -> Filter {
        Filter::IsDefined { path: self.path }
    }
}
