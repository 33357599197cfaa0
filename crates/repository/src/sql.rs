//! Translation of [`Filter`] expressions into parameterised SQL queries.
//!
//! Values never appear in the query text; each one becomes an `@pN`
//! parameter. Property names are quoted with bracket notation so that any
//! name (including ones with spaces or quotes) is addressable:
//!
//! ```text
//! field("total").gt(10).and(field("customer").eq("acme"))
//!   => SELECT * FROM root WHERE (root["total"] > @p0 AND root["customer"] = @p1)
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use domain::{field, Filter, ID_FIELD, PARAMETER_PREFIX, QUERY_ROOT_ALIAS};

/// A named query parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlParameter {
    pub name: String,
    pub value: Value,
}

/// Query text plus its parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SqlQuerySpec {
    pub query: String,
    #[serde(default)]
    pub parameters: Vec<SqlParameter>,
}

impl SqlQuerySpec {
    /// A query with no parameters
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            parameters: Vec::new(),
        }
    }

    /// Get the value bound to a parameter name
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    /// Build the query for a filter.
    pub fn from_filter(filter: &Filter) -> Self {
        let mut translator = Translator::default();
        let query = if filter.is_all() {
            format!("SELECT * FROM {}", QUERY_ROOT_ALIAS)
        } else {
            let condition = translator.expression(filter);
            format!("SELECT * FROM {} WHERE {}", QUERY_ROOT_ALIAS, condition)
        };

        Self {
            query,
            parameters: translator.parameters,
        }
    }

    /// Point lookup of a document by identity.
    pub fn by_id(id: &str) -> Self {
        Self::from_filter(&field(ID_FIELD).eq(id))
    }
}

#[derive(Default)]
struct Translator {
    parameters: Vec<SqlParameter>,
}

impl Translator {
    fn bind(&mut self, value: Value) -> String {
        let name = format!("{}{}", PARAMETER_PREFIX, self.parameters.len());
        self.parameters.push(SqlParameter {
            name: name.clone(),
            value,
        });
        name
    }

    fn expression(&mut self, filter: &Filter) -> String {
        match filter {
            Filter::All => "true".to_string(),
            Filter::Compare { path, op, value } => {
                let param = self.bind(value.clone());
                format!("{} {} {}", property(path), op.operator(), param)
            }
            Filter::In { values, .. } if values.is_empty() => "false".to_string(),
            Filter::In { path, values } => {
                let params: Vec<String> = values.iter().map(|v| self.bind(v.clone())).collect();
                format!("{} IN ({})", property(path), params.join(", "))
            }
            Filter::StartsWith { path, prefix } => {
                let param = self.bind(Value::String(prefix.clone()));
                format!("STARTSWITH({}, {})", property(path), param)
            }
            Filter::Contains { path, needle } => {
                let param = self.bind(Value::String(needle.clone()));
                format!("CONTAINS({}, {})", property(path), param)
            }
            Filter::IsDefined { path } => format!("IS_DEFINED({})", property(path)),
            Filter::And(parts) => self.junction(parts, " AND ", "true"),
            Filter::Or(parts) => self.junction(parts, " OR ", "false"),
            Filter::Not(inner) => format!("NOT ({})", self.expression(inner)),
        }
    }

    fn junction(&mut self, parts: &[Filter], separator: &str, empty: &str) -> String {
        match parts {
            [] => empty.to_string(),
            [single] => self.expression(single),
            _ => {
                let rendered: Vec<String> = parts.iter().map(|p| self.expression(p)).collect();
                format!("({})", rendered.join(separator))
            }
        }
    }
}

/// Render a dotted property path as `root["a"]["b"]`.
fn property(path: &str) -> String {
    let mut rendered = String::from(QUERY_ROOT_ALIAS);
    for segment in path.split('.') {
        rendered.push('[');
        // A JSON string literal is a valid quoted property name.
        rendered.push_str(&Value::String(segment.to_string()).to_string());
        rendered.push(']');
    }
    rendered
}
