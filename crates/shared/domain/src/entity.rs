//! Entity contract and document body conversion.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::constants::{is_system_field, ID_FIELD};
use crate::error::{DomainError, DomainResult};

/// A caller-owned type that can be stored as a document.
///
/// The serialized form must be a JSON object whose `id` property equals
/// [`Entity::id`]. Everything else about the type is opaque to the repository.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Identity of the document within its collection
    fn id(&self) -> &str;
}

/// Serialize an entity into a document body, checking the identity contract.
pub fn to_document_body<T: Entity>(item: &T) -> DomainResult<Map<String, Value>> {
    let body = match serde_json::to_value(item)? {
        Value::Object(map) => map,
        other => {
            return Err(DomainError::validation(format!(
                "entity must serialize to an object, got {}",
                json_kind(&other)
            )))
        }
    };

    match body.get(ID_FIELD) {
        Some(Value::String(id)) if id == item.id() => Ok(body),
        Some(Value::String(id)) => Err(DomainError::validation(format!(
            "serialized id `{}` does not match entity id `{}`",
            id,
            item.id()
        ))),
        Some(_) => Err(DomainError::validation("`id` property must be a string")),
        None => Err(DomainError::validation("entity has no `id` property")),
    }
}

/// Deserialize a stored document body, ignoring service-added properties.
pub fn from_document_body<T: DeserializeOwned>(body: Value) -> DomainResult<T> {
    let body = match body {
        Value::Object(mut map) => {
            map.retain(|key, _| !is_system_field(key));
            Value::Object(map)
        }
        other => other,
    };

    serde_json::from_value(body).map_err(DomainError::from)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
