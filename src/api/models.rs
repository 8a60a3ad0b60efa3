//! JSON:API envelope types exchanged with the destination project

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Entity type names as they appear in the `type` member of a resource
pub mod kinds {
    pub const ITEM_TYPE: &str = "item_type";
    pub const FIELD: &str = "field";
    pub const FIELDSET: &str = "fieldset";
    pub const PLUGIN: &str = "plugin";
}

/// Reference to another resource (`{ "type": ..., "id": ... }`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

impl ResourceRef {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

/// To-one relationship linkage. `data: null` is an explicit "none".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub data: Option<ResourceRef>,
}

impl Relationship {
    pub fn to(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            data: Some(ResourceRef::new(kind, id)),
        }
    }

    pub fn none() -> Self {
        Self { data: None }
    }

    /// Identifier of the linked resource, if any
    pub fn id(&self) -> Option<&str> {
        self.data.as_ref().map(|r| r.id.as_str())
    }
}

/// A single JSON:API resource object as sent to (and returned by) the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub relationships: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl Resource {
    pub fn new(kind: impl Into<String>, id: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            attributes,
            relationships: Map::new(),
            meta: None,
        }
    }

    /// Attach a to-one relationship
    pub fn with_relationship(mut self, name: &str, relationship: Relationship) -> Self {
        let data = match relationship.data {
            Some(target) => serde_json::json!({ "type": target.kind, "id": target.id }),
            None => Value::Null,
        };
        self.relationships
            .insert(name.to_string(), serde_json::json!({ "data": data }));
        self
    }

    /// Wrap the resource in a top-level `{ "data": ... }` document
    pub fn into_document(self) -> Value {
        serde_json::json!({ "data": self })
    }
}

/// Top-level document returned by single-resource endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub data: Resource,
}
