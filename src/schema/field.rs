use crate::api::models::{kinds, Relationship, Resource};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field type whose validator may point at a sibling field
pub const SLUG_FIELD_TYPE: &str = "slug";

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Auxiliary editor component attached to a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Addon {
    /// Plugin identifier providing the addon
    pub id: String,
    #[serde(default = "empty_object")]
    pub parameters: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Editor configuration of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    /// Built-in editor name or plugin identifier
    #[serde(default)]
    pub editor: String,
    #[serde(default = "empty_object")]
    pub parameters: Value,
    #[serde(default)]
    pub addons: Vec<Addon>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            editor: String::new(),
            parameters: empty_object(),
            addons: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl Appearance {
    pub fn new(editor: impl Into<String>, parameters: Value) -> Self {
        Self {
            editor: editor.into(),
            parameters,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAttributes {
    pub field_type: String,
    #[serde(default)]
    pub validators: Map<String, Value>,
    #[serde(default)]
    pub localized: bool,
    #[serde(default)]
    pub default_value: Value,
    #[serde(default)]
    pub appearance: Appearance,
    /// Deprecated misspelt twin of `appearance`, never sent back
    #[serde(rename = "appeareance", default, skip_serializing_if = "Option::is_none")]
    pub legacy_appearance: Option<Value>,
    #[serde(default)]
    pub position: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldRelationships {
    #[serde(default)]
    pub item_type: Relationship,
    #[serde(default)]
    pub fieldset: Relationship,
}

/// A field definition as exported from the source project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPayload {
    pub id: String,
    pub attributes: FieldAttributes,
    #[serde(default)]
    pub relationships: FieldRelationships,
}

impl FieldPayload {
    pub fn is_slug(&self) -> bool {
        self.attributes.field_type == SLUG_FIELD_TYPE
    }

    pub fn api_key(&self) -> Option<&str> {
        self.attributes.extra.get("api_key").and_then(Value::as_str)
    }

    /// Creation payload. The owning item type travels in the URL, so only the
    /// fieldset linkage is sent as a relationship.
    pub fn to_resource(&self) -> anyhow::Result<Resource> {
        let attributes = match serde_json::to_value(&self.attributes)? {
            Value::Object(map) => map,
            other => anyhow::bail!("Field attributes serialized to {}", other),
        };

        Ok(Resource::new(kinds::FIELD, self.id.clone(), attributes)
            .with_relationship("fieldset", self.relationships.fieldset.clone()))
    }
}
