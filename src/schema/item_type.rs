use crate::api::models::Relationship;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Item type relationships that point at one of the item type's own fields
pub const PRESENTATION_RELATIONSHIPS: [&str; 4] = [
    "title_field",
    "image_preview_field",
    "excerpt_field",
    "ordering_field",
];

/// New display name and api key for an item type being created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rename {
    pub name: String,
    #[serde(alias = "apiKey")]
    pub api_key: String,
}

/// An item type as exported from the source project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemTypePayload {
    pub id: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Mixes to-one and to-many linkage, so kept untyped
    #[serde(default)]
    pub relationships: Map<String, Value>,
}

impl ItemTypePayload {
    pub fn api_key(&self) -> Option<&str> {
        self.attributes.get("api_key").and_then(Value::as_str)
    }

    /// Id of the field linked by a to-one relationship, if set
    pub fn linked_field(&self, relationship: &str) -> Option<&str> {
        self.relationships
            .get(relationship)?
            .get("data")?
            .get("id")?
            .as_str()
    }

    /// Whether any presentation relationship is set on the source
    pub fn has_presentation_fields(&self) -> bool {
        PRESENTATION_RELATIONSHIPS
            .iter()
            .any(|name| self.linked_field(name).is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldsetAttributes {
    #[serde(default)]
    pub position: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldsetRelationships {
    #[serde(default)]
    pub item_type: Relationship,
}

/// A fieldset as exported from the source project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldsetPayload {
    pub id: String,
    pub attributes: FieldsetAttributes,
    #[serde(default)]
    pub relationships: FieldsetRelationships,
}

impl FieldsetPayload {
    pub fn title(&self) -> Option<&str> {
        self.attributes.extra.get("title").and_then(Value::as_str)
    }
}
