//! Creation payloads for plugins, item types and fieldsets

use super::remapper::IdMappings;
use crate::api::models::{kinds, Relationship, Resource};
use crate::schema::item_type::PRESENTATION_RELATIONSHIPS;
use crate::schema::{FieldsetPayload, ItemTypeToCreate, PluginPayload};
use anyhow::Result;
use serde_json::{Map, Value};

/// Attributes the destination derives itself for current-version plugins
const DERIVED_PLUGIN_ATTRIBUTES: [&str; 4] = [
    "parameter_definitions",
    "field_types",
    "plugin_type",
    "parameters",
];

/// Left to the destination's default singleton behaviour
const SINGLETON_FLAG: &str = "has_singleton_item";

/// Plugin creation payload.
///
/// Registry packages are installed by name alone. Other plugins send their
/// attributes minus `parameters`, which are set by a follow-up update; current
/// versions additionally drop what the destination derives from the manifest.
pub fn plugin_resource(plugin: &PluginPayload, destination_id: &str) -> Resource {
    let attributes = match plugin.package_name() {
        Some(package_name) => {
            let mut attributes = Map::new();
            attributes.insert("package_name".to_string(), Value::String(package_name.to_string()));
            attributes
        }
        None if plugin.is_legacy() => without(&plugin.attributes, &["parameters"]),
        None => without(&plugin.attributes, &DERIVED_PLUGIN_ATTRIBUTES),
    };

    Resource::new(kinds::PLUGIN, destination_id, attributes)
}

/// Item type creation payload: source attributes with the singleton flag
/// stripped and the rename applied. Relationships are never sent on creation.
pub fn item_type_resource(item_type: &ItemTypeToCreate, destination_id: &str) -> Resource {
    let mut attributes = without(&item_type.entity.attributes, &[SINGLETON_FLAG]);

    if let Some(rename) = &item_type.rename {
        attributes.insert("name".to_string(), Value::String(rename.name.clone()));
        attributes.insert("api_key".to_string(), Value::String(rename.api_key.clone()));
    }

    Resource::new(kinds::ITEM_TYPE, destination_id, attributes)
}

/// Fieldset creation payload. The owning item type travels in the URL.
pub fn fieldset_resource(fieldset: &FieldsetPayload, destination_id: &str) -> Result<Resource> {
    let attributes = match serde_json::to_value(&fieldset.attributes)? {
        Value::Object(map) => map,
        other => anyhow::bail!("Fieldset attributes serialized to {}", other),
    };

    Ok(Resource::new(kinds::FIELDSET, destination_id, attributes))
}

/// Update linking a created item type to its presentation fields, or `None`
/// when the source sets none of them
pub fn item_type_finalization(item_type: &ItemTypeToCreate, mappings: &IdMappings) -> Result<Option<Resource>> {
    let source = &item_type.entity;
    if !source.has_presentation_fields() {
        return Ok(None);
    }

    let destination_id = mappings.item_types.require(&source.id)?;
    let mut resource = Resource::new(kinds::ITEM_TYPE, destination_id, Map::new());

    for name in PRESENTATION_RELATIONSHIPS {
        let relationship = source
            .linked_field(name)
            .and_then(|field| mappings.fields.resolve(field))
            .map(|field| Relationship::to(kinds::FIELD, field))
            .unwrap_or_else(Relationship::none);
        resource = resource.with_relationship(name, relationship);
    }

    Ok(Some(resource))
}

fn without(attributes: &Map<String, Value>, excluded: &[&str]) -> Map<String, Value> {
    attributes
        .iter()
        .filter(|(key, _)| !excluded.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::ids::RandomIdGenerator;
    use crate::import::remapper::EntityClass;
    use serde_json::json;

    fn plugin(attributes: Value, meta: Value) -> PluginPayload {
        serde_json::from_value(json!({ "id": "p1", "attributes": attributes, "meta": meta })).unwrap()
    }

    fn item_type(value: Value) -> ItemTypeToCreate {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_package_plugin_sends_only_package_name() {
        let plugin = plugin(
            json!({ "package_name": "star-rating", "name": "Stars", "url": "https://x", "parameters": { "a": 1 } }),
            json!({ "version": "2" }),
        );

        let resource = plugin_resource(&plugin, "new-p1");
        assert_eq!(resource.id, "new-p1");
        assert_eq!(resource.kind, "plugin");
        assert_eq!(Value::Object(resource.attributes), json!({ "package_name": "star-rating" }));
    }

    #[test]
    fn test_legacy_plugin_keeps_everything_but_parameters() {
        let plugin = plugin(
            json!({ "name": "Stars", "url": "https://x", "field_types": ["integer"], "parameters": { "a": 1 } }),
            json!({ "version": "2" }),
        );

        let attributes = plugin_resource(&plugin, "new-p1").attributes;
        assert!(attributes.contains_key("field_types"));
        assert!(attributes.contains_key("url"));
        assert!(!attributes.contains_key("parameters"));
    }

    #[test]
    fn test_current_plugin_drops_derived_attributes() {
        let plugin = plugin(
            json!({
                "name": "Stars",
                "url": "https://x",
                "parameter_definitions": {},
                "field_types": ["integer"],
                "plugin_type": "field_editor",
                "parameters": {}
            }),
            json!({ "version": "3" }),
        );

        let attributes = plugin_resource(&plugin, "new-p1").attributes;
        assert_eq!(Value::Object(attributes), json!({ "name": "Stars", "url": "https://x" }));
    }

    #[test]
    fn test_item_type_rename_and_singleton_flag() {
        let item_type = item_type(json!({
            "entity": {
                "id": "it1",
                "attributes": { "name": "Article", "api_key": "article", "has_singleton_item": true, "sortable": true },
                "relationships": { "title_field": { "data": { "type": "field", "id": "f1" } } }
            },
            "rename": { "name": "News", "apiKey": "news" }
        }));

        let resource = item_type_resource(&item_type, "new-it1");
        assert_eq!(resource.attributes["name"], "News");
        assert_eq!(resource.attributes["api_key"], "news");
        assert_eq!(resource.attributes["sortable"], true);
        assert!(!resource.attributes.contains_key("has_singleton_item"));
        assert!(resource.relationships.is_empty());
    }

    #[test]
    fn test_fieldset_sends_attributes_only() {
        let fieldset: FieldsetPayload = serde_json::from_value(json!({
            "id": "fs1",
            "attributes": { "title": "SEO", "collapsible": true, "position": 4 },
            "relationships": { "item_type": { "data": { "type": "item_type", "id": "it1" } } }
        }))
        .unwrap();

        let resource = fieldset_resource(&fieldset, "new-fs1").unwrap();
        assert_eq!(resource.attributes["title"], "SEO");
        assert_eq!(resource.attributes["position"], 4);
        assert!(resource.relationships.is_empty());
    }

    #[test]
    fn test_finalization_remaps_presentation_fields() {
        let item_type = item_type(json!({
            "entity": {
                "id": "it1",
                "attributes": { "api_key": "article" },
                "relationships": {
                    "title_field": { "data": { "type": "field", "id": "f1" } },
                    "image_preview_field": { "data": { "type": "field", "id": "outside" } },
                    "excerpt_field": { "data": null }
                }
            }
        }));

        let mut mappings = IdMappings::new();
        let it = mappings.allocate(EntityClass::ItemType, "it1", &RandomIdGenerator).unwrap();
        let f1 = mappings.allocate(EntityClass::Field, "f1", &RandomIdGenerator).unwrap();

        let resource = item_type_finalization(&item_type, &mappings).unwrap().unwrap();
        assert_eq!(resource.id, it);
        assert_eq!(resource.relationships["title_field"], json!({ "data": { "type": "field", "id": f1 } }));
        assert_eq!(resource.relationships["image_preview_field"], json!({ "data": null }));
        assert_eq!(resource.relationships["excerpt_field"], json!({ "data": null }));
        assert_eq!(resource.relationships["ordering_field"], json!({ "data": null }));
    }

    #[test]
    fn test_finalization_skipped_without_presentation_fields() {
        let item_type = item_type(json!({ "entity": { "id": "it1", "attributes": {} } }));
        let mappings = IdMappings::new();
        assert!(item_type_finalization(&item_type, &mappings).unwrap().is_none());
    }
}
