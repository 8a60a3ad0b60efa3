//! Field reference rewriting
//!
//! Turns a field exported from the source project into the payload created at
//! the destination: every embedded identifier is translated through the
//! identifier tables, references to entities outside the plan are dropped, and
//! appearance/default-value state that cannot survive the translation is reset.

use super::editors::EditorCatalog;
use super::remapper::{IdMappings, IdTable};
use super::validators::{self, ITEM_TYPES_KEY, SLUG_TITLE_FIELD, TITLE_FIELD_ID_KEY};
use crate::api::models::{kinds, Relationship};
use crate::schema::{Appearance, FieldAttributes, FieldPayload};
use anyhow::Result;
use log::debug;
use serde_json::{Map, Value};

/// Read-only state shared by every field rewrite of a run
pub struct RewriteContext<'a> {
    pub mappings: &'a IdMappings,
    /// Destination locales, in order
    pub locales: &'a [String],
    pub editors: &'a dyn EditorCatalog,
}

/// Produce the destination payload for `source`. Pure: the same source and
/// tables always yield the same output.
pub fn rewrite_field(source: &FieldPayload, ctx: &RewriteContext<'_>) -> Result<FieldPayload> {
    let mut field = source.clone();

    field.id = ctx.mappings.fields.require(&source.id)?.to_string();
    field.relationships.item_type = match source.relationships.item_type.id() {
        Some(item_type) => match ctx.mappings.item_types.resolve(item_type) {
            Some(destination) => Relationship::to(kinds::ITEM_TYPE, destination),
            None => Relationship::none(),
        },
        None => Relationship::none(),
    };
    field.relationships.fieldset = match source.relationships.fieldset.id() {
        Some(fieldset) => Relationship::to(kinds::FIELDSET, ctx.mappings.fieldsets.require(fieldset)?),
        None => Relationship::none(),
    };

    rewrite_item_type_references(&mut field.attributes, &ctx.mappings.item_types);
    rewrite_slug_title_field(&mut field.attributes, &ctx.mappings.fields)?;

    field.attributes.legacy_appearance = None;

    rewrite_editor(&mut field.attributes, ctx)?;

    if field.attributes.localized {
        field.attributes.default_value = localized_default(&source.attributes.default_value, ctx.locales);
    }

    rewrite_addons(&mut field.attributes.appearance, &ctx.mappings.plugins);

    Ok(field)
}

/// Translate the item type lists of link/block validators, dropping ids that
/// are not part of the plan
fn rewrite_item_type_references(attributes: &mut FieldAttributes, item_types: &IdTable) {
    let field_type = attributes.field_type.as_str();

    for (name, config) in attributes.validators.iter_mut() {
        if validators::item_type_references(field_type, name).is_none() {
            continue;
        }

        let Some(list) = config.get_mut(ITEM_TYPES_KEY).and_then(Value::as_array_mut) else {
            continue;
        };

        let before = list.len();
        *list = list
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|id| item_types.resolve(id))
            .map(|id| Value::String(id.to_string()))
            .collect();

        if list.len() < before {
            debug!(
                "Dropped {} item type references outside the plan from validator {}",
                before - list.len(),
                name
            );
        }
    }
}

/// Point a slug's title-field validator at the destination id of its sibling
fn rewrite_slug_title_field(attributes: &mut FieldAttributes, fields: &IdTable) -> Result<()> {
    let Some(config) = attributes.validators.get_mut(SLUG_TITLE_FIELD) else {
        return Ok(());
    };

    let Some(source) = config.get(TITLE_FIELD_ID_KEY).and_then(Value::as_str) else {
        return Ok(());
    };

    let destination = fields.resolve(source).ok_or_else(|| {
        anyhow::anyhow!(
            "{} references field {} which is not part of the import",
            SLUG_TITLE_FIELD,
            source
        )
    })?;

    let destination = Value::String(destination.to_string());
    if let Some(config) = config.as_object_mut() {
        config.insert(TITLE_FIELD_ID_KEY.to_string(), destination);
    }

    Ok(())
}

/// Plugin editors follow their plugin; editors of plugins outside the plan
/// fall back to the field type's default appearance
fn rewrite_editor(attributes: &mut FieldAttributes, ctx: &RewriteContext<'_>) -> Result<()> {
    let editor = attributes.appearance.editor.as_str();
    if ctx.editors.is_builtin_editor(editor) {
        return Ok(());
    }

    match ctx.mappings.plugins.resolve(editor) {
        Some(plugin) => attributes.appearance.editor = plugin.to_string(),
        None => {
            debug!(
                "Editor {} is not part of the plan, using the default {} appearance",
                editor, attributes.field_type
            );
            attributes.appearance = ctx.editors.default_appearance(&attributes.field_type)?;
        }
    }

    Ok(())
}

/// Default value map with exactly one entry per destination locale
fn localized_default(source: &Value, locales: &[String]) -> Value {
    let values: Map<String, Value> = locales
        .iter()
        .map(|locale| {
            let value = source.get(locale).cloned().unwrap_or(Value::Null);
            (locale.clone(), value)
        })
        .collect();

    Value::Object(values)
}

/// Keep only addons whose plugin is part of the plan
fn rewrite_addons(appearance: &mut Appearance, plugins: &IdTable) {
    appearance.addons.retain_mut(|addon| match plugins.resolve(&addon.id) {
        Some(plugin) => {
            addon.id = plugin.to_string();
            true
        }
        None => false,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::editors::BuiltinEditors;
    use crate::import::ids::IdGenerator;
    use crate::import::remapper::EntityClass;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Sequential(AtomicUsize);

    impl IdGenerator for Sequential {
        fn generate(&self) -> String {
            format!("d{}", self.0.fetch_add(1, Ordering::SeqCst))
        }
    }

    fn mappings() -> IdMappings {
        let ids = Sequential(AtomicUsize::new(0));
        let mut mappings = IdMappings::new();
        mappings.allocate(EntityClass::ItemType, "A", &ids).unwrap(); // d0
        mappings.allocate(EntityClass::Field, "title", &ids).unwrap(); // d1
        mappings.allocate(EntityClass::Field, "body", &ids).unwrap(); // d2
        mappings.allocate(EntityClass::Fieldset, "fs", &ids).unwrap(); // d3
        mappings.allocate(EntityClass::Plugin, "plugin-1", &ids).unwrap(); // d4
        mappings.reuse(EntityClass::ItemType, "R", "existing-R").unwrap();
        mappings
    }

    fn field(value: Value) -> FieldPayload {
        serde_json::from_value(value).unwrap()
    }

    fn rewrite(source: &FieldPayload, locales: &[String]) -> Result<FieldPayload> {
        let mappings = mappings();
        let ctx = RewriteContext {
            mappings: &mappings,
            locales,
            editors: &BuiltinEditors,
        };
        rewrite_field(source, &ctx)
    }

    #[test]
    fn test_ids_and_fieldset_are_remapped() {
        let source = field(json!({
            "id": "body",
            "attributes": { "field_type": "text", "appearance": { "editor": "textarea" } },
            "relationships": {
                "item_type": { "data": { "type": "item_type", "id": "A" } },
                "fieldset": { "data": { "type": "fieldset", "id": "fs" } }
            }
        }));

        let rewritten = rewrite(&source, &[]).unwrap();
        assert_eq!(rewritten.id, "d2");
        assert_eq!(rewritten.relationships.item_type.id(), Some("d0"));
        assert_eq!(rewritten.relationships.fieldset.id(), Some("d3"));
        assert_eq!(rewritten.attributes.appearance.editor, "textarea");
    }

    #[test]
    fn test_missing_fieldset_becomes_explicit_none() {
        let source = field(json!({
            "id": "body",
            "attributes": { "field_type": "text", "appearance": { "editor": "textarea" } }
        }));

        let resource = rewrite(&source, &[]).unwrap().to_resource().unwrap();
        assert_eq!(resource.relationships["fieldset"], json!({ "data": null }));
    }

    #[test]
    fn test_link_validator_drops_item_types_outside_plan() {
        let source = field(json!({
            "id": "body",
            "attributes": {
                "field_type": "links",
                "validators": {
                    "items_item_type": { "item_types": ["A", "B", "R"], "on_publish_with_unpublished_references_strategy": "fail" },
                    "size": { "max": 3 }
                },
                "appearance": { "editor": "links_select" }
            }
        }));

        let rewritten = rewrite(&source, &[]).unwrap();
        let validators = &rewritten.attributes.validators;
        assert_eq!(validators["items_item_type"]["item_types"], json!(["d0", "existing-R"]));
        assert_eq!(
            validators["items_item_type"]["on_publish_with_unpublished_references_strategy"],
            "fail"
        );
        assert_eq!(validators["size"], json!({ "max": 3 }));
    }

    #[test]
    fn test_validator_on_unrelated_field_type_is_untouched() {
        let source = field(json!({
            "id": "body",
            "attributes": {
                "field_type": "string",
                "validators": { "items_item_type": { "item_types": ["B"] } },
                "appearance": { "editor": "single_line" }
            }
        }));

        let rewritten = rewrite(&source, &[]).unwrap();
        assert_eq!(rewritten.attributes.validators["items_item_type"]["item_types"], json!(["B"]));
    }

    #[test]
    fn test_slug_title_field_follows_sibling() {
        let source = field(json!({
            "id": "body",
            "attributes": {
                "field_type": "slug",
                "validators": { "slug_title_field": { "title_field_id": "title" } },
                "appearance": { "editor": "slug" }
            }
        }));

        let rewritten = rewrite(&source, &[]).unwrap();
        assert_eq!(rewritten.attributes.validators["slug_title_field"]["title_field_id"], "d1");
    }

    #[test]
    fn test_unresolved_slug_title_field_is_an_error() {
        let source = field(json!({
            "id": "body",
            "attributes": {
                "field_type": "slug",
                "validators": { "slug_title_field": { "title_field_id": "ghost" } },
                "appearance": { "editor": "slug" }
            }
        }));

        let err = rewrite(&source, &[]).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_plugin_editor_and_addons() {
        let source = field(json!({
            "id": "body",
            "attributes": {
                "field_type": "string",
                "appearance": {
                    "editor": "plugin-1",
                    "parameters": { "stars": 5 },
                    "addons": [
                        { "id": "plugin-1", "parameters": { "a": 1 } },
                        { "id": "plugin-elsewhere", "parameters": {} }
                    ]
                },
                "appeareance": { "editor": "plugin-1" }
            }
        }));

        let rewritten = rewrite(&source, &[]).unwrap();
        let appearance = &rewritten.attributes.appearance;
        assert_eq!(appearance.editor, "d4");
        assert_eq!(appearance.parameters, json!({ "stars": 5 }));
        assert_eq!(appearance.addons.len(), 1);
        assert_eq!(appearance.addons[0].id, "d4");
        assert_eq!(appearance.addons[0].parameters, json!({ "a": 1 }));
        assert!(rewritten.attributes.legacy_appearance.is_none());
    }

    #[test]
    fn test_unknown_plugin_editor_falls_back_to_default() {
        let source = field(json!({
            "id": "body",
            "attributes": {
                "field_type": "string",
                "appearance": { "editor": "plugin-elsewhere", "parameters": { "x": 1 } }
            }
        }));

        let rewritten = rewrite(&source, &[]).unwrap();
        assert_eq!(rewritten.attributes.appearance, BuiltinEditors.default_appearance("string").unwrap());
    }

    #[test]
    fn test_localized_default_matches_destination_locales() {
        let source = field(json!({
            "id": "body",
            "attributes": {
                "field_type": "string",
                "localized": true,
                "default_value": { "en": "Hello", "fr": "Bonjour" },
                "appearance": { "editor": "single_line" }
            }
        }));
        let locales = vec!["en".to_string(), "it".to_string()];

        let rewritten = rewrite(&source, &locales).unwrap();
        assert_eq!(rewritten.attributes.default_value, json!({ "en": "Hello", "it": null }));
    }

    #[test]
    fn test_non_localized_default_is_kept() {
        let source = field(json!({
            "id": "body",
            "attributes": {
                "field_type": "boolean",
                "default_value": true,
                "appearance": { "editor": "boolean" }
            }
        }));

        let rewritten = rewrite(&source, &["en".to_string()]).unwrap();
        assert_eq!(rewritten.attributes.default_value, json!(true));
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let source = field(json!({
            "id": "body",
            "attributes": {
                "field_type": "link",
                "localized": true,
                "validators": { "item_item_type": { "item_types": ["A", "Z"] } },
                "appearance": { "editor": "plugin-1", "addons": [{ "id": "plugin-1" }] }
            },
            "relationships": { "fieldset": { "data": { "type": "fieldset", "id": "fs" } } }
        }));
        let locales = vec!["en".to_string()];

        let first = rewrite(&source, &locales).unwrap();
        let second = rewrite(&source, &locales).unwrap();
        assert_eq!(first, second);
    }
}
