//! Re-applying source ordering once everything exists

use super::remapper::{EntityClass, IdMappings};
use crate::schema::ItemTypeToCreate;
use anyhow::Result;
use serde_json::{Map, Value};

/// One position update to issue against the destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionUpdate {
    /// Either [`EntityClass::Field`] or [`EntityClass::Fieldset`]
    pub class: EntityClass,
    /// Destination id
    pub id: String,
    pub position: i64,
}

impl PositionUpdate {
    pub fn attributes(&self) -> Map<String, Value> {
        let mut attributes = Map::new();
        attributes.insert("position".to_string(), Value::from(self.position));
        attributes
    }
}

/// Updates restoring the source order of an item type's fieldsets and fields,
/// sorted by source position. Ties keep fieldsets ahead of fields and
/// otherwise preserve plan order. Nothing to do for one entity or less.
pub fn position_updates(item_type: &ItemTypeToCreate, mappings: &IdMappings) -> Result<Vec<PositionUpdate>> {
    if item_type.fieldsets.len() + item_type.fields.len() <= 1 {
        return Ok(Vec::new());
    }

    let mut updates = Vec::with_capacity(item_type.fieldsets.len() + item_type.fields.len());

    for fieldset in &item_type.fieldsets {
        updates.push(PositionUpdate {
            class: EntityClass::Fieldset,
            id: mappings.fieldsets.require(&fieldset.id)?.to_string(),
            position: fieldset.attributes.position,
        });
    }

    for field in &item_type.fields {
        updates.push(PositionUpdate {
            class: EntityClass::Field,
            id: mappings.fields.require(&field.id)?.to_string(),
            position: field.attributes.position,
        });
    }

    updates.sort_by_key(|update| update.position);
    Ok(updates)
}
