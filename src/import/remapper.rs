//! Identifier remapping from source ids to destination ids
//!
//! One table per entity class. Ids for entities to create are allocated up
//! front, before any remote call, so forward references between item types
//! resolve regardless of creation order. Reused ids land in the same tables and
//! are indistinguishable from allocated ones when resolving.

use super::ids::IdGenerator;
use crate::schema::ImportPlan;
use anyhow::Result;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityClass {
    ItemType,
    Field,
    Fieldset,
    Plugin,
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityClass::ItemType => "item type",
            EntityClass::Field => "field",
            EntityClass::Fieldset => "fieldset",
            EntityClass::Plugin => "plugin",
        };
        f.write_str(name)
    }
}

/// Source id -> destination id for a single entity class
#[derive(Debug, Clone)]
pub struct IdTable {
    class: EntityClass,
    entries: HashMap<String, String>,
}

impl IdTable {
    pub fn new(class: EntityClass) -> Self {
        Self {
            class,
            entries: HashMap::new(),
        }
    }

    fn insert(&mut self, source: &str, destination: String) -> Result<()> {
        if let Some(existing) = self.entries.get(source) {
            anyhow::bail!(
                "{} {} is already mapped to {}",
                self.class,
                source,
                existing
            );
        }
        self.entries.insert(source.to_string(), destination);
        Ok(())
    }

    /// Destination id, or `None` when the entity is not part of the plan
    pub fn resolve(&self, source: &str) -> Option<&str> {
        self.entries.get(source).map(String::as_str)
    }

    /// Destination id of an entity that must be part of the plan
    pub fn require(&self, source: &str) -> Result<&str> {
        self.resolve(source)
            .ok_or_else(|| anyhow::anyhow!("No destination id for {} {}", self.class, source))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The four identifier tables of one import run
#[derive(Debug, Clone)]
pub struct IdMappings {
    pub item_types: IdTable,
    pub fields: IdTable,
    pub fieldsets: IdTable,
    pub plugins: IdTable,
    allocated: HashSet<String>,
    reused: HashSet<String>,
}

impl Default for IdMappings {
    fn default() -> Self {
        Self {
            item_types: IdTable::new(EntityClass::ItemType),
            fields: IdTable::new(EntityClass::Field),
            fieldsets: IdTable::new(EntityClass::Fieldset),
            plugins: IdTable::new(EntityClass::Plugin),
            allocated: HashSet::new(),
            reused: HashSet::new(),
        }
    }
}

impl IdMappings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate ids for everything the plan creates, then record its reuse entries
    pub fn build(plan: &ImportPlan, ids: &dyn IdGenerator) -> Result<Self> {
        let mut mappings = Self::new();

        for plugin in &plan.plugins.to_create {
            mappings.allocate(EntityClass::Plugin, &plugin.id, ids)?;
        }

        for item_type in &plan.item_types.to_create {
            mappings.allocate(EntityClass::ItemType, &item_type.entity.id, ids)?;
            for fieldset in &item_type.fieldsets {
                mappings.allocate(EntityClass::Fieldset, &fieldset.id, ids)?;
            }
            for field in &item_type.fields {
                mappings.allocate(EntityClass::Field, &field.id, ids)?;
            }
        }

        for (source, destination) in &plan.plugins.ids_to_reuse {
            mappings.reuse(EntityClass::Plugin, source, destination)?;
        }
        for (source, destination) in &plan.item_types.ids_to_reuse {
            mappings.reuse(EntityClass::ItemType, source, destination)?;
        }

        debug!(
            "Identifier tables built: {} item types, {} fields, {} fieldsets, {} plugins",
            mappings.item_types.len(),
            mappings.fields.len(),
            mappings.fieldsets.len(),
            mappings.plugins.len()
        );

        Ok(mappings)
    }

    pub fn table(&self, class: EntityClass) -> &IdTable {
        match class {
            EntityClass::ItemType => &self.item_types,
            EntityClass::Field => &self.fields,
            EntityClass::Fieldset => &self.fieldsets,
            EntityClass::Plugin => &self.plugins,
        }
    }

    fn table_mut(&mut self, class: EntityClass) -> &mut IdTable {
        match class {
            EntityClass::ItemType => &mut self.item_types,
            EntityClass::Field => &mut self.fields,
            EntityClass::Fieldset => &mut self.fieldsets,
            EntityClass::Plugin => &mut self.plugins,
        }
    }

    /// Generate and record a fresh destination id
    pub fn allocate(&mut self, class: EntityClass, source: &str, ids: &dyn IdGenerator) -> Result<String> {
        if let Some(existing) = self.table(class).resolve(source) {
            anyhow::bail!("{} {} is already mapped to {}", class, source, existing);
        }

        let destination = ids.generate();
        if self.allocated.contains(&destination) || self.reused.contains(&destination) {
            anyhow::bail!(
                "Generated id {} for {} {} collides with an id already in use",
                destination,
                class,
                source
            );
        }

        self.table_mut(class).insert(source, destination.clone())?;
        self.allocated.insert(destination.clone());
        Ok(destination)
    }

    /// Record an id that already exists at the destination
    pub fn reuse(&mut self, class: EntityClass, source: &str, destination: &str) -> Result<()> {
        if self.allocated.contains(destination) {
            anyhow::bail!(
                "Reused id {} for {} {} collides with a freshly allocated id",
                destination,
                class,
                source
            );
        }

        self.table_mut(class).insert(source, destination.to_string())?;
        self.reused.insert(destination.to_string());
        Ok(())
    }

    pub fn resolve(&self, class: EntityClass, source: &str) -> Option<&str> {
        self.table(class).resolve(source)
    }
}
