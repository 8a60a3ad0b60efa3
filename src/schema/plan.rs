//! Import plan: the pre-computed instruction for one import run

use super::field::FieldPayload;
use super::item_type::{FieldsetPayload, ItemTypePayload, Rename};
use super::plugin::PluginPayload;
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

/// Entities of one class to create, plus source ids that map onto entities
/// already present at the destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntitySection<T> {
    #[serde(default = "Vec::new")]
    pub to_create: Vec<T>,
    #[serde(default)]
    pub ids_to_reuse: BTreeMap<String, String>,
}

impl<T> Default for EntitySection<T> {
    fn default() -> Self {
        Self {
            to_create: Vec::new(),
            ids_to_reuse: BTreeMap::new(),
        }
    }
}

/// An item type to create together with the fields and fieldsets it owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemTypeToCreate {
    pub entity: ItemTypePayload,
    #[serde(default)]
    pub rename: Option<Rename>,
    #[serde(default)]
    pub fields: Vec<FieldPayload>,
    #[serde(default)]
    pub fieldsets: Vec<FieldsetPayload>,
}

impl ItemTypeToCreate {
    /// Fields that may be created as soon as the fieldsets exist
    pub fn regular_fields(&self) -> impl Iterator<Item = &FieldPayload> {
        self.fields.iter().filter(|f| !f.is_slug())
    }

    /// Slug fields, created after every regular field of the item type
    pub fn slug_fields(&self) -> impl Iterator<Item = &FieldPayload> {
        self.fields.iter().filter(|f| f.is_slug())
    }

    /// Label for logs and errors
    pub fn label(&self) -> String {
        match self.entity.api_key() {
            Some(api_key) => format!("{} ({})", api_key, self.entity.id),
            None => self.entity.id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportPlan {
    #[serde(default)]
    pub item_types: EntitySection<ItemTypeToCreate>,
    #[serde(default)]
    pub plugins: EntitySection<PluginPayload>,
}

impl ImportPlan {
    pub fn from_json(json: &str) -> Result<Self> {
        let plan = Self::parse(json).context("Failed to parse import plan")?;
        plan.validate()?;
        Ok(plan)
    }

    /// Derived struct deserialization also accepts sequences, which would
    /// turn `"item_types": []` into an empty section
    fn parse(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Object(sections) = &value else {
            anyhow::bail!("expected an object at the top level");
        };
        for (name, section) in sections {
            if !section.is_object() {
                anyhow::bail!("section `{}` must be an object", name);
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        debug!("Loading import plan from: {:?}", path);
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read import plan: {:?}", path))?;
        Self::from_json(&content).with_context(|| format!("Invalid import plan: {:?}", path))
    }

    /// Check that every nested entity belongs to the item type it is listed under
    pub fn validate(&self) -> Result<()> {
        for item_type in &self.item_types.to_create {
            let owner = item_type.entity.id.as_str();
            let fieldset_ids: HashSet<&str> =
                item_type.fieldsets.iter().map(|fs| fs.id.as_str()).collect();

            for fieldset in &item_type.fieldsets {
                if let Some(declared) = fieldset.relationships.item_type.id() {
                    if declared != owner {
                        anyhow::bail!(
                            "Fieldset {} is listed under item type {} but belongs to {}",
                            fieldset.id,
                            owner,
                            declared
                        );
                    }
                }
            }

            for field in &item_type.fields {
                if let Some(declared) = field.relationships.item_type.id() {
                    if declared != owner {
                        anyhow::bail!(
                            "Field {} is listed under item type {} but belongs to {}",
                            field.id,
                            owner,
                            declared
                        );
                    }
                }
                if let Some(fieldset) = field.relationships.fieldset.id() {
                    if !fieldset_ids.contains(fieldset) {
                        anyhow::bail!(
                            "Field {} sits in fieldset {} which item type {} does not carry",
                            field.id,
                            fieldset,
                            owner
                        );
                    }
                }
            }
        }

        Ok(())
    }

    pub fn summary(&self) -> PlanSummary {
        let to_create = &self.item_types.to_create;
        PlanSummary {
            item_types_to_create: to_create.len(),
            item_types_to_reuse: self.item_types.ids_to_reuse.len(),
            fields: to_create.iter().map(|it| it.fields.len()).sum(),
            slug_fields: to_create.iter().map(|it| it.slug_fields().count()).sum(),
            fieldsets: to_create.iter().map(|it| it.fieldsets.len()).sum(),
            plugins_to_create: self.plugins.to_create.len(),
            plugins_to_reuse: self.plugins.ids_to_reuse.len(),
        }
    }
}

/// Entity counts of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PlanSummary {
    pub item_types_to_create: usize,
    pub item_types_to_reuse: usize,
    pub fields: usize,
    pub slug_fields: usize,
    pub fieldsets: usize,
    pub plugins_to_create: usize,
    pub plugins_to_reuse: usize,
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Item types: {} to create, {} to reuse",
            self.item_types_to_create, self.item_types_to_reuse
        )?;
        writeln!(f, "Fields:     {} ({} slug)", self.fields, self.slug_fields)?;
        writeln!(f, "Fieldsets:  {}", self.fieldsets)?;
        write!(
            f,
            "Plugins:    {} to create, {} to reuse",
            self.plugins_to_create, self.plugins_to_reuse
        )
    }
}
