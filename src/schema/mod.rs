//! Typed model of the schema entities carried by an import plan

pub mod field;
pub mod item_type;
pub mod plan;
pub mod plugin;

pub use field::{Addon, Appearance, FieldAttributes, FieldPayload, FieldRelationships};
pub use item_type::{FieldsetPayload, ItemTypePayload, Rename};
pub use plan::{EntitySection, ImportPlan, ItemTypeToCreate, PlanSummary};
pub use plugin::PluginPayload;
