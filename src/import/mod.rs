//! Schema import core
//!
//! Executes a pre-computed [`ImportPlan`](crate::schema::ImportPlan) against a
//! destination: allocates destination ids for everything the plan creates,
//! rewrites every embedded reference through them and creates the entities in
//! dependency order.

pub mod editors;
pub mod ids;
pub mod orchestrator;
pub mod payloads;
pub mod positions;
pub mod progress;
pub mod remapper;
pub mod rewrite;
pub mod validators;

pub use editors::{BuiltinEditors, EditorCatalog};
pub use ids::{IdGenerator, RandomIdGenerator};
pub use orchestrator::{import_schema, ImportReport, SchemaImporter};
pub use positions::PositionUpdate;
pub use progress::{Progress, ProgressTracker, TrackedOperation};
pub use remapper::{EntityClass, IdMappings, IdTable};
pub use rewrite::{rewrite_field, RewriteContext};
pub use validators::ReferenceKind;
