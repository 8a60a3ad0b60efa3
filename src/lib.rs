//! Schema import engine for JSON:API content-management projects
//!
//! Replicates item types, fields, fieldsets and plugins described by an
//! [`ImportPlan`](schema::ImportPlan) into a destination project, allocating
//! fresh identifiers and rewriting every cross-reference through them.

pub mod api;
pub mod cli;
pub mod config;
pub mod import;
pub mod schema;

pub use api::{CmaClient, RecordingClient, SchemaApi};
pub use import::{ImportReport, Progress, SchemaImporter, import_schema};
pub use schema::ImportPlan;
