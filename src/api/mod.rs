//! Destination-side API surface
//!
//! The import core talks to the destination project exclusively through the
//! [`SchemaApi`] trait. [`CmaClient`] implements it over HTTP, [`RecordingClient`]
//! implements it in memory for dry runs and tests.

pub mod client;
pub mod constants;
pub mod models;
pub mod recording;
pub mod resilience;

pub use client::CmaClient;
pub use models::{Document, Relationship, Resource, ResourceRef};
pub use recording::{RecordedCall, RecordingClient};
pub use resilience::{RetryConfig, RetryPolicy, RetryableError};

use async_trait::async_trait;
use serde_json::{Map, Value};

/// Schema-aware client for the destination project.
///
/// Every create/update call either returns the entity as stored by the
/// destination or fails with the rejection.
#[async_trait]
pub trait SchemaApi: Send + Sync {
    /// Locales configured on the destination project, in order
    async fn fetch_locales(&self) -> anyhow::Result<Vec<String>>;

    async fn create_plugin(&self, plugin: &Resource) -> anyhow::Result<Resource>;

    async fn update_plugin(&self, id: &str, attributes: Map<String, Value>) -> anyhow::Result<Resource>;

    async fn create_item_type(&self, item_type: &Resource) -> anyhow::Result<Resource>;

    async fn update_item_type(&self, item_type: &Resource) -> anyhow::Result<Resource>;

    async fn create_fieldset(&self, item_type_id: &str, fieldset: &Resource) -> anyhow::Result<Resource>;

    async fn update_fieldset(&self, id: &str, attributes: Map<String, Value>) -> anyhow::Result<Resource>;

    async fn create_field(&self, item_type_id: &str, field: &Resource) -> anyhow::Result<Resource>;

    async fn update_field(&self, id: &str, attributes: Map<String, Value>) -> anyhow::Result<Resource>;

    /// Start observing side effects of the calls that follow
    async fn open_change_feed(&self) -> anyhow::Result<()>;

    /// Stop observing side effects
    async fn close_change_feed(&self) -> anyhow::Result<()>;
}
