//! In-memory destination used for dry runs
//!
//! Echoes every payload back as if the destination accepted it and keeps the
//! calls in the order they were issued.

use super::models::{kinds, Resource};
use super::SchemaApi;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// One call received by a [`RecordingClient`]
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    CreatePlugin(Resource),
    UpdatePlugin { id: String, attributes: Map<String, Value> },
    CreateItemType(Resource),
    UpdateItemType(Resource),
    CreateFieldset { item_type_id: String, fieldset: Resource },
    UpdateFieldset { id: String, attributes: Map<String, Value> },
    CreateField { item_type_id: String, field: Resource },
    UpdateField { id: String, attributes: Map<String, Value> },
}

impl RecordedCall {
    /// Destination id of the entity this call touches
    pub fn entity_id(&self) -> &str {
        match self {
            RecordedCall::CreatePlugin(resource)
            | RecordedCall::CreateItemType(resource)
            | RecordedCall::UpdateItemType(resource) => &resource.id,
            RecordedCall::CreateFieldset { fieldset, .. } => &fieldset.id,
            RecordedCall::CreateField { field, .. } => &field.id,
            RecordedCall::UpdatePlugin { id, .. }
            | RecordedCall::UpdateFieldset { id, .. }
            | RecordedCall::UpdateField { id, .. } => id,
        }
    }

    /// One-line human readable form
    pub fn describe(&self) -> String {
        match self {
            RecordedCall::CreatePlugin(plugin) => format!("create plugin {}", plugin.id),
            RecordedCall::UpdatePlugin { id, .. } => format!("update plugin {} parameters", id),
            RecordedCall::CreateItemType(item_type) => format!(
                "create item type {} ({})",
                item_type.id,
                attribute_str(&item_type.attributes, "api_key")
            ),
            RecordedCall::UpdateItemType(item_type) => {
                format!("update item type {} relationships", item_type.id)
            }
            RecordedCall::CreateFieldset { item_type_id, fieldset } => format!(
                "create fieldset {} in {} ({})",
                fieldset.id,
                item_type_id,
                attribute_str(&fieldset.attributes, "title")
            ),
            RecordedCall::UpdateFieldset { id, attributes } => {
                format!("move fieldset {} to position {}", id, attribute_str(attributes, "position"))
            }
            RecordedCall::CreateField { item_type_id, field } => format!(
                "create field {} in {} ({}: {})",
                field.id,
                item_type_id,
                attribute_str(&field.attributes, "api_key"),
                attribute_str(&field.attributes, "field_type")
            ),
            RecordedCall::UpdateField { id, attributes } => {
                format!("move field {} to position {}", id, attribute_str(attributes, "position"))
            }
        }
    }
}

fn attribute_str(attributes: &Map<String, Value>, key: &str) -> String {
    match attributes.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "-".to_string(),
    }
}

/// Destination that accepts everything and remembers what it was asked to do
#[derive(Debug, Default)]
pub struct RecordingClient {
    locales: Vec<String>,
    calls: Mutex<Vec<RecordedCall>>,
    feed_open: AtomicBool,
    feed_sessions: AtomicUsize,
}

impl RecordingClient {
    pub fn new(locales: Vec<String>) -> Self {
        Self {
            locales,
            ..Self::default()
        }
    }

    /// All calls received so far, in issue order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Whether the change feed is currently open
    pub fn is_change_feed_open(&self) -> bool {
        self.feed_open.load(Ordering::SeqCst)
    }

    /// How many times the change feed has been opened
    pub fn change_feed_sessions(&self) -> usize {
        self.feed_sessions.load(Ordering::SeqCst)
    }

    async fn push(&self, call: RecordedCall) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
        // Every remote call is a suspension point
        tokio::task::yield_now().await;
    }
}

#[async_trait]
impl SchemaApi for RecordingClient {
    async fn fetch_locales(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.locales.clone())
    }

    async fn create_plugin(&self, plugin: &Resource) -> anyhow::Result<Resource> {
        self.push(RecordedCall::CreatePlugin(plugin.clone())).await;
        Ok(plugin.clone())
    }

    async fn update_plugin(&self, id: &str, attributes: Map<String, Value>) -> anyhow::Result<Resource> {
        self.push(RecordedCall::UpdatePlugin {
            id: id.to_string(),
            attributes: attributes.clone(),
        })
        .await;
        Ok(Resource::new(kinds::PLUGIN, id, attributes))
    }

    async fn create_item_type(&self, item_type: &Resource) -> anyhow::Result<Resource> {
        self.push(RecordedCall::CreateItemType(item_type.clone())).await;
        Ok(item_type.clone())
    }

    async fn update_item_type(&self, item_type: &Resource) -> anyhow::Result<Resource> {
        self.push(RecordedCall::UpdateItemType(item_type.clone())).await;
        Ok(item_type.clone())
    }

    async fn create_fieldset(&self, item_type_id: &str, fieldset: &Resource) -> anyhow::Result<Resource> {
        self.push(RecordedCall::CreateFieldset {
            item_type_id: item_type_id.to_string(),
            fieldset: fieldset.clone(),
        })
        .await;
        Ok(fieldset.clone())
    }

    async fn update_fieldset(&self, id: &str, attributes: Map<String, Value>) -> anyhow::Result<Resource> {
        self.push(RecordedCall::UpdateFieldset {
            id: id.to_string(),
            attributes: attributes.clone(),
        })
        .await;
        Ok(Resource::new(kinds::FIELDSET, id, attributes))
    }

    async fn create_field(&self, item_type_id: &str, field: &Resource) -> anyhow::Result<Resource> {
        self.push(RecordedCall::CreateField {
            item_type_id: item_type_id.to_string(),
            field: field.clone(),
        })
        .await;
        Ok(field.clone())
    }

    async fn update_field(&self, id: &str, attributes: Map<String, Value>) -> anyhow::Result<Resource> {
        self.push(RecordedCall::UpdateField {
            id: id.to_string(),
            attributes: attributes.clone(),
        })
        .await;
        Ok(Resource::new(kinds::FIELD, id, attributes))
    }

    async fn open_change_feed(&self) -> anyhow::Result<()> {
        if self.feed_open.swap(true, Ordering::SeqCst) {
            anyhow::bail!("Change feed is already open");
        }
        self.feed_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close_change_feed(&self) -> anyhow::Result<()> {
        if !self.feed_open.swap(false, Ordering::SeqCst) {
            anyhow::bail!("Change feed is not open");
        }
        Ok(())
    }
}
