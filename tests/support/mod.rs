//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use schema_import::api::{RecordedCall, RecordingClient, Resource, SchemaApi};
use schema_import::import::Progress;
use schema_import::schema::ImportPlan;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

type Rejection = Box<dyn Fn(&RecordedCall) -> bool + Send + Sync>;

/// Recording destination that rejects selected calls
pub struct FlakyClient {
    pub inner: RecordingClient,
    rejects: Rejection,
    fail_close: bool,
}

impl FlakyClient {
    pub fn new(locales: &[&str]) -> Self {
        Self {
            inner: RecordingClient::new(locales.iter().map(|l| l.to_string()).collect()),
            rejects: Box::new(|_| false),
            fail_close: false,
        }
    }

    /// Reject every call matching `predicate` after recording it
    pub fn rejecting(mut self, predicate: impl Fn(&RecordedCall) -> bool + Send + Sync + 'static) -> Self {
        self.rejects = Box::new(predicate);
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    fn check(&self, call: RecordedCall) -> anyhow::Result<()> {
        if (self.rejects)(&call) {
            anyhow::bail!("422 Unprocessable Entity: {}", call.describe());
        }
        Ok(())
    }
}

#[async_trait]
impl SchemaApi for FlakyClient {
    async fn fetch_locales(&self) -> anyhow::Result<Vec<String>> {
        self.inner.fetch_locales().await
    }

    async fn create_plugin(&self, plugin: &Resource) -> anyhow::Result<Resource> {
        let created = self.inner.create_plugin(plugin).await?;
        self.check(RecordedCall::CreatePlugin(plugin.clone()))?;
        Ok(created)
    }

    async fn update_plugin(&self, id: &str, attributes: Map<String, Value>) -> anyhow::Result<Resource> {
        let updated = self.inner.update_plugin(id, attributes.clone()).await?;
        self.check(RecordedCall::UpdatePlugin {
            id: id.to_string(),
            attributes,
        })?;
        Ok(updated)
    }

    async fn create_item_type(&self, item_type: &Resource) -> anyhow::Result<Resource> {
        let created = self.inner.create_item_type(item_type).await?;
        self.check(RecordedCall::CreateItemType(item_type.clone()))?;
        Ok(created)
    }

    async fn update_item_type(&self, item_type: &Resource) -> anyhow::Result<Resource> {
        let updated = self.inner.update_item_type(item_type).await?;
        self.check(RecordedCall::UpdateItemType(item_type.clone()))?;
        Ok(updated)
    }

    async fn create_fieldset(&self, item_type_id: &str, fieldset: &Resource) -> anyhow::Result<Resource> {
        let created = self.inner.create_fieldset(item_type_id, fieldset).await?;
        self.check(RecordedCall::CreateFieldset {
            item_type_id: item_type_id.to_string(),
            fieldset: fieldset.clone(),
        })?;
        Ok(created)
    }

    async fn update_fieldset(&self, id: &str, attributes: Map<String, Value>) -> anyhow::Result<Resource> {
        let updated = self.inner.update_fieldset(id, attributes.clone()).await?;
        self.check(RecordedCall::UpdateFieldset {
            id: id.to_string(),
            attributes,
        })?;
        Ok(updated)
    }

    async fn create_field(&self, item_type_id: &str, field: &Resource) -> anyhow::Result<Resource> {
        let created = self.inner.create_field(item_type_id, field).await?;
        self.check(RecordedCall::CreateField {
            item_type_id: item_type_id.to_string(),
            field: field.clone(),
        })?;
        Ok(created)
    }

    async fn update_field(&self, id: &str, attributes: Map<String, Value>) -> anyhow::Result<Resource> {
        let updated = self.inner.update_field(id, attributes.clone()).await?;
        self.check(RecordedCall::UpdateField {
            id: id.to_string(),
            attributes,
        })?;
        Ok(updated)
    }

    async fn open_change_feed(&self) -> anyhow::Result<()> {
        self.inner.open_change_feed().await
    }

    async fn close_change_feed(&self) -> anyhow::Result<()> {
        self.inner.close_change_feed().await?;
        if self.fail_close {
            anyhow::bail!("Change feed connection dropped");
        }
        Ok(())
    }
}

/// Progress sink that keeps every snapshot
#[derive(Clone, Default)]
pub struct ProgressLog(Arc<Mutex<Vec<Progress>>>);

impl ProgressLog {
    pub fn sink(&self) -> impl Fn(Progress) + Send + Sync + 'static {
        let log = self.0.clone();
        move |progress| log.lock().unwrap().push(progress)
    }

    pub fn snapshots(&self) -> Vec<Progress> {
        self.0.lock().unwrap().clone()
    }
}

pub fn plan(value: Value) -> ImportPlan {
    ImportPlan::from_json(&value.to_string()).unwrap()
}

/// Created fields in call order
pub fn created_fields(calls: &[RecordedCall]) -> Vec<(String, Resource)> {
    calls
        .iter()
        .filter_map(|call| match call {
            RecordedCall::CreateField { item_type_id, field } => Some((item_type_id.clone(), field.clone())),
            _ => None,
        })
        .collect()
}

/// Destination id of the created item type with `api_key`
pub fn item_type_id(calls: &[RecordedCall], api_key: &str) -> String {
    calls
        .iter()
        .find_map(|call| match call {
            RecordedCall::CreateItemType(item_type) if item_type.attributes["api_key"] == api_key => {
                Some(item_type.id.clone())
            }
            _ => None,
        })
        .unwrap_or_else(|| panic!("item type {} was not created", api_key))
}

/// Created field with `api_key`, with its position in the call log
pub fn field(calls: &[RecordedCall], api_key: &str) -> (usize, Resource) {
    calls
        .iter()
        .enumerate()
        .find_map(|(index, call)| match call {
            RecordedCall::CreateField { field, .. } if field.attributes["api_key"] == api_key => {
                Some((index, field.clone()))
            }
            _ => None,
        })
        .unwrap_or_else(|| panic!("field {} was not created", api_key))
}
