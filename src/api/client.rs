use super::constants::{self, headers};
use super::models::{Document, Resource};
use super::resilience::{RetryConfig, RetryPolicy};
use super::SchemaApi;
use crate::config::{EnvironmentConfig, Settings};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use reqwest::Method;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A side effect observed while the change feed was open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub action: &'static str,
    pub kind: String,
    pub id: String,
    pub at: DateTime<Utc>,
}

/// Content-management API client with connection pooling
#[derive(Clone)]
pub struct CmaClient {
    base_url: String,
    http_client: reqwest::Client,
    api_token: String,
    sandbox: Option<String>,
    retry_policy: RetryPolicy,
    // None while the change feed is closed
    change_log: Arc<Mutex<Option<Vec<ChangeEvent>>>>,
}

impl CmaClient {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> anyhow::Result<Self> {
        Self::with_timeout(base_url, api_token, Duration::from_secs(60))
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent("schema-import/0.1")
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.into(),
            http_client,
            api_token: api_token.into(),
            sandbox: None,
            retry_policy: RetryPolicy::default(),
            change_log: Arc::new(Mutex::new(None)),
        })
    }

    /// Build a client for a configured environment
    pub fn from_environment(environment: &EnvironmentConfig, settings: &Settings) -> anyhow::Result<Self> {
        let client = Self::with_timeout(
            environment.base_url.clone(),
            environment.api_token.clone(),
            Duration::from_secs(settings.request_timeout_secs),
        )?
        .with_sandbox(environment.sandbox.clone())
        .with_retry_config(RetryConfig::with_max_attempts(settings.max_retries));

        Ok(client)
    }

    /// Target a sandbox environment instead of the primary one
    pub fn with_sandbox(mut self, sandbox: Option<String>) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_policy = RetryPolicy::new(config);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Side effects recorded since the change feed was opened
    pub fn recorded_changes(&self) -> Vec<ChangeEvent> {
        let log = self.change_log.lock().unwrap_or_else(|e| e.into_inner());
        log.clone().unwrap_or_default()
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .http_client
            .request(method, url)
            .bearer_auth(&self.api_token)
            .header(reqwest::header::ACCEPT, headers::ACCEPT_JSON)
            .header(headers::API_VERSION, constants::API_VERSION);

        if let Some(sandbox) = &self.sandbox {
            builder = builder.header(headers::ENVIRONMENT, sandbox);
        }

        builder
    }

    /// Send a JSON:API request and decode the single resource it returns
    async fn send_document(&self, method: Method, url: String, body: Option<Value>) -> anyhow::Result<Resource> {
        debug!("{} {}", method, url);

        let body = body.map(|b| b.to_string());
        let response = self
            .retry_policy
            .send(&method, || {
                let mut request = self.request(method.clone(), &url);
                if let Some(body) = &body {
                    request = request
                        .header(reqwest::header::CONTENT_TYPE, headers::CONTENT_TYPE_JSON_API)
                        .body(body.clone());
                }
                request.send()
            })
            .await
            .with_context(|| format!("{} {} could not be sent", method, url))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body of {} {}", method, url))?;

        if !status.is_success() {
            anyhow::bail!("{} {} was rejected with {}: {}", method, url, status, text);
        }

        let document: Document = serde_json::from_str(&text)
            .with_context(|| format!("Unexpected response shape from {} {}", method, url))?;

        Ok(document.data)
    }

    fn record(&self, action: &'static str, resource: &Resource) {
        let mut log = self.change_log.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(events) = log.as_mut() {
            events.push(ChangeEvent {
                action,
                kind: resource.kind.clone(),
                id: resource.id.clone(),
                at: Utc::now(),
            });
        }
    }

    async fn create(&self, url: String, resource: &Resource) -> anyhow::Result<Resource> {
        let body = resource.clone().into_document();
        let created = self.send_document(Method::POST, url, Some(body)).await?;
        self.record("create", &created);
        Ok(created)
    }

    async fn update(&self, url: String, resource: Resource) -> anyhow::Result<Resource> {
        let updated = self
            .send_document(Method::PUT, url, Some(resource.into_document()))
            .await?;
        self.record("update", &updated);
        Ok(updated)
    }
}

#[async_trait]
impl SchemaApi for CmaClient {
    async fn fetch_locales(&self) -> anyhow::Result<Vec<String>> {
        let site = self
            .send_document(Method::GET, constants::site_endpoint(&self.base_url), None)
            .await?;

        parse_locales(&site.attributes)
    }

    async fn create_plugin(&self, plugin: &Resource) -> anyhow::Result<Resource> {
        self.create(constants::plugins_endpoint(&self.base_url), plugin).await
    }

    async fn update_plugin(&self, id: &str, attributes: Map<String, Value>) -> anyhow::Result<Resource> {
        let resource = Resource::new(super::models::kinds::PLUGIN, id, attributes);
        self.update(constants::plugin_endpoint(&self.base_url, id), resource)
            .await
    }

    async fn create_item_type(&self, item_type: &Resource) -> anyhow::Result<Resource> {
        self.create(constants::item_types_endpoint(&self.base_url), item_type)
            .await
    }

    async fn update_item_type(&self, item_type: &Resource) -> anyhow::Result<Resource> {
        self.update(
            constants::item_type_endpoint(&self.base_url, &item_type.id),
            item_type.clone(),
        )
        .await
    }

    async fn create_fieldset(&self, item_type_id: &str, fieldset: &Resource) -> anyhow::Result<Resource> {
        self.create(
            constants::item_type_fieldsets_endpoint(&self.base_url, item_type_id),
            fieldset,
        )
        .await
    }

    async fn update_fieldset(&self, id: &str, attributes: Map<String, Value>) -> anyhow::Result<Resource> {
        let resource = Resource::new(super::models::kinds::FIELDSET, id, attributes);
        self.update(constants::fieldset_endpoint(&self.base_url, id), resource)
            .await
    }

    async fn create_field(&self, item_type_id: &str, field: &Resource) -> anyhow::Result<Resource> {
        self.create(
            constants::item_type_fields_endpoint(&self.base_url, item_type_id),
            field,
        )
        .await
    }

    async fn update_field(&self, id: &str, attributes: Map<String, Value>) -> anyhow::Result<Resource> {
        let resource = Resource::new(super::models::kinds::FIELD, id, attributes);
        self.update(constants::field_endpoint(&self.base_url, id), resource)
            .await
    }

    async fn open_change_feed(&self) -> anyhow::Result<()> {
        let mut log = self.change_log.lock().unwrap_or_else(|e| e.into_inner());
        if log.is_some() {
            anyhow::bail!("Change feed is already open");
        }
        *log = Some(Vec::new());
        debug!("Change feed opened");
        Ok(())
    }

    async fn close_change_feed(&self) -> anyhow::Result<()> {
        let mut log = self.change_log.lock().unwrap_or_else(|e| e.into_inner());
        match log.take() {
            Some(events) => {
                match (events.first(), events.last()) {
                    (Some(first), Some(last)) => info!(
                        "Change feed closed after {} side effects between {} and {}",
                        events.len(),
                        first.at.to_rfc3339(),
                        last.at.to_rfc3339()
                    ),
                    _ => info!("Change feed closed without side effects"),
                }
                Ok(())
            }
            None => anyhow::bail!("Change feed is not open"),
        }
    }
}

/// Extract the locale list from the project settings attributes
fn parse_locales(attributes: &Map<String, Value>) -> anyhow::Result<Vec<String>> {
    let locales = attributes
        .get("locales")
        .and_then(Value::as_array)
        .context("Project settings carry no locale list")?;

    locales
        .iter()
        .map(|locale| {
            locale
                .as_str()
                .map(str::to_string)
                .with_context(|| format!("Invalid locale entry: {}", locale))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_locales() {
        let attributes = json!({ "locales": ["en", "it", "de-AT"] });
        let locales = parse_locales(attributes.as_object().unwrap()).unwrap();
        assert_eq!(locales, vec!["en", "it", "de-AT"]);
    }

    #[test]
    fn test_parse_locales_rejects_missing_list() {
        let attributes = json!({ "name": "Blog" });
        assert!(parse_locales(attributes.as_object().unwrap()).is_err());
    }

    #[tokio::test]
    async fn test_change_feed_records_only_while_open() {
        let client = CmaClient::new("https://api.example.com", "token").unwrap();
        let created = Resource::new("field", "f1", Map::new());

        client.record("create", &created);
        assert!(client.recorded_changes().is_empty());

        client.open_change_feed().await.unwrap();
        assert!(client.open_change_feed().await.is_err());
        client.record("create", &created);
        let changes = client.recorded_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].action, "create");
        assert_eq!(changes[0].kind, "field");
        assert_eq!(changes[0].id, "f1");

        client.close_change_feed().await.unwrap();
        assert!(client.recorded_changes().is_empty());
        assert!(client.close_change_feed().await.is_err());
    }
}
