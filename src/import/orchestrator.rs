//! Phase sequencing of one import run
//!
//! 1. preflight: destination locales, identifier tables
//! 2. plugins
//! 3. item types
//! 4. per item type: fieldsets, then regular fields, then slug fields
//! 5. position updates, one at a time
//! 6. item type presentation fields
//!
//! Independent operations of a phase are awaited together; a phase starts
//! only once the previous one settled.

use super::editors::{BuiltinEditors, EditorCatalog};
use super::ids::{IdGenerator, RandomIdGenerator};
use super::payloads;
use super::positions::{self, PositionUpdate};
use super::progress::{Progress, ProgressTracker};
use super::remapper::{EntityClass, IdMappings};
use super::rewrite::{rewrite_field, RewriteContext};
use crate::api::SchemaApi;
use crate::schema::{FieldPayload, FieldsetPayload, ImportPlan, ItemTypeToCreate, PluginPayload};
use anyhow::{Context, Result};
use futures::future::join_all;
use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// What a successful run created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ImportReport {
    pub plugins: usize,
    pub item_types: usize,
    pub fieldsets: usize,
    pub fields: usize,
    pub position_updates: usize,
    pub progress: Progress,
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Plugins created:    {}", self.plugins)?;
        writeln!(f, "Item types created: {}", self.item_types)?;
        writeln!(f, "Fieldsets created:  {}", self.fieldsets)?;
        writeln!(f, "Fields created:     {}", self.fields)?;
        write!(
            f,
            "Positions updated:  {} ({}/{} operations)",
            self.position_updates, self.progress.finished, self.progress.total
        )
    }
}

/// Executes an [`ImportPlan`] against a destination
pub struct SchemaImporter<'c, C: SchemaApi + ?Sized> {
    client: &'c C,
    ids: Box<dyn IdGenerator>,
    editors: Box<dyn EditorCatalog>,
}

impl<'c, C: SchemaApi + ?Sized> SchemaImporter<'c, C> {
    pub fn new(client: &'c C) -> Self {
        Self {
            client,
            ids: Box::new(RandomIdGenerator),
            editors: Box::new(BuiltinEditors),
        }
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn with_editor_catalog(mut self, editors: impl EditorCatalog + 'static) -> Self {
        self.editors = Box::new(editors);
        self
    }

    /// Run every phase of `plan`. Fails on the first unrecovered error; the
    /// change feed is closed on every exit path.
    pub async fn run(&self, plan: &ImportPlan, on_progress: &(dyn Fn(Progress) + Send + Sync)) -> Result<ImportReport> {
        self.client
            .open_change_feed()
            .await
            .context("Failed to open the change feed")?;

        let result = self.execute(plan, on_progress).await;
        let closed = self.client.close_change_feed().await;

        match (result, closed) {
            (Ok(report), Ok(())) => Ok(report),
            (Ok(_), Err(e)) => Err(e.context("Failed to close the change feed")),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close)) => {
                warn!("Failed to close the change feed after a failed import: {:#}", close);
                Err(e)
            }
        }
    }

    async fn execute(&self, plan: &ImportPlan, on_progress: &(dyn Fn(Progress) + Send + Sync)) -> Result<ImportReport> {
        let summary = plan.summary();
        info!(
            "Starting schema import: {} item types ({} reused), {} plugins ({} reused)",
            summary.item_types_to_create,
            summary.item_types_to_reuse,
            summary.plugins_to_create,
            summary.plugins_to_reuse
        );

        let locales = self
            .client
            .fetch_locales()
            .await
            .context("Failed to fetch destination locales")?;
        debug!("Destination locales: {:?}", locales);

        let mappings = IdMappings::build(plan, self.ids.as_ref()).context("Failed to allocate destination ids")?;

        let tracker = ProgressTracker::new(on_progress);
        let context = RewriteContext {
            mappings: &mappings,
            locales: &locales,
            editors: self.editors.as_ref(),
        };

        let plugins = self.create_plugins(plan, &mappings, &tracker).await?;
        info!("Created {} plugins", plugins);

        let item_types = self.create_item_types(plan, &mappings, &tracker).await?;
        info!("Created {} item types", item_types);

        let (fieldsets, fields) = self.populate_item_types(plan, &context, &tracker).await?;
        info!("Created {} fieldsets and {} fields", fieldsets, fields);

        let position_updates = self.normalize_positions(plan, &mappings, &tracker).await?;
        info!("Applied {} position updates", position_updates);

        let finalized = self.finalize_item_types(plan, &mappings, &tracker).await?;
        info!("Linked presentation fields of {} item types", finalized);

        let report = ImportReport {
            plugins,
            item_types,
            fieldsets,
            fields,
            position_updates,
            progress: tracker.snapshot(),
        };
        info!("Schema import finished: {:?}", report);

        Ok(report)
    }

    async fn create_plugins(&self, plan: &ImportPlan, mappings: &IdMappings, tracker: &ProgressTracker<'_>) -> Result<usize> {
        let operations = plan
            .plugins
            .to_create
            .iter()
            .map(|plugin| self.create_plugin(plugin, mappings, tracker));

        let created = join_all(operations).await.into_iter().collect::<Result<Vec<_>>>()?;
        Ok(created.len())
    }

    async fn create_plugin(&self, plugin: &PluginPayload, mappings: &IdMappings, tracker: &ProgressTracker<'_>) -> Result<()> {
        let id = mappings.plugins.require(&plugin.id)?;
        let resource = payloads::plugin_resource(plugin, id);

        tracker
            .track(self.client.create_plugin(&resource))
            .await
            .with_context(|| {
                format!(
                    "Failed to create plugin {} ({})",
                    plugin.name().unwrap_or("unnamed"),
                    plugin.id
                )
            })?;
        debug!("Created plugin {} as {}", plugin.id, id);

        if let Some(parameters) = plugin.parameters() {
            let mut attributes = Map::new();
            attributes.insert("parameters".to_string(), Value::Object(parameters.clone()));

            // Parameters exported from older plugin versions may no longer validate
            if let Err(e) = tracker.track(self.client.update_plugin(id, attributes)).await {
                warn!("Ignoring rejected parameters of plugin {} ({}): {:#}", plugin.id, id, e);
            }
        }

        Ok(())
    }

    async fn create_item_types(&self, plan: &ImportPlan, mappings: &IdMappings, tracker: &ProgressTracker<'_>) -> Result<usize> {
        let operations = plan.item_types.to_create.iter().map(|item_type| async move {
            let id = mappings.item_types.require(&item_type.entity.id)?;
            let resource = payloads::item_type_resource(item_type, id);

            tracker
                .track(self.client.create_item_type(&resource))
                .await
                .with_context(|| format!("Failed to create item type {}", item_type.label()))?;
            debug!("Created item type {} as {}", item_type.label(), id);

            Ok::<(), anyhow::Error>(())
        });

        let created = join_all(operations).await.into_iter().collect::<Result<Vec<()>>>()?;
        Ok(created.len())
    }

    /// Fieldsets and fields of every item type, item types side by side.
    /// Returns (fieldsets, fields) created.
    async fn populate_item_types(
        &self,
        plan: &ImportPlan,
        context: &RewriteContext<'_>,
        tracker: &ProgressTracker<'_>,
    ) -> Result<(usize, usize)> {
        let operations = plan
            .item_types
            .to_create
            .iter()
            .map(|item_type| self.populate_item_type(item_type, context, tracker));

        let counts = join_all(operations).await.into_iter().collect::<Result<Vec<_>>>()?;
        Ok(counts
            .into_iter()
            .fold((0, 0), |(fieldsets, fields), (fs, f)| (fieldsets + fs, fields + f)))
    }

    async fn populate_item_type(
        &self,
        item_type: &ItemTypeToCreate,
        context: &RewriteContext<'_>,
        tracker: &ProgressTracker<'_>,
    ) -> Result<(usize, usize)> {
        let item_type_id = context.mappings.item_types.require(&item_type.entity.id)?;

        let fieldsets = join_all(
            item_type
                .fieldsets
                .iter()
                .map(|fieldset| self.create_fieldset(item_type_id, fieldset, context.mappings, tracker)),
        )
        .await
        .into_iter()
        .collect::<Result<Vec<()>>>()?;

        let regular = join_all(
            item_type
                .regular_fields()
                .map(|field| self.create_field(item_type_id, field, context, tracker)),
        )
        .await
        .into_iter()
        .collect::<Result<Vec<()>>>()?;

        // Slugs may point at a regular sibling through slug_title_field
        let slugs = join_all(
            item_type
                .slug_fields()
                .map(|field| self.create_field(item_type_id, field, context, tracker)),
        )
        .await
        .into_iter()
        .collect::<Result<Vec<()>>>()?;

        debug!(
            "Populated item type {}: {} fieldsets, {} fields, {} slugs",
            item_type.label(),
            fieldsets.len(),
            regular.len(),
            slugs.len()
        );

        Ok((fieldsets.len(), regular.len() + slugs.len()))
    }

    async fn create_fieldset(
        &self,
        item_type_id: &str,
        fieldset: &FieldsetPayload,
        mappings: &IdMappings,
        tracker: &ProgressTracker<'_>,
    ) -> Result<()> {
        let id = mappings.fieldsets.require(&fieldset.id)?;
        let resource = payloads::fieldset_resource(fieldset, id)?;

        tracker
            .track(self.client.create_fieldset(item_type_id, &resource))
            .await
            .with_context(|| {
                format!(
                    "Failed to create fieldset {} ({}) in item type {}",
                    fieldset.title().unwrap_or("untitled"),
                    fieldset.id,
                    item_type_id
                )
            })?;
        debug!("Created fieldset {} as {}", fieldset.id, id);

        Ok(())
    }

    async fn create_field(
        &self,
        item_type_id: &str,
        source: &FieldPayload,
        context: &RewriteContext<'_>,
        tracker: &ProgressTracker<'_>,
    ) -> Result<()> {
        let label = source.api_key().unwrap_or("unnamed");

        let resource = match rewrite_field(source, context).and_then(|field| field.to_resource()) {
            Ok(resource) => resource,
            Err(e) => {
                error!(
                    "Failed to prepare field {} ({}): {:#}\n{}",
                    label,
                    source.id,
                    e,
                    pretty(source)
                );
                return Err(e.context(format!("Failed to prepare field {} ({})", label, source.id)));
            }
        };

        if let Err(e) = tracker.track(self.client.create_field(item_type_id, &resource)).await {
            error!(
                "Failed to create field {} ({}) in item type {}: {:#}\n{}",
                label,
                source.id,
                item_type_id,
                e,
                pretty(&resource)
            );
            return Err(e.context(format!("Failed to create field {} ({})", label, source.id)));
        }
        debug!("Created field {} as {}", source.id, resource.id);

        Ok(())
    }

    /// Strictly one update at a time across the whole run
    async fn normalize_positions(&self, plan: &ImportPlan, mappings: &IdMappings, tracker: &ProgressTracker<'_>) -> Result<usize> {
        let mut applied = 0;

        for item_type in &plan.item_types.to_create {
            let updates = positions::position_updates(item_type, mappings)?;
            for update in updates {
                self.apply_position(&update, tracker).await.with_context(|| {
                    format!(
                        "Failed to move {} {} of item type {} to position {}",
                        update.class,
                        update.id,
                        item_type.label(),
                        update.position
                    )
                })?;
                applied += 1;
            }
        }

        Ok(applied)
    }

    async fn apply_position(&self, update: &PositionUpdate, tracker: &ProgressTracker<'_>) -> Result<()> {
        let attributes = update.attributes();
        match update.class {
            EntityClass::Fieldset => tracker.track(self.client.update_fieldset(&update.id, attributes)).await?,
            _ => tracker.track(self.client.update_field(&update.id, attributes)).await?,
        };
        Ok(())
    }

    async fn finalize_item_types(&self, plan: &ImportPlan, mappings: &IdMappings, tracker: &ProgressTracker<'_>) -> Result<usize> {
        let mut updates = Vec::new();
        for item_type in &plan.item_types.to_create {
            if let Some(resource) = payloads::item_type_finalization(item_type, mappings)? {
                updates.push((item_type, resource));
            }
        }

        let operations = updates.iter().map(|(item_type, resource)| async move {
            tracker
                .track(self.client.update_item_type(resource))
                .await
                .with_context(|| format!("Failed to link presentation fields of item type {}", item_type.label()))
        });

        let updated = join_all(operations).await.into_iter().collect::<Result<Vec<_>>>()?;
        Ok(updated.len())
    }
}

/// Run `plan` against `client` with the default id generator and editor catalog
pub async fn import_schema<C: SchemaApi + ?Sized>(
    plan: &ImportPlan,
    client: &C,
    on_progress: &(dyn Fn(Progress) + Send + Sync),
) -> Result<ImportReport> {
    SchemaImporter::new(client).run(plan, on_progress).await
}

fn pretty<T: Serialize + fmt::Debug>(payload: &T) -> String {
    serde_json::to_string_pretty(payload).unwrap_or_else(|_| format!("{:?}", payload))
}
