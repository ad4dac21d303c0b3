//! Template registry — the authoritative index of live templates.
//!
//! Layout in the store:
//! - `"all_templates"` → JSON array of template ids, in creation order
//! - `"<template id>"` → the template record
//!
//! The index and a record are two independent keys. Create writes the
//! record first and the index second; delete edits the index first and
//! removes the record second. A fault between the two writes therefore
//! leaves either an unindexed record (invisible, harmless) or an indexed
//! id without a record (skipped by `list`).
//!
//! Index edits go through a compare-and-swap loop so concurrent creates
//! and deletes cannot drop each other's ids. Record writes stay
//! last-writer-wins.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use recurbot_core::error::{RecurbotError, Result};
use recurbot_core::traits::KvStore;
use recurbot_core::types::{IntervalUnit, NewTemplate, Template};
use serde_json::Value;

/// Store key of the template index.
pub const INDEX_KEY: &str = "all_templates";

const DEFAULT_NAME: &str = "Unnamed Template";
const DEFAULT_MESSAGE: &str = "No message content";
const DEFAULT_INTERVAL_VALUE: u64 = 24;
const MAX_INDEX_ATTEMPTS: usize = 16;
const MAX_ID_ATTEMPTS: usize = 64;

/// Create/list/delete over the key-value store.
#[derive(Clone)]
pub struct TemplateRegistry {
    store: Arc<dyn KvStore>,
}

impl TemplateRegistry {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Current index. A missing index is an empty one.
    pub async fn index(&self) -> Result<Vec<String>> {
        let raw = self.store.get(INDEX_KEY).await?;
        decode_index(raw.as_ref())
    }

    /// All live templates in index order.
    ///
    /// Ids whose record is missing are skipped silently.
    pub async fn list(&self) -> Result<Vec<Template>> {
        let ids = self.index().await?;
        let mut templates = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.get(id).await? {
                Some(t) => templates.push(t),
                None => tracing::debug!("Index entry '{id}' has no record, skipping"),
            }
        }
        Ok(templates)
    }

    /// Load one record by id, without consulting the index.
    pub async fn get(&self, id: &str) -> Result<Option<Template>> {
        self.store
            .get(id)
            .await?
            .map(|v| decode_template(id, v))
            .transpose()
    }

    /// Like `get`, but absence is `NotFound`.
    pub async fn require(&self, id: &str) -> Result<Template> {
        self.get(id)
            .await?
            .ok_or_else(|| RecurbotError::NotFound(format!("Template '{id}'")))
    }

    /// Create a template from raw form fields, defaulting anything missing.
    pub async fn create(&self, fields: NewTemplate, now: DateTime<Utc>) -> Result<Template> {
        let mut template = build_template(fields, now);

        // Claim the record key atomically; a clash on the time-based id
        // gets a numeric suffix.
        let base_id = template.id.clone();
        let mut claimed = false;
        for n in 0..MAX_ID_ATTEMPTS {
            if n > 0 {
                template.id = format!("{base_id}_{n}");
            }
            let record = serde_json::to_value(&template)?;
            if self.store.compare_and_swap(&template.id, None, record).await? {
                claimed = true;
                break;
            }
        }
        if !claimed {
            return Err(RecurbotError::Store(format!(
                "Could not allocate an id near '{base_id}'"
            )));
        }

        let id = template.id.clone();
        self.update_index(|ids| {
            if ids.contains(&id) {
                false
            } else {
                ids.push(id.clone());
                true
            }
        })
        .await?;

        tracing::info!("📝 Template created: '{}' ({})", template.name, template.id);
        Ok(template)
    }

    /// Remove a template. Unknown ids are a no-op.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.update_index(|ids| {
            let before = ids.len();
            ids.retain(|existing| existing != id);
            ids.len() != before
        })
        .await?;
        self.store.delete(id).await?;
        tracing::info!("🗑️ Template deleted: {id}");
        Ok(())
    }

    /// Overwrite the record at `template.id`. The index is untouched.
    pub async fn save(&self, template: &Template) -> Result<()> {
        self.store
            .put(&template.id, serde_json::to_value(template)?)
            .await
    }

    /// Read-modify-write of the index, retried when another writer got
    /// there first. `edit` returns whether it changed anything; unchanged
    /// indexes are not written back.
    async fn update_index<F>(&self, mut edit: F) -> Result<Vec<String>>
    where
        F: FnMut(&mut Vec<String>) -> bool + Send,
    {
        for attempt in 1..=MAX_INDEX_ATTEMPTS {
            let current = self.store.get(INDEX_KEY).await?;
            let mut ids = decode_index(current.as_ref())?;
            if !edit(&mut ids) {
                return Ok(ids);
            }
            let next = serde_json::to_value(&ids)?;
            if self
                .store
                .compare_and_swap(INDEX_KEY, current.as_ref(), next)
                .await?
            {
                return Ok(ids);
            }
            tracing::debug!("Template index changed concurrently, retry {attempt}");
        }
        Err(RecurbotError::Store(format!(
            "Template index update conflicted {MAX_INDEX_ATTEMPTS} times"
        )))
    }
}

fn decode_index(raw: Option<&Value>) -> Result<Vec<String>> {
    match raw {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| RecurbotError::Store(format!("Malformed template index: {e}"))),
    }
}

fn decode_template(id: &str, raw: Value) -> Result<Template> {
    serde_json::from_value(raw)
        .map_err(|e| RecurbotError::Store(format!("Malformed template '{id}': {e}")))
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.trim().is_empty())
}

/// Leading decimal digits of a form value: `"3abc"` is 3, `"2.5"` is 2.
fn leading_count(raw: &str) -> Option<u64> {
    let raw = raw.trim_start();
    let raw = raw.strip_prefix('+').unwrap_or(raw);
    let end = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    raw[..end].parse().ok()
}

/// Apply creation defaults to raw fields.
fn build_template(fields: NewTemplate, now: DateTime<Utc>) -> Template {
    let interval_value = fields
        .interval_value
        .as_deref()
        .and_then(leading_count)
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_INTERVAL_VALUE);
    let interval_unit = non_empty(fields.interval_unit)
        .map(IntervalUnit::from)
        .unwrap_or_default();

    Template {
        id: format!("template_{}", now.timestamp_millis()),
        name: non_empty(fields.name).unwrap_or_else(|| DEFAULT_NAME.to_string()),
        message: non_empty(fields.message).unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
        interval_value,
        interval_unit,
        include_image: fields.include_image.as_deref() == Some("true"),
        image_url: fields.image_url.unwrap_or_default(),
        created_at: now,
        last_sent_time: None,
    }
}
