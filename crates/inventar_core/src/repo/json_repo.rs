//! JSON document implementation of the item repository (Variant B).
//!
//! # Responsibility
//! - Represent the whole dataset (items, custom values, object type catalog)
//!   as one serialized document.
//! - Commit every mutation with write-to-temp-then-rename so a crash
//!   mid-write never leaves a half-written file behind.
//!
//! # Invariants
//! - In-memory state is swapped only after the rename succeeded; a failed
//!   commit leaves file and memory on the previous state.
//! - `next_id` grows monotonically; ids are never reused after deletes.

use crate::model::item::{Item, ItemId, ItemRecord, DEFAULT_OBJECT_TYPES};
use crate::repo::item_repo::{sort_records, ItemFilter, ItemRepository, RepoError, RepoResult};
use log::info;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
struct Document {
    next_id: ItemId,
    items: Vec<ItemRecord>,
    object_types: Vec<String>,
}

impl Document {
    fn fresh() -> Self {
        Self {
            next_id: 1,
            items: Vec::new(),
            object_types: DEFAULT_OBJECT_TYPES
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
        }
    }

    fn register_object_type(&mut self, name: &str) {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return;
        }
        let known = self
            .object_types
            .iter()
            .any(|existing| existing.to_lowercase() == trimmed.to_lowercase());
        if !known {
            self.object_types.push(trimmed.to_string());
        }
    }

    /// Repairs documents written by older builds or edited by hand: the
    /// catalog must cover defaults and every referenced type, and `next_id`
    /// must stay ahead of every stored id.
    fn normalize(&mut self) {
        for name in DEFAULT_OBJECT_TYPES {
            self.register_object_type(name);
        }
        let referenced: Vec<String> = self
            .items
            .iter()
            .map(|record| record.item.object_type.clone())
            .collect();
        for name in referenced {
            self.register_object_type(&name);
        }

        let max_id = self.items.iter().map(|record| record.id).max().unwrap_or(0);
        self.next_id = self.next_id.max(max_id + 1).max(1);
    }
}

/// File-backed fallback repository holding the dataset in one JSON document.
#[derive(Debug)]
pub struct JsonItemRepository {
    path: PathBuf,
    document: Document,
}

impl JsonItemRepository {
    /// Loads the document at `path`, creating a seeded fresh one when the
    /// file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        let path = path.as_ref().to_path_buf();

        if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            let mut document: Document = serde_json::from_str(&text)?;
            document.normalize();
            info!(
                "event=json_open module=repo status=ok mode=load items={} path={}",
                document.items.len(),
                path.display()
            );
            return Ok(Self { path, document });
        }

        let mut repo = Self {
            path,
            document: Document::default(),
        };
        repo.commit(Document::fresh())?;
        info!(
            "event=json_open module=repo status=ok mode=fresh path={}",
            repo.path.display()
        );
        Ok(repo)
    }

    /// Writes `document` atomically and only then makes it current.
    fn commit(&mut self, document: Document) -> RepoResult<()> {
        let bytes = serde_json::to_vec_pretty(&document)?;

        // Temp file in the target directory so the rename stays on one
        // filesystem; scoped cleanup removes it on any failure path.
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|err| err.error)?;

        self.document = document;
        Ok(())
    }
}

impl ItemRepository for JsonItemRepository {
    fn create_item(&mut self, item: &Item) -> RepoResult<ItemId> {
        item.validate()?;

        let mut document = self.document.clone();
        let id = document.next_id;
        document.next_id += 1;
        document.register_object_type(&item.object_type);
        document.items.push(ItemRecord {
            id,
            item: item.clone(),
        });
        self.commit(document)?;

        Ok(id)
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<ItemRecord>> {
        Ok(self
            .document
            .items
            .iter()
            .find(|record| record.id == id)
            .cloned())
    }

    fn update_item(&mut self, id: ItemId, item: &Item) -> RepoResult<()> {
        item.validate()?;

        let mut document = self.document.clone();
        let record = document
            .items
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(RepoError::NotFound(id))?;
        record.item = item.clone();
        document.register_object_type(&item.object_type);
        self.commit(document)?;

        Ok(())
    }

    fn delete_item(&mut self, id: ItemId) -> RepoResult<()> {
        let mut document = self.document.clone();
        let before = document.items.len();
        document.items.retain(|record| record.id != id);
        if document.items.len() == before {
            // Absent id: idempotent no-op, nothing to rewrite.
            return Ok(());
        }
        self.commit(document)?;
        Ok(())
    }

    fn list_items(&self, filter: &ItemFilter) -> RepoResult<Vec<ItemRecord>> {
        let mut records: Vec<ItemRecord> = self
            .document
            .items
            .iter()
            .filter(|record| filter.matches(&record.item))
            .cloned()
            .collect();
        sort_records(&mut records);
        Ok(records)
    }

    fn list_object_types(&self) -> RepoResult<Vec<String>> {
        let mut names = self.document.object_types.clone();
        names.sort_by_key(|name| name.to_lowercase());
        Ok(names)
    }

    fn register_object_type(&mut self, name: &str) -> RepoResult<()> {
        let mut document = self.document.clone();
        let before = document.object_types.len();
        document.register_object_type(name);
        if document.object_types.len() == before {
            return Ok(());
        }
        self.commit(document)?;
        Ok(())
    }

    fn distinct_owners(&self) -> RepoResult<Vec<String>> {
        Ok(self.distinct_values(|item| item.current_owner.as_deref()))
    }

    fn distinct_manufacturers(&self) -> RepoResult<Vec<String>> {
        Ok(self.distinct_values(|item| Some(item.manufacturer.as_str())))
    }

    fn distinct_models(&self) -> RepoResult<Vec<String>> {
        Ok(self.distinct_values(|item| Some(item.model.as_str())))
    }

    fn distinct_serial_numbers(&self) -> RepoResult<Vec<String>> {
        Ok(self.distinct_values(|item| Some(item.serial_number.as_str())))
    }
}

impl JsonItemRepository {
    /// Distinct non-empty values of one fixed field, case-insensitively
    /// deduplicated with the first stored spelling preserved.
    fn distinct_values(&self, value_of: impl Fn(&Item) -> Option<&str>) -> Vec<String> {
        let mut values: Vec<String> = Vec::new();
        for record in &self.document.items {
            let Some(value) = value_of(&record.item) else {
                continue;
            };
            let trimmed = value.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !values
                .iter()
                .any(|known| known.to_lowercase() == trimmed.to_lowercase())
            {
                values.push(trimmed.to_string());
            }
        }
        values.sort_by_key(|value| value.to_lowercase());
        values
    }
}
