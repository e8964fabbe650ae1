//! Process-wide repository access point with startup failover.
//!
//! # Responsibility
//! - Select and initialize a storage variant once per facade instance.
//! - Serialize access so at most one mutation is in flight at a time.
//!
//! # Invariants
//! - Fallback to the JSON variant happens only while opening; a storage
//!   fault during later operations is surfaced, never silently retried
//!   against the other variant (that would split the dataset).
//! - The active backend is explicit instance state, queryable by callers,
//!   and never swapped for the facade lifetime.

use crate::model::item::{Item, ItemId, ItemRecord};
use crate::repo::item_repo::{ItemFilter, ItemRepository, RepoResult};
use crate::repo::json_repo::JsonItemRepository;
use crate::repo::sqlite_repo::SqliteItemRepository;
use log::{info, warn};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Which storage variant the facade selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Sqlite,
    Json,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Single access point over the active storage variant.
///
/// A plain `Mutex` is the whole concurrency discipline: one in-flight
/// mutation, readers see pre- or post-state only, and there is no nested
/// locking anywhere below.
pub struct RepositoryFacade {
    backend: Mutex<Box<dyn ItemRepository>>,
    kind: BackendKind,
}

impl RepositoryFacade {
    /// Opens the SQLite variant, falling back to the JSON variant when the
    /// relational store cannot be opened.
    ///
    /// Only open-time storage faults trigger the fallback.
    pub fn open(db_path: impl AsRef<Path>, json_path: impl AsRef<Path>) -> RepoResult<Self> {
        match SqliteItemRepository::open(db_path.as_ref()) {
            Ok(repo) => {
                info!(
                    "event=repo_open module=facade status=ok backend=sqlite path={}",
                    db_path.as_ref().display()
                );
                Ok(Self::with_backend(Box::new(repo), BackendKind::Sqlite))
            }
            Err(err) => {
                warn!(
                    "event=repo_fallback module=facade status=degraded backend=json reason={err}"
                );
                let repo = JsonItemRepository::open(json_path.as_ref())?;
                Ok(Self::with_backend(Box::new(repo), BackendKind::Json))
            }
        }
    }

    /// Wraps an already-constructed backend; used by tests to pin a variant.
    pub fn with_backend(backend: Box<dyn ItemRepository>, kind: BackendKind) -> Self {
        Self {
            backend: Mutex::new(backend),
            kind,
        }
    }

    /// Which variant this facade selected at startup.
    pub fn backend_kind(&self) -> BackendKind {
        self.kind
    }

    fn backend(&self) -> MutexGuard<'_, Box<dyn ItemRepository>> {
        // A poisoned lock means a panic mid-operation; every backend call is
        // atomic per call, so the inner state is still consistent.
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create_item(&self, item: &Item) -> RepoResult<ItemId> {
        self.backend().create_item(item)
    }

    pub fn get_item(&self, id: ItemId) -> RepoResult<Option<ItemRecord>> {
        self.backend().get_item(id)
    }

    pub fn update_item(&self, id: ItemId, item: &Item) -> RepoResult<()> {
        self.backend().update_item(id, item)
    }

    pub fn delete_item(&self, id: ItemId) -> RepoResult<()> {
        self.backend().delete_item(id)
    }

    pub fn list_items(&self, filter: &ItemFilter) -> RepoResult<Vec<ItemRecord>> {
        self.backend().list_items(filter)
    }

    pub fn list_object_types(&self) -> RepoResult<Vec<String>> {
        self.backend().list_object_types()
    }

    pub fn register_object_type(&self, name: &str) -> RepoResult<()> {
        self.backend().register_object_type(name)
    }

    pub fn distinct_owners(&self) -> RepoResult<Vec<String>> {
        self.backend().distinct_owners()
    }

    pub fn distinct_manufacturers(&self) -> RepoResult<Vec<String>> {
        self.backend().distinct_manufacturers()
    }

    pub fn distinct_models(&self) -> RepoResult<Vec<String>> {
        self.backend().distinct_models()
    }

    pub fn distinct_serial_numbers(&self) -> RepoResult<Vec<String>> {
        self.backend().distinct_serial_numbers()
    }
}
