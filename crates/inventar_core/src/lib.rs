//! Persistence and import-reconciliation core of the inventory manager.
//! This crate is the single source of truth for the storage contract and
//! the import pipeline; UI layers consume it and add nothing below it.

pub mod db;
pub mod import;
pub mod logging;
pub mod model;
pub mod repo;

pub use import::batch::{import_csv_file, import_table, BatchProgress, BatchWriter, ImportSummary};
pub use import::reconciler::{reconcile, CandidateRow, Reconciled, RowError, RowFault};
pub use import::table::{read_csv_table, Cell, ImportTable};
pub use import::worker::{spawn_import, ImportEvent, ImportWorker};
pub use import::ImportError;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::item::{
    Item, ItemId, ItemRecord, ItemValidationError, DECOMMISSIONED_MARKER, DEFAULT_OBJECT_TYPES,
    DEFAULT_OWNER,
};
pub use repo::facade::{BackendKind, RepositoryFacade};
pub use repo::item_repo::{ItemFilter, ItemRepository, RepoError, RepoResult};
pub use repo::json_repo::JsonItemRepository;
pub use repo::sqlite_repo::SqliteItemRepository;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
