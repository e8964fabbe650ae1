//! Item repository contract shared by every storage variant.
//!
//! # Responsibility
//! - Define CRUD + catalog operations with identical semantics across
//!   backends.
//! - Provide the single filter predicate and ordering both variants use.
//!
//! # Invariants
//! - `create`/`update` persist fixed fields and custom values atomically.
//! - `delete` cascades custom values and is idempotent.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::item::{Item, ItemId, ItemRecord, ItemValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for item persistence and query operations.
///
/// The `Db`/`Io`/`Document` variants form the storage-fault family: the
/// medium itself was unreadable or unwritable.
#[derive(Debug)]
pub enum RepoError {
    Validation(ItemValidationError),
    Db(DbError),
    Io(std::io::Error),
    Document(serde_json::Error),
    NotFound(ItemId),
    InvalidData(String),
}

impl RepoError {
    /// Whether this error means the storage medium failed, as opposed to a
    /// caller mistake (validation, unknown id) or corrupt record data.
    pub fn is_storage_fault(&self) -> bool {
        matches!(self, Self::Db(_) | Self::Io(_) | Self::Document(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "storage i/o failure: {err}"),
            Self::Document(err) => write!(f, "storage document failure: {err}"),
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted item data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Document(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ItemValidationError> for RepoError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for RepoError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Document(value)
    }
}

/// Conjunction of case-insensitive substring matches over the fixed text
/// fields. Empty/`None` entries match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    pub object_type: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub current_owner: Option<String>,
}

impl ItemFilter {
    /// The one predicate both storage variants run, so list semantics can
    /// never diverge between them.
    pub fn matches(&self, item: &Item) -> bool {
        field_matches(self.object_type.as_deref(), &item.object_type)
            && field_matches(self.manufacturer.as_deref(), &item.manufacturer)
            && field_matches(self.model.as_deref(), &item.model)
            && field_matches(self.serial_number.as_deref(), &item.serial_number)
            && field_matches(
                self.current_owner.as_deref(),
                item.current_owner.as_deref().unwrap_or(""),
            )
    }
}

fn field_matches(needle: Option<&str>, value: &str) -> bool {
    match needle {
        None => true,
        Some(needle) if needle.trim().is_empty() => true,
        Some(needle) => value
            .to_lowercase()
            .contains(needle.trim().to_lowercase().as_str()),
    }
}

/// Stable display ordering shared by both variants: object type, then
/// manufacturer (case-folded), then id.
pub fn sort_records(records: &mut [ItemRecord]) {
    records.sort_by(|a, b| {
        let key_a = (
            a.item.object_type.to_lowercase(),
            a.item.manufacturer.to_lowercase(),
            a.id,
        );
        let key_b = (
            b.item.object_type.to_lowercase(),
            b.item.manufacturer.to_lowercase(),
            b.id,
        );
        key_a.cmp(&key_b)
    });
}

/// Storage contract implemented by the SQLite and JSON variants.
///
/// Object-safe so the facade can hold whichever variant initialization
/// selected behind one `Box<dyn ItemRepository + Send>`.
pub trait ItemRepository: Send {
    /// Persists a new item atomically and returns its fresh, never-reused id.
    /// The item's object type is auto-registered in the catalog.
    fn create_item(&mut self, item: &Item) -> RepoResult<ItemId>;

    /// Loads one record; `Ok(None)` for a well-formed but unknown id.
    fn get_item(&self, id: ItemId) -> RepoResult<Option<ItemRecord>>;

    /// Replaces all fixed fields and the full custom-value set atomically
    /// (clear-then-write). Fails with `RepoError::NotFound` for unknown ids.
    fn update_item(&mut self, id: ItemId, item: &Item) -> RepoResult<()>;

    /// Deletes the item and cascades its custom values. Idempotent.
    fn delete_item(&mut self, id: ItemId) -> RepoResult<()>;

    /// Returns all matching records, materialized and stably ordered.
    fn list_items(&self, filter: &ItemFilter) -> RepoResult<Vec<ItemRecord>>;

    /// Returns catalog entries sorted case-insensitively, case preserved.
    fn list_object_types(&self) -> RepoResult<Vec<String>>;

    /// Adds a catalog entry; case-insensitive duplicates and empty names are
    /// silently ignored.
    fn register_object_type(&mut self, name: &str) -> RepoResult<()>;

    /// Distinct non-empty owner values for selection widgets, sorted.
    fn distinct_owners(&self) -> RepoResult<Vec<String>>;

    /// Distinct non-empty manufacturer values, sorted like owners.
    fn distinct_manufacturers(&self) -> RepoResult<Vec<String>>;

    /// Distinct non-empty model values, sorted like owners.
    fn distinct_models(&self) -> RepoResult<Vec<String>>;

    /// Distinct non-empty serial numbers, sorted like owners.
    fn distinct_serial_numbers(&self) -> RepoResult<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::{sort_records, ItemFilter};
    use crate::model::item::{Item, ItemRecord};

    fn record(id: i64, object_type: &str, manufacturer: &str) -> ItemRecord {
        let mut item = Item::new(object_type);
        item.manufacturer = manufacturer.to_string();
        ItemRecord { id, item }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = ItemFilter::default();
        assert!(filter.matches(&Item::new("Laptop")));
    }

    #[test]
    fn filter_is_case_insensitive_substring_conjunction() {
        let mut item = Item::new("Laptop");
        item.manufacturer = "Lenovo".to_string();
        item.current_owner = Some("Meier".to_string());

        let mut filter = ItemFilter {
            manufacturer: Some("leno".to_string()),
            ..ItemFilter::default()
        };
        assert!(filter.matches(&item));

        filter.current_owner = Some("MEIER".to_string());
        assert!(filter.matches(&item));

        filter.object_type = Some("Monitor".to_string());
        assert!(!filter.matches(&item));
    }

    #[test]
    fn filter_on_owner_treats_missing_owner_as_empty() {
        let filter = ItemFilter {
            current_owner: Some("x".to_string()),
            ..ItemFilter::default()
        };
        assert!(!filter.matches(&Item::new("Laptop")));
    }

    #[test]
    fn sort_orders_by_type_manufacturer_then_id() {
        let mut records = vec![
            record(3, "monitor", "BenQ"),
            record(2, "Laptop", "lenovo"),
            record(1, "Laptop", "Dell"),
        ];
        sort_records(&mut records);
        let ids: Vec<_> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
