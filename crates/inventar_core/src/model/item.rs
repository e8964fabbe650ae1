//! Inventory item domain model.
//!
//! # Responsibility
//! - Define the fixed item fields plus the open-ended custom-value map.
//! - Provide validation shared by the SQLite and JSON storage variants.
//!
//! # Invariants
//! - `object_type` must not be empty or whitespace-only.
//! - Custom field names are unique per item (map key) and never empty.
//! - The decommission marker is an application convenience, never a storage
//!   rule.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable identifier assigned by the active backend at creation time.
///
/// Ids are never reused, even after the record they belonged to is deleted.
pub type ItemId = i64;

/// Owner value used when equipment sits in storage rather than with a person.
pub const DEFAULT_OWNER: &str = "LAGER";

/// Marker appended to the notes of a decommissioned item by
/// [`Item::mark_decommissioned`].
pub const DECOMMISSIONED_MARKER: &str = "[STILLGELEGT]";

/// Object types seeded into a freshly created store.
pub const DEFAULT_OBJECT_TYPES: &[&str] = &[
    "Laptop",
    "Monitor",
    "Drucker",
    "Smartphone",
    "Dockingstation",
];

/// Validation failure raised before any storage I/O happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    EmptyObjectType,
    EmptyCustomFieldName,
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyObjectType => write!(f, "object type must not be empty"),
            Self::EmptyCustomFieldName => write!(f, "custom field name must not be empty"),
        }
    }
}

impl Error for ItemValidationError {}

/// One inventory record.
///
/// Fixed fields mirror the classic inventory sheet; anything beyond them goes
/// into `custom_values`, which extends an item without a schema change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    /// Classifying catalog value, e.g. "Laptop". Required.
    pub object_type: String,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    pub purchase_date: Option<NaiveDate>,
    pub assignment_date: Option<NaiveDate>,
    pub current_owner: Option<String>,
    pub notes: Option<String>,
    /// Taken out of service. Deletion stays permanent and separate.
    pub decommissioned: bool,
    /// Extensible (field name, value) attributes owned by this item.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_values: BTreeMap<String, String>,
}

impl Default for Item {
    fn default() -> Self {
        Self {
            object_type: String::new(),
            manufacturer: String::new(),
            model: String::new(),
            serial_number: String::new(),
            purchase_date: None,
            assignment_date: None,
            current_owner: None,
            notes: None,
            decommissioned: false,
            custom_values: BTreeMap::new(),
        }
    }
}

impl Item {
    /// Creates an item of the given object type with all other fields empty.
    pub fn new(object_type: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            ..Self::default()
        }
    }

    /// Checks the invariants every backend enforces before touching I/O.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.object_type.trim().is_empty() {
            return Err(ItemValidationError::EmptyObjectType);
        }
        if self.custom_values.keys().any(|name| name.trim().is_empty()) {
            return Err(ItemValidationError::EmptyCustomFieldName);
        }
        Ok(())
    }

    /// Returns the item to stock: the owner reverts to [`DEFAULT_OWNER`].
    pub fn clear_owner(&mut self) {
        self.current_owner = Some(DEFAULT_OWNER.to_string());
    }

    /// Sets the decommissioned flag and annotates the notes once with
    /// [`DECOMMISSIONED_MARKER`].
    ///
    /// Application-layer convenience; storage only persists whatever notes
    /// text it is handed.
    pub fn mark_decommissioned(&mut self) {
        self.decommissioned = true;
        let already_marked = self
            .notes
            .as_deref()
            .is_some_and(|notes| notes.contains(DECOMMISSIONED_MARKER));
        if already_marked {
            return;
        }
        self.notes = Some(match self.notes.take() {
            Some(notes) if !notes.trim().is_empty() => {
                format!("{notes} {DECOMMISSIONED_MARKER}")
            }
            _ => DECOMMISSIONED_MARKER.to_string(),
        });
    }
}

/// Read model returned by `get`/`list`: the stored item plus its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,
    #[serde(flatten)]
    pub item: Item,
}

#[cfg(test)]
mod tests {
    use super::{Item, ItemValidationError, DECOMMISSIONED_MARKER, DEFAULT_OWNER};

    #[test]
    fn validate_rejects_blank_object_type() {
        let item = Item::new("   ");
        assert_eq!(item.validate(), Err(ItemValidationError::EmptyObjectType));
    }

    #[test]
    fn validate_rejects_blank_custom_field_name() {
        let mut item = Item::new("Laptop");
        item.custom_values.insert(" ".to_string(), "x".to_string());
        assert_eq!(
            item.validate(),
            Err(ItemValidationError::EmptyCustomFieldName)
        );
    }

    #[test]
    fn clear_owner_reverts_to_the_stock_owner() {
        let mut item = Item::new("Laptop");
        item.current_owner = Some("Meier".to_string());
        item.clear_owner();
        assert_eq!(item.current_owner.as_deref(), Some(DEFAULT_OWNER));
    }

    #[test]
    fn mark_decommissioned_annotates_notes_once() {
        let mut item = Item::new("Laptop");
        item.notes = Some("defekt".to_string());
        item.mark_decommissioned();
        item.mark_decommissioned();

        assert!(item.decommissioned);
        let notes = item.notes.unwrap();
        assert_eq!(notes.matches(DECOMMISSIONED_MARKER).count(), 1);
        assert!(notes.starts_with("defekt"));
    }

    #[test]
    fn mark_decommissioned_sets_marker_on_empty_notes() {
        let mut item = Item::new("Monitor");
        item.mark_decommissioned();
        assert_eq!(item.notes.as_deref(), Some(DECOMMISSIONED_MARKER));
    }
}
