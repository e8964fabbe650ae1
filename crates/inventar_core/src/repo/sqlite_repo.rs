//! SQLite implementation of the item repository (Variant A).
//!
//! # Responsibility
//! - Map the fixed item fields to `items` and custom values to
//!   `custom_fields`, keyed by item id.
//! - Keep every mutation inside one IMMEDIATE transaction so readers only
//!   ever observe pre- or post-states.
//!
//! # Invariants
//! - `create`/`update` span `items`, `custom_fields` and `object_types`
//!   atomically; update uses clear-then-write for the custom-value set.
//! - Ids come from `AUTOINCREMENT` and are never reused.

use crate::db::{self, migrations};
use crate::model::item::{Item, ItemId, ItemRecord, DEFAULT_OBJECT_TYPES};
use crate::repo::item_repo::{sort_records, ItemFilter, ItemRepository, RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeMap;
use std::path::Path;

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    object_type,
    manufacturer,
    model,
    serial_number,
    purchase_date,
    assignment_date,
    current_owner,
    notes,
    decommissioned
FROM items";

const ITEM_INSERT_SQL: &str = "INSERT INTO items (
    object_type,
    manufacturer,
    model,
    serial_number,
    purchase_date,
    assignment_date,
    current_owner,
    notes,
    decommissioned
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);";

const ITEM_UPDATE_SQL: &str = "UPDATE items SET
    object_type = ?1,
    manufacturer = ?2,
    model = ?3,
    serial_number = ?4,
    purchase_date = ?5,
    assignment_date = ?6,
    current_owner = ?7,
    notes = ?8,
    decommissioned = ?9
WHERE id = ?10;";

/// SQLite-backed item repository owning its connection.
pub struct SqliteItemRepository {
    conn: Connection,
}

impl SqliteItemRepository {
    /// Opens (or creates) the database file, migrates it and seeds the
    /// default object type catalog.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        let conn = db::open_db(path)?;
        Self::from_connection(conn)
    }

    /// In-memory variant used by tests.
    pub fn open_in_memory() -> RepoResult<Self> {
        let conn = db::open_db_in_memory()?;
        Self::from_connection(conn)
    }

    /// Wraps an already-migrated connection after a readiness check.
    pub fn from_connection(conn: Connection) -> RepoResult<Self> {
        ensure_connection_ready(&conn)?;
        let repo = Self { conn };
        repo.seed_default_object_types()?;
        Ok(repo)
    }

    fn seed_default_object_types(&self) -> RepoResult<()> {
        for name in DEFAULT_OBJECT_TYPES {
            store_object_type(&self.conn, name)?;
        }
        Ok(())
    }
}

impl ItemRepository for SqliteItemRepository {
    fn create_item(&mut self, item: &Item) -> RepoResult<ItemId> {
        item.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        store_object_type(&tx, &item.object_type)?;
        tx.execute(
            ITEM_INSERT_SQL,
            params![
                item.object_type.as_str(),
                item.manufacturer.as_str(),
                item.model.as_str(),
                item.serial_number.as_str(),
                item.purchase_date.map(date_to_db),
                item.assignment_date.map(date_to_db),
                item.current_owner.as_deref(),
                item.notes.as_deref(),
                i64::from(item.decommissioned),
            ],
        )?;
        let id = tx.last_insert_rowid();
        insert_custom_values(&tx, id, &item.custom_values)?;
        tx.commit()?;

        Ok(id)
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<ItemRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;

        if let Some(row) = rows.next()? {
            let mut record = parse_item_row(row)?;
            record.item.custom_values = load_custom_values(&self.conn, record.id)?;
            return Ok(Some(record));
        }

        Ok(None)
    }

    fn update_item(&mut self, id: ItemId, item: &Item) -> RepoResult<()> {
        item.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            ITEM_UPDATE_SQL,
            params![
                item.object_type.as_str(),
                item.manufacturer.as_str(),
                item.model.as_str(),
                item.serial_number.as_str(),
                item.purchase_date.map(date_to_db),
                item.assignment_date.map(date_to_db),
                item.current_owner.as_deref(),
                item.notes.as_deref(),
                i64::from(item.decommissioned),
                id,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        store_object_type(&tx, &item.object_type)?;
        tx.execute("DELETE FROM custom_fields WHERE item_id = ?1;", [id])?;
        insert_custom_values(&tx, id, &item.custom_values)?;
        tx.commit()?;

        Ok(())
    }

    fn delete_item(&mut self, id: ItemId) -> RepoResult<()> {
        // FK cascade removes the custom_fields rows. Deleting an absent id
        // is not an error.
        self.conn.execute("DELETE FROM items WHERE id = ?1;", [id])?;
        Ok(())
    }

    fn list_items(&self, filter: &ItemFilter) -> RepoResult<Vec<ItemRecord>> {
        let mut stmt = self.conn.prepare(&format!("{ITEM_SELECT_SQL};"))?;
        let mut rows = stmt.query([])?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = parse_item_row(row)?;
            if !filter.matches(&record.item) {
                continue;
            }
            record.item.custom_values = load_custom_values(&self.conn, record.id)?;
            records.push(record);
        }

        sort_records(&mut records);
        Ok(records)
    }

    fn list_object_types(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM object_types ORDER BY name COLLATE NOCASE;")?;
        let mut rows = stmt.query([])?;
        let mut names = Vec::new();
        while let Some(row) = rows.next()? {
            names.push(row.get::<_, String>(0)?);
        }
        Ok(names)
    }

    fn register_object_type(&mut self, name: &str) -> RepoResult<()> {
        store_object_type(&self.conn, name)
    }

    fn distinct_owners(&self) -> RepoResult<Vec<String>> {
        distinct_column_values(&self.conn, "current_owner")
    }

    fn distinct_manufacturers(&self) -> RepoResult<Vec<String>> {
        distinct_column_values(&self.conn, "manufacturer")
    }

    fn distinct_models(&self) -> RepoResult<Vec<String>> {
        distinct_column_values(&self.conn, "model")
    }

    fn distinct_serial_numbers(&self) -> RepoResult<Vec<String>> {
        distinct_column_values(&self.conn, "serial_number")
    }
}

// `column` is always one of the fixed item column names, never user input.
fn distinct_column_values(conn: &Connection, column: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT DISTINCT {column}
         FROM items
         WHERE {column} IS NOT NULL AND TRIM({column}) <> ''
         ORDER BY {column} COLLATE NOCASE;"
    ))?;
    let mut rows = stmt.query([])?;
    let mut values = Vec::new();
    while let Some(row) = rows.next()? {
        values.push(row.get::<_, String>(0)?);
    }
    Ok(values)
}

fn store_object_type(conn: &Connection, name: &str) -> RepoResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Ok(());
    }
    // NOCASE primary key keeps the catalog case-insensitive while the first
    // registered spelling wins for display.
    conn.execute(
        "INSERT OR IGNORE INTO object_types (name) VALUES (?1);",
        [trimmed],
    )?;
    Ok(())
}

fn insert_custom_values(
    tx: &Transaction<'_>,
    id: ItemId,
    values: &BTreeMap<String, String>,
) -> RepoResult<()> {
    for (field_name, value) in values {
        tx.execute(
            "INSERT INTO custom_fields (item_id, field_name, value) VALUES (?1, ?2, ?3);",
            params![id, field_name.as_str(), value.as_str()],
        )?;
    }
    Ok(())
}

fn load_custom_values(conn: &Connection, id: ItemId) -> RepoResult<BTreeMap<String, String>> {
    let mut stmt =
        conn.prepare("SELECT field_name, value FROM custom_fields WHERE item_id = ?1;")?;
    let mut rows = stmt.query([id])?;
    let mut values = BTreeMap::new();
    while let Some(row) = rows.next()? {
        values.insert(row.get::<_, String>(0)?, row.get::<_, String>(1)?);
    }
    Ok(values)
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<ItemRecord> {
    let decommissioned = match row.get::<_, i64>("decommissioned")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid decommissioned value `{other}` in items.decommissioned"
            )));
        }
    };

    let item = Item {
        object_type: row.get("object_type")?,
        manufacturer: row.get("manufacturer")?,
        model: row.get("model")?,
        serial_number: row.get("serial_number")?,
        purchase_date: parse_db_date(row.get("purchase_date")?, "purchase_date")?,
        assignment_date: parse_db_date(row.get("assignment_date")?, "assignment_date")?,
        current_owner: row.get("current_owner")?,
        notes: row.get("notes")?,
        decommissioned,
        custom_values: BTreeMap::new(),
    };

    Ok(ItemRecord {
        id: row.get("id")?,
        item,
    })
}

fn date_to_db(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_db_date(value: Option<String>, column: &str) -> RepoResult<Option<NaiveDate>> {
    match value {
        None => Ok(None),
        Some(text) => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                RepoError::InvalidData(format!("invalid date value `{text}` in items.{column}"))
            }),
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if version == 0 || version > migrations::latest_version() {
        return Err(RepoError::InvalidData(format!(
            "connection not migrated for this build (user_version={version})"
        )));
    }

    for table in ["items", "custom_fields", "object_types"] {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::InvalidData(format!(
                "required table `{table}` is missing"
            )));
        }
    }

    Ok(())
}
