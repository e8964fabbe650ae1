//! Reconciliation of raw table rows into validated items.
//!
//! # Responsibility
//! - Normalize heterogeneous header spellings onto the canonical field set.
//! - Coerce date-like and boolean-like cells deterministically.
//! - Accumulate one outcome value per row; never throw past a row.
//!
//! # Invariants
//! - A missing object-type column aborts before any row is processed.
//! - All-blank rows are skipped silently, not reported.
//! - Every rejected row appears in the error list with field and raw value.

use crate::import::table::{Cell, ImportTable};
use crate::import::ImportError;
use crate::model::item::Item;
use chrono::{Datelike, Days, Local, NaiveDate};
use std::fmt::{Display, Formatter};

/// Days-since-epoch origin used by spreadsheet serial dates.
const SERIAL_DATE_EPOCH: (i32, u32, u32) = (1899, 12, 30);

const FIELD_OBJECT_TYPE: &str = "objekttyp";
const FIELD_PURCHASE_DATE: &str = "einkaufsdatum";
const FIELD_ASSIGNMENT_DATE: &str = "zuweisungsdatum";
const FIELD_DECOMMISSIONED: &str = "stillgelegt";

/// Why a single row was rejected (or, for the batch faults, not attempted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowFault {
    MissingRequiredField { field: &'static str },
    InvalidDate { field: &'static str, value: String },
    InvalidBoolean { field: &'static str, value: String },
    WriteFailed { message: String },
    BatchAborted { remaining_rows: usize, reason: String },
}

impl Display for RowFault {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequiredField { field } => {
                write!(f, "required field `{field}` is empty")
            }
            Self::InvalidDate { field, value } => {
                write!(f, "invalid date `{value}` in field `{field}`")
            }
            Self::InvalidBoolean { field, value } => {
                write!(f, "invalid boolean `{value}` in field `{field}`")
            }
            Self::WriteFailed { message } => write!(f, "write failed: {message}"),
            Self::BatchAborted {
                remaining_rows,
                reason,
            } => write!(
                f,
                "batch aborted, {remaining_rows} row(s) not attempted: {reason}"
            ),
        }
    }
}

/// One entry of the operator-facing error report.
///
/// `row` is 1-based over data rows; the header row is not counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub row: usize,
    pub fault: RowFault,
}

impl Display for RowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}: {}", self.row, self.fault)
    }
}

/// A validated candidate row awaiting commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRow {
    pub row: usize,
    pub item: Item,
}

/// Reconciler output: validated candidates plus the row error report.
#[derive(Debug, Clone, Default)]
pub struct Reconciled {
    pub candidates: Vec<CandidateRow>,
    pub errors: Vec<RowError>,
    pub skipped: usize,
}

/// Maps canonical fields onto source column indices.
#[derive(Debug, Clone, Copy, Default)]
struct ColumnMap {
    object_type: Option<usize>,
    manufacturer: Option<usize>,
    model: Option<usize>,
    serial_number: Option<usize>,
    purchase_date: Option<usize>,
    assignment_date: Option<usize>,
    current_owner: Option<usize>,
    notes: Option<usize>,
    decommissioned: Option<usize>,
}

impl ColumnMap {
    fn build(headers: &[String]) -> Result<Self, ImportError> {
        let mut map = Self::default();
        for (index, header) in headers.iter().enumerate() {
            let slot = match normalize_header(header).as_str() {
                "objekttyp" | "objektart" | "type" => &mut map.object_type,
                "hersteller" | "manufacturer" => &mut map.manufacturer,
                "modell" | "model" => &mut map.model,
                "seriennummer" | "serialnumber" | "serial" => &mut map.serial_number,
                "einkaufsdatum" | "kaufdatum" | "purchasedate" => &mut map.purchase_date,
                "zuweisungsdatum" | "assignmentdate" => &mut map.assignment_date,
                "aktuellerbesitzer" | "besitzer" | "owner" | "currentowner" => {
                    &mut map.current_owner
                }
                "anmerkungen" | "notizen" | "notes" | "bemerkungen" => &mut map.notes,
                "stillgelegt" | "decommissioned" | "inactive" | "deaktiviert" => {
                    &mut map.decommissioned
                }
                // Unrecognized columns are ignored, not errors.
                _ => continue,
            };
            // First matching column wins.
            if slot.is_none() {
                *slot = Some(index);
            }
        }

        if map.object_type.is_none() {
            return Err(ImportError::MissingColumn(FIELD_OBJECT_TYPE));
        }
        Ok(map)
    }

    fn recognized(&self) -> [Option<usize>; 9] {
        [
            self.object_type,
            self.manufacturer,
            self.model,
            self.serial_number,
            self.purchase_date,
            self.assignment_date,
            self.current_owner,
            self.notes,
            self.decommissioned,
        ]
    }
}

/// Case-folds a header and strips whitespace, hyphens and underscores, so
/// "Objekttyp", "objekt-typ" and "OBJEKT TYP" all resolve identically.
fn normalize_header(header: &str) -> String {
    header
        .to_lowercase()
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '-' && *ch != '_')
        .collect()
}

/// Reconciles a whole table into candidates and row errors.
///
/// Returns an [`ImportError`] only for file-level problems; every row-level
/// problem lands in [`Reconciled::errors`] instead.
pub fn reconcile(table: &ImportTable) -> Result<Reconciled, ImportError> {
    let columns = ColumnMap::build(&table.headers)?;

    let mut result = Reconciled::default();
    for (index, row) in table.rows.iter().enumerate() {
        let row_number = index + 1;

        let all_blank = columns
            .recognized()
            .into_iter()
            .flatten()
            .all(|column| table.cell(row, column).is_blank());
        if all_blank {
            result.skipped += 1;
            continue;
        }

        match build_item(&columns, table, row) {
            Ok(item) => result.candidates.push(CandidateRow {
                row: row_number,
                item,
            }),
            Err(fault) => result.errors.push(RowError {
                row: row_number,
                fault,
            }),
        }
    }

    Ok(result)
}

fn build_item(columns: &ColumnMap, table: &ImportTable, row: &[Cell]) -> Result<Item, RowFault> {
    let text_at = |column: Option<usize>| -> String {
        column
            .map(|column| table.cell(row, column).raw())
            .unwrap_or_default()
    };

    // Coercion faults win over the missing-field fault when a row has both.
    let purchase_date = match columns.purchase_date {
        Some(column) => coerce_date(table.cell(row, column), FIELD_PURCHASE_DATE)?,
        None => None,
    };
    let assignment_date = match columns.assignment_date {
        Some(column) => coerce_date(table.cell(row, column), FIELD_ASSIGNMENT_DATE)?,
        None => None,
    };
    let decommissioned = match columns.decommissioned {
        Some(column) => coerce_bool(table.cell(row, column), FIELD_DECOMMISSIONED)?,
        None => false,
    };

    let object_type = text_at(columns.object_type);
    if object_type.trim().is_empty() {
        return Err(RowFault::MissingRequiredField {
            field: FIELD_OBJECT_TYPE,
        });
    }

    let current_owner = text_at(columns.current_owner);
    let notes = text_at(columns.notes);

    Ok(Item {
        object_type,
        manufacturer: text_at(columns.manufacturer),
        model: text_at(columns.model),
        serial_number: text_at(columns.serial_number),
        purchase_date,
        assignment_date,
        current_owner: (!current_owner.is_empty()).then_some(current_owner),
        notes: (!notes.is_empty()).then_some(notes),
        decommissioned,
        custom_values: Default::default(),
    })
}

/// Accepts `d.m.Y`, `d.m.y` (nearest century), ISO `Y-m-d` and spreadsheet
/// serial numbers; blank cells yield `None`.
fn coerce_date(cell: &Cell, field: &'static str) -> Result<Option<NaiveDate>, RowFault> {
    let invalid = || RowFault::InvalidDate {
        field,
        value: cell.raw(),
    };

    match cell {
        Cell::Empty => Ok(None),
        Cell::Number(serial) => serial_to_date(*serial).map(Some).ok_or_else(invalid),
        Cell::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            parse_date_text(text, Local::now().year())
                .map(Some)
                .ok_or_else(invalid)
        }
    }
}

fn parse_date_text(text: &str, reference_year: i32) -> Option<NaiveDate> {
    // chrono's `%Y` also accepts one- and two-digit years, so the two-digit
    // form must be resolved before the full-year format sees it.
    if let Some(date) = parse_two_digit_year(text, reference_year) {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%d.%m.%Y") {
        return Some(date);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

fn parse_two_digit_year(text: &str, reference_year: i32) -> Option<NaiveDate> {
    let mut parts = text.splitn(3, '.');
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let year_part = parts.next()?.trim();
    if year_part.len() != 2 || !year_part.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    let short: i32 = year_part.parse().ok()?;
    NaiveDate::from_ymd_opt(nearest_century(short, reference_year), month, day)
}

/// Resolves a two-digit year to whichever full year is closest to the
/// reference year; ties favor the later century.
fn nearest_century(short: i32, reference_year: i32) -> i32 {
    let earlier = 1900 + short;
    let later = 2000 + short;
    if (reference_year - earlier).abs() < (reference_year - later).abs() {
        earlier
    } else {
        later
    }
}

fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    // Fractions carry a time of day; the calendar date is the whole part.
    let days = serial.trunc() as u64;
    let (year, month, day) = SERIAL_DATE_EPOCH;
    NaiveDate::from_ymd_opt(year, month, day)?.checked_add_days(Days::new(days))
}

/// Accepts {ja, true, 1} / {nein, false, 0} case-insensitively; blank means
/// false.
fn coerce_bool(cell: &Cell, field: &'static str) -> Result<bool, RowFault> {
    let invalid = || RowFault::InvalidBoolean {
        field,
        value: cell.raw(),
    };

    match cell {
        Cell::Empty => Ok(false),
        Cell::Number(value) if *value == 1.0 => Ok(true),
        Cell::Number(value) if *value == 0.0 => Ok(false),
        Cell::Number(_) => Err(invalid()),
        Cell::Text(text) => match text.trim().to_lowercase().as_str() {
            "" => Ok(false),
            "ja" | "true" | "1" => Ok(true),
            "nein" | "false" | "0" => Ok(false),
            _ => Err(invalid()),
        },
    }
}
