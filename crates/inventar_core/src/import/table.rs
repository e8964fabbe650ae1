//! Raw tabular input model and the CSV front-end.
//!
//! # Responsibility
//! - Represent external tables as one header row plus untyped cell rows.
//! - Read CSV sources into that shape; other formats are rejected up front.

use crate::import::ImportError;
use std::path::Path;

/// One untyped cell as delivered by the source file.
///
/// Spreadsheet-originated sources may deliver numeric cells (serial dates);
/// text sources deliver everything as text.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Treats missing cells and whitespace-only text as blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Trimmed text rendering used for error reports.
    pub fn raw(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(text) => text.trim().to_string(),
            Self::Number(value) => format_number(*value),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Tabular import input: one header row, then data rows.
///
/// Rows shorter than the header are padded with [`Cell::Empty`] on access.
#[derive(Debug, Clone, Default)]
pub struct ImportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ImportTable {
    pub fn cell<'a>(&self, row: &'a [Cell], column: usize) -> &'a Cell {
        row.get(column).unwrap_or(&Cell::Empty)
    }
}

/// Reads a CSV file into an [`ImportTable`].
///
/// Numeric-looking cells stay text here; the reconciler decides how to
/// coerce them per column. Only the `.csv` suffix is accepted.
pub fn read_csv_table(path: impl AsRef<Path>) -> Result<ImportTable, ImportError> {
    let path = path.as_ref();
    let suffix = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();
    if suffix != "csv" {
        return Err(ImportError::UnsupportedFormat(suffix));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader
        .headers()?
        .iter()
        .map(|header| header.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(ImportTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::{read_csv_table, Cell};
    use crate::import::ImportError;
    use std::io::Write;

    #[test]
    fn blank_detection_covers_empty_and_whitespace() {
        assert!(Cell::Empty.is_blank());
        assert!(Cell::Text("   ".to_string()).is_blank());
        assert!(!Cell::Text("x".to_string()).is_blank());
        assert!(!Cell::Number(0.0).is_blank());
    }

    #[test]
    fn raw_renders_whole_numbers_without_fraction() {
        assert_eq!(Cell::Number(45323.0).raw(), "45323");
        assert_eq!(Cell::Number(1.5).raw(), "1.5");
    }

    #[test]
    fn csv_reader_produces_headers_and_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Objekttyp,Hersteller").unwrap();
        writeln!(file, "Laptop,Lenovo").unwrap();
        writeln!(file, ",").unwrap();
        drop(file);

        let table = read_csv_table(&path).unwrap();
        assert_eq!(table.headers, vec!["Objekttyp", "Hersteller"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], Cell::Text("Laptop".to_string()));
        assert_eq!(table.rows[1][0], Cell::Empty);
    }

    #[test]
    fn non_csv_suffix_is_rejected() {
        let err = read_csv_table("inventory.xlsx").unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(ref s) if s == "xlsx"));
    }
}
