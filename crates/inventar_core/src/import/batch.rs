//! Batch commit of validated rows with partial-failure semantics.
//!
//! # Responsibility
//! - Push reconciled candidates through the facade one row at a time.
//! - Keep going past row-scoped write failures; stop only when the medium
//!   itself is gone.
//!
//! # Invariants
//! - Committed rows are never rolled back, not even on cancellation.
//! - Cancellation is checked between rows, never mid-row.
//! - No retries: a faulting backend is reported, not probed again.

use crate::import::reconciler::{Reconciled, RowError, RowFault};
use crate::import::table::ImportTable;
use crate::import::{reconciler, table, ImportError};
use crate::repo::facade::RepositoryFacade;
use crate::repo::item_repo::RepoError;
use log::info;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// Operator-facing result of one import run.
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    /// Rows committed to the active backend.
    pub created: usize,
    /// All-blank rows ignored without an error entry.
    pub skipped: usize,
    /// Whether the run stopped early because the caller cancelled it.
    pub cancelled: bool,
    /// Row errors ordered by row index.
    pub errors: Vec<RowError>,
}

/// Progress snapshot reported between rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub rows_done: usize,
    pub rows_total: usize,
}

/// Commits validated candidates through a facade.
pub struct BatchWriter<'a> {
    facade: &'a RepositoryFacade,
}

impl<'a> BatchWriter<'a> {
    pub fn new(facade: &'a RepositoryFacade) -> Self {
        Self { facade }
    }

    /// Commits all candidates without progress reporting or cancellation.
    pub fn commit(&self, reconciled: Reconciled) -> ImportSummary {
        let cancel = AtomicBool::new(false);
        self.commit_with(reconciled, |_| {}, &cancel)
    }

    /// Commits candidates, invoking `observer` after every attempted row and
    /// honoring `cancel` between rows.
    pub fn commit_with(
        &self,
        reconciled: Reconciled,
        mut observer: impl FnMut(BatchProgress),
        cancel: &AtomicBool,
    ) -> ImportSummary {
        let rows_total = reconciled.candidates.len();
        let mut summary = ImportSummary {
            skipped: reconciled.skipped,
            errors: reconciled.errors,
            ..ImportSummary::default()
        };

        let mut candidates = reconciled.candidates.into_iter();
        let mut rows_done = 0;
        while let Some(candidate) = candidates.next() {
            if cancel.load(Ordering::SeqCst) {
                summary.cancelled = true;
                break;
            }

            match self.facade.create_item(&candidate.item) {
                Ok(_) => summary.created += 1,
                Err(RepoError::Io(err)) => {
                    // Medium gone: abort, report the rest as one aggregate
                    // entry instead of failing row by row.
                    summary.errors.push(RowError {
                        row: candidate.row,
                        fault: RowFault::WriteFailed {
                            message: err.to_string(),
                        },
                    });
                    let remaining_rows = candidates.len();
                    if remaining_rows > 0 {
                        summary.errors.push(RowError {
                            row: candidate.row,
                            fault: RowFault::BatchAborted {
                                remaining_rows,
                                reason: err.to_string(),
                            },
                        });
                    }
                    rows_done += 1;
                    observer(BatchProgress {
                        rows_done,
                        rows_total,
                    });
                    break;
                }
                Err(err) => summary.errors.push(RowError {
                    row: candidate.row,
                    fault: RowFault::WriteFailed {
                        message: err.to_string(),
                    },
                }),
            }

            rows_done += 1;
            observer(BatchProgress {
                rows_done,
                rows_total,
            });
        }

        summary.errors.sort_by_key(|error| error.row);
        info!(
            "event=import_commit module=import status={} created={} skipped={} errors={} cancelled={}",
            if summary.cancelled { "cancelled" } else { "ok" },
            summary.created,
            summary.skipped,
            summary.errors.len(),
            summary.cancelled
        );
        summary
    }
}

/// Convenience one-shot: read a CSV file, reconcile it and commit the valid
/// rows.
pub fn import_csv_file(
    facade: &RepositoryFacade,
    path: impl AsRef<Path>,
) -> Result<ImportSummary, ImportError> {
    let table = table::read_csv_table(path)?;
    import_table(facade, &table)
}

/// Reconciles and commits an already-loaded table.
pub fn import_table(
    facade: &RepositoryFacade,
    table: &ImportTable,
) -> Result<ImportSummary, ImportError> {
    let reconciled = reconciler::reconcile(table)?;
    Ok(BatchWriter::new(facade).commit(reconciled))
}
