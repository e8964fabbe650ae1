//! Background import execution off the interactive path.
//!
//! # Responsibility
//! - Run reconcile + commit on a worker thread while the caller stays
//!   responsive.
//! - Stream row progress and exactly one final result over a channel.
//!
//! # Invariants
//! - Cancellation is flag-based and takes effect between rows only.
//! - Rows committed before cancellation stay committed.

use crate::import::batch::{BatchWriter, ImportSummary};
use crate::import::reconciler;
use crate::import::table::ImportTable;
use crate::import::ImportError;
use crate::repo::facade::RepositoryFacade;
use crossbeam_channel::{unbounded, Receiver};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Events emitted by a background import, terminated by one `Finished`.
#[derive(Debug)]
pub enum ImportEvent {
    Progress { rows_done: usize, rows_total: usize },
    Finished(Result<ImportSummary, ImportError>),
}

/// Handle to a running background import.
pub struct ImportWorker {
    cancel: Arc<AtomicBool>,
    events: Receiver<ImportEvent>,
    handle: Option<JoinHandle<()>>,
}

impl ImportWorker {
    /// Receiver of progress events and the final result.
    pub fn events(&self) -> &Receiver<ImportEvent> {
        &self.events
    }

    /// Requests cancellation; the worker honors it before the next row.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Waits for the worker thread to finish.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            // A panicked worker already delivered its channel events or
            // dropped the sender; nothing to propagate here.
            let _ = handle.join();
        }
    }
}

/// Spawns a worker that reconciles `table` and commits the valid rows
/// through `facade`.
pub fn spawn_import(facade: Arc<RepositoryFacade>, table: ImportTable) -> ImportWorker {
    let cancel = Arc::new(AtomicBool::new(false));
    let (sender, events) = unbounded();

    let worker_cancel = Arc::clone(&cancel);
    let handle = std::thread::spawn(move || {
        let reconciled = match reconciler::reconcile(&table) {
            Ok(reconciled) => reconciled,
            Err(err) => {
                let _ = sender.send(ImportEvent::Finished(Err(err)));
                return;
            }
        };

        let progress_sender = sender.clone();
        let summary = BatchWriter::new(&facade).commit_with(
            reconciled,
            |progress| {
                let _ = progress_sender.send(ImportEvent::Progress {
                    rows_done: progress.rows_done,
                    rows_total: progress.rows_total,
                });
            },
            &worker_cancel,
        );
        let _ = sender.send(ImportEvent::Finished(Ok(summary)));
    });

    ImportWorker {
        cancel,
        events,
        handle: Some(handle),
    }
}
