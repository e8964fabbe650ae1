//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `inventar_core` wiring: open a
//!   repository, report the active backend and the record count.
//! - Keep output deterministic for quick local sanity checks.

use inventar_core::{default_log_level, init_logging, ItemFilter, RepositoryFacade};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let base_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let db_path = base_dir.join("inventar.db");
    let json_path = base_dir.join("inventar_fallback.json");

    if let Err(err) = init_logging(default_log_level(), base_dir.join("logs")) {
        eprintln!("logging unavailable: {err}");
    }

    println!("inventar_core version={}", inventar_core::core_version());

    let facade = match RepositoryFacade::open(&db_path, &json_path) {
        Ok(facade) => facade,
        Err(err) => {
            eprintln!("failed to open repository: {err}");
            return ExitCode::FAILURE;
        }
    };
    println!("backend={}", facade.backend_kind());

    match facade.list_items(&ItemFilter::default()) {
        Ok(records) => {
            println!("items={}", records.len());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to list items: {err}");
            ExitCode::FAILURE
        }
    }
}
