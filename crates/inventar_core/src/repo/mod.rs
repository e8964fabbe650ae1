//! Repository layer: one storage contract, two interchangeable variants.
//!
//! # Responsibility
//! - Define the data access contract shared by the SQLite and JSON variants.
//! - Keep storage details (SQL, document layout) behind the trait boundary.
//!
//! # Invariants
//! - Write paths must call `Item::validate()` before any I/O.
//! - Both variants evaluate list filters through the same predicate, so the
//!   public contract never diverges between storage media.

pub mod facade;
pub mod item_repo;
pub mod json_repo;
pub mod sqlite_repo;
