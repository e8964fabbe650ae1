//! Domain model for inventory records.
//!
//! # Responsibility
//! - Define the canonical record shape shared by every storage variant.
//! - Keep validation rules in one place so backends cannot diverge.
//!
//! # Invariants
//! - Every persisted item carries a backend-assigned, never-reused `ItemId`.
//! - `object_type` is never empty on a valid item.

pub mod item;
