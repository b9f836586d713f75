//! Domain model for shelter records, application users and the audit trail.
//!
//! # Responsibility
//! - Define the shapes persisted in the `animals`, `users` and `audit_log`
//!   collections.
//! - Own the single field-name validation routine used by mutating entry points.
//!
//! # Invariants
//! - Animal records are schema-less; only field-name legality is enforced.
//! - Audit entries are append-only and never mutated after insert.

pub mod audit;
pub mod document;
pub mod stats;
pub mod user;
