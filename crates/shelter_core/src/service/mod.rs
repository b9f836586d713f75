//! Use-case services exposed to dashboard callers.
//!
//! # Responsibility
//! - Wrap every driver call with validation, auditing and error downgrading.
//! - Keep callers decoupled from storage and driver details.

pub mod shelter_store;
