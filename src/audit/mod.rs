//! Audit Module
//!
//! Bounded record of administrative mutations and the role model that gates them.

mod log;
mod record;
mod role;

#[cfg(test)]
mod property_tests;

pub use log::{AuditLog, AUDIT_CLEAR_ACTION};
pub use record::{AuditFilter, AuditRecord, AuditStats, ListOrder};
pub use role::Role;
