//! Bounded append-only audit log.

use std::collections::VecDeque;

use serde_json::{json, Value};

use crate::audit::{AuditFilter, AuditRecord, AuditStats, ListOrder, Role};
use crate::clock::current_timestamp_ms;

/// Action tag recorded when the log itself is cleared.
pub const AUDIT_CLEAR_ACTION: &str = "audit_log_clear";

/// Admin audit log holding at most `max_entries` records, oldest evicted first.
#[derive(Debug)]
pub struct AuditLog {
    records: VecDeque<AuditRecord>,
    max_entries: usize,
    next_id: u64,
}

impl AuditLog {
    /// Creates an empty log.
    ///
    /// `max_entries` comes from a validated [`crate::Config`]; a zero capacity
    /// is clamped to one only for direct library callers.
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            records: VecDeque::with_capacity(max_entries.min(1024)),
            max_entries,
            next_id: 1,
        }
    }

    /// Appends a record with the next sequence id.
    ///
    /// Authorization happens upstream; this never fails.
    pub fn append(
        &mut self,
        actor: &str,
        role: Role,
        action: &str,
        target: &str,
        detail: Value,
    ) -> AuditRecord {
        self.append_at(actor, role, action, target, detail, current_timestamp_ms())
    }

    pub fn append_at(
        &mut self,
        actor: &str,
        role: Role,
        action: &str,
        target: &str,
        detail: Value,
        now_ms: u64,
    ) -> AuditRecord {
        let record = AuditRecord {
            id: self.next_id,
            actor: actor.to_string(),
            role,
            action: action.to_string(),
            target: target.to_string(),
            timestamp: now_ms,
            detail,
        };
        self.next_id += 1;

        self.records.push_back(record.clone());
        while self.records.len() > self.max_entries {
            self.records.pop_front();
        }
        record
    }

    /// Returns matching records in the filter's order, truncated to its limit.
    pub fn list(&self, filter: &AuditFilter) -> Vec<AuditRecord> {
        let limit = filter.limit.unwrap_or(usize::MAX);
        let matching = self.records.iter().filter(|r| filter.matches(r));

        match filter.order {
            ListOrder::NewestFirst => matching.rev().take(limit).cloned().collect(),
            ListOrder::OldestFirst => matching.take(limit).cloned().collect(),
        }
    }

    pub fn stats(&self) -> AuditStats {
        AuditStats {
            size: self.records.len(),
            max_size: self.max_entries,
            oldest_id: self.records.front().map(|r| r.id),
            newest_id: self.records.back().map(|r| r.id),
        }
    }

    /// Empties the log, then records the clear as the first entry of the new log.
    ///
    /// Ids keep counting from where they were.
    pub fn clear(&mut self, actor: &str, role: Role) -> AuditRecord {
        self.clear_at(actor, role, current_timestamp_ms())
    }

    pub fn clear_at(&mut self, actor: &str, role: Role, now_ms: u64) -> AuditRecord {
        let cleared = self.records.len();
        self.records.clear();
        self.append_at(
            actor,
            role,
            AUDIT_CLEAR_ACTION,
            "audit_log",
            json!({ "cleared": cleared }),
            now_ms,
        )
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
