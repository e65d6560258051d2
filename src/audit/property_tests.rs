//! Property-Based Tests for the Audit Log

use proptest::prelude::*;
use serde_json::Value;

use crate::audit::{AuditFilter, AuditLog, ListOrder, Role};

#[derive(Debug, Clone)]
enum AuditOp {
    Append { actor: String },
    Clear,
}

fn audit_op_strategy() -> impl Strategy<Value = AuditOp> {
    prop_oneof![
        9 => "[a-c]".prop_map(|actor| AuditOp::Append { actor }),
        1 => Just(AuditOp::Clear),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Ids are strictly increasing and the log never exceeds max_entries.
    #[test]
    fn prop_ids_increase_and_size_bounded(
        max_entries in 1usize..20,
        ops in prop::collection::vec(audit_op_strategy(), 1..100)
    ) {
        let mut log = AuditLog::new(max_entries);
        let mut last_id = 0u64;

        for op in ops {
            let record = match op {
                AuditOp::Append { actor } => {
                    log.append(&actor, Role::Admin, "maintenance_toggle", "slack", Value::Null)
                }
                AuditOp::Clear => log.clear("root-admin", Role::Admin),
            };
            prop_assert!(record.id > last_id, "id {} after {}", record.id, last_id);
            last_id = record.id;
            prop_assert!(log.len() <= max_entries);
        }

        let filter = AuditFilter { order: ListOrder::OldestFirst, ..AuditFilter::default() };
        let ids: Vec<u64> = log.list(&filter).iter().map(|r| r.id).collect();
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    // Newest-first listing is the exact reverse of oldest-first listing.
    #[test]
    fn prop_orderings_are_mirrors(count in 0u64..40) {
        let mut log = AuditLog::new(25);
        for i in 0..count {
            log.append_at("alice", Role::Viewer, "x", "y", Value::Null, i);
        }

        let mut oldest: Vec<u64> = log
            .list(&AuditFilter { order: ListOrder::OldestFirst, ..AuditFilter::default() })
            .iter()
            .map(|r| r.id)
            .collect();
        let newest: Vec<u64> = log.list(&AuditFilter::default()).iter().map(|r| r.id).collect();
        oldest.reverse();
        prop_assert_eq!(oldest, newest);
    }
}
