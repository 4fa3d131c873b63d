//! Property-based test generators using proptest.
//!
//! Ids are drawn from a small alphabet so that generated snapshots of the
//! two sides overlap often.

use dbsync_store::{Payload, RecordSnapshot, Timestamp};
use proptest::prelude::*;
use serde_json::Value;
use std::collections::BTreeMap;

/// Strategy for record ids.
pub fn record_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-f][0-9]").expect("Invalid regex")
}

/// Strategy for optional timestamps in a narrow range, so ties happen.
pub fn timestamp_strategy() -> impl Strategy<Value = Option<Timestamp>> {
    prop::option::weighted(0.9, 0i64..8)
}

/// Strategy for small payloads.
pub fn payload_strategy() -> impl Strategy<Value = Payload> {
    prop::collection::btree_map(
        prop::string::string_regex("[a-z]{1,6}").expect("Invalid regex"),
        prop_oneof![
            any::<i64>().prop_map(Value::from),
            "[a-z ]{0,12}".prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
        ],
        0..4,
    )
    .prop_map(|fields| fields.into_iter().collect())
}

/// Strategy for a single record.
pub fn record_strategy() -> impl Strategy<Value = RecordSnapshot> {
    (record_id_strategy(), timestamp_strategy(), payload_strategy()).prop_map(
        |(id, updated_at, payload)| RecordSnapshot {
            id,
            updated_at,
            payload,
        },
    )
}

/// Strategy for one side's records of a model, with unique ids.
pub fn snapshot_strategy(max_len: usize) -> impl Strategy<Value = Vec<RecordSnapshot>> {
    prop::collection::vec(record_strategy(), 0..=max_len).prop_map(|records| {
        records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect::<BTreeMap<_, _>>()
            .into_values()
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    proptest! {
        #[test]
        fn snapshot_ids_are_unique(records in snapshot_strategy(16)) {
            let ids: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
            prop_assert_eq!(ids.len(), records.len());
        }

        #[test]
        fn record_ids_are_short(record in record_strategy()) {
            prop_assert_eq!(record.id.len(), 2);
        }
    }
}
