//! Conversion of snapshots into named metric fields.
//!
//! CPU fields carry deltas against the sample seen in the previous collection cycle.
//! Network and memory fields are passed through as reported.

use std::collections::BTreeMap;

use super::{CpuSample, MemoryCounters, NetworkCounters};

/// A single metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Unsigned(u64),
    Integer(i64),
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        Self::Unsigned(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// Named values of one field group, ordered by name.
pub type Fields = BTreeMap<&'static str, FieldValue>;

/// Difference between two readings of a monotonic counter.
///
/// A counter reset (container restart) makes this negative. The value is reported as-is
/// so consumers can detect resets by its sign.
fn delta(current: u64, previous: u64) -> i64 {
    current.wrapping_sub(previous) as i64
}

/// Computes the `cpu` field group for `current`.
///
/// Absolute counters are always present. The `*_delta` fields are only added when a
/// `previous` sample exists and was read at a different time than `current`; the daemon
/// may not have produced a new sample since the last cycle.
pub fn compute_deltas(current: &CpuSample, previous: Option<&CpuSample>) -> Fields {
    let cpu = &current.counters;
    let mut fields = Fields::from([
        ("count", FieldValue::Unsigned(cpu.count)),
        ("total_usage", FieldValue::Unsigned(cpu.total_usage)),
        ("user_usage", FieldValue::Unsigned(cpu.user_usage)),
        ("kernel_usage", FieldValue::Unsigned(cpu.kernel_usage)),
        ("system_usage", FieldValue::Unsigned(cpu.system_usage)),
    ]);

    if let Some(previous) = previous.filter(|previous| previous.read != current.read) {
        let prev = &previous.counters;
        fields.insert("total_delta", delta(cpu.total_usage, prev.total_usage).into());
        fields.insert("user_delta", delta(cpu.user_usage, prev.user_usage).into());
        fields.insert(
            "kernel_delta",
            delta(cpu.kernel_usage, prev.kernel_usage).into(),
        );
        fields.insert(
            "system_delta",
            delta(cpu.system_usage, prev.system_usage).into(),
        );
    }

    fields
}

/// Computes the `memory` field group.
///
/// Returns `None` when the memory cgroup controller is unavailable, which the daemon
/// signals by reporting zero `usage` or `max_usage`.
pub fn memory_fields(memory: &MemoryCounters) -> Option<Fields> {
    if memory.usage == 0 || memory.max_usage == 0 {
        return None;
    }

    Some(Fields::from([
        ("cache", FieldValue::Unsigned(memory.cache)),
        ("rss", FieldValue::Unsigned(memory.rss)),
        ("max_usage", FieldValue::Unsigned(memory.max_usage)),
        ("usage", FieldValue::Unsigned(memory.usage)),
        ("failcnt", FieldValue::Unsigned(memory.failcnt)),
        ("limit", FieldValue::Unsigned(memory.limit)),
    ]))
}

/// Computes the `network` field group.
pub fn network_fields(network: &NetworkCounters) -> Fields {
    Fields::from([
        ("rx_bytes", FieldValue::Unsigned(network.rx_bytes)),
        ("rx_dropped", FieldValue::Unsigned(network.rx_dropped)),
        ("rx_errors", FieldValue::Unsigned(network.rx_errors)),
        ("rx_packets", FieldValue::Unsigned(network.rx_packets)),
        ("tx_bytes", FieldValue::Unsigned(network.tx_bytes)),
        ("tx_dropped", FieldValue::Unsigned(network.tx_dropped)),
        ("tx_errors", FieldValue::Unsigned(network.tx_errors)),
        ("tx_packets", FieldValue::Unsigned(network.tx_packets)),
    ])
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::stats::CpuCounters;

    fn sample(read: time::OffsetDateTime, total_usage: u64) -> CpuSample {
        CpuSample {
            read,
            counters: CpuCounters {
                count: 4,
                total_usage,
                user_usage: total_usage / 2,
                kernel_usage: total_usage / 4,
                system_usage: total_usage * 10,
            },
        }
    }

    #[test]
    fn first_sample_has_no_deltas() {
        let current = sample(datetime!(2024-01-01 0:00:00 UTC), 100);
        let fields = compute_deltas(&current, None);

        assert_eq!(fields.len(), 5);
        assert_eq!(fields["count"], FieldValue::Unsigned(4));
        assert_eq!(fields["total_usage"], FieldValue::Unsigned(100));
        assert!(!fields.keys().any(|key| key.ends_with("_delta")));
    }

    #[test]
    fn delta_against_previous_sample() {
        let previous = sample(datetime!(2024-01-01 0:00:00 UTC), 100);
        let current = sample(datetime!(2024-01-01 0:00:10 UTC), 180);
        let fields = compute_deltas(&current, Some(&previous));

        assert_eq!(fields["total_delta"], FieldValue::Integer(80));
        assert_eq!(fields["user_delta"], FieldValue::Integer(40));
        assert_eq!(fields["kernel_delta"], FieldValue::Integer(20));
        assert_eq!(fields["system_delta"], FieldValue::Integer(800));
    }

    #[test]
    fn same_timestamp_suppresses_deltas() {
        let previous = sample(datetime!(2024-01-01 0:00:00 UTC), 100);
        let fields = compute_deltas(&previous, Some(&previous));

        assert_eq!(fields.len(), 5);
        assert!(!fields.contains_key("total_delta"));
    }

    #[test]
    fn counter_reset_reports_negative_delta() {
        let previous = sample(datetime!(2024-01-01 0:00:00 UTC), 1_000);
        let current = sample(datetime!(2024-01-01 0:00:10 UTC), 200);
        let fields = compute_deltas(&current, Some(&previous));

        assert_eq!(fields["total_delta"], FieldValue::Integer(-800));
    }

    #[test]
    fn memory_omitted_without_accounting() {
        assert_eq!(memory_fields(&MemoryCounters::default()), None);

        let only_usage = MemoryCounters {
            usage: 500,
            ..Default::default()
        };
        assert_eq!(memory_fields(&only_usage), None);
    }

    #[test]
    fn memory_passthrough() {
        let memory = MemoryCounters {
            usage: 500,
            max_usage: 1000,
            failcnt: 1,
            limit: 4096,
            cache: 20,
            rss: 300,
        };
        let fields = memory_fields(&memory).unwrap();

        assert_eq!(fields["usage"], FieldValue::Unsigned(500));
        assert_eq!(fields["max_usage"], FieldValue::Unsigned(1000));
        assert_eq!(fields["failcnt"], FieldValue::Unsigned(1));
        assert_eq!(fields["limit"], FieldValue::Unsigned(4096));
        assert_eq!(fields["cache"], FieldValue::Unsigned(20));
        assert_eq!(fields["rss"], FieldValue::Unsigned(300));
    }

    #[test]
    fn network_fields_are_verbatim() {
        let network = NetworkCounters {
            rx_bytes: 1,
            rx_dropped: 2,
            rx_errors: 3,
            rx_packets: 4,
            tx_bytes: 5,
            tx_dropped: 6,
            tx_errors: 7,
            tx_packets: 8,
        };
        let fields = network_fields(&network);

        assert_eq!(fields.len(), 8);
        assert_eq!(fields["rx_bytes"], FieldValue::Unsigned(1));
        assert_eq!(fields["tx_packets"], FieldValue::Unsigned(8));
    }
}
