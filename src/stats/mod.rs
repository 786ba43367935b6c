//! Point-in-time resource usage readings for a single container.
//!
//! A [`StatsSnapshot`] is produced by a stats subscription each time the daemon pushes a
//! new sample. Once received it is never modified; monitors share it behind an
//! [`std::sync::Arc`] so the collection cycle can read it without copying.
//!
//! # Main types
//!
//! - [`StatsSnapshot`]: One timestamped reading of network, memory and CPU counters.
//! - [`NetworkCounters`]: Cumulative byte/packet counters, summed over all interfaces.
//! - [`MemoryCounters`]: Gauge-like memory values from the memory cgroup controller.
//! - [`CpuCounters`]: Monotonically increasing CPU time counters.
//! - [`CpuSample`]: CPU counters paired with their observation time, used for deltas.

mod fields;

pub use fields::{FieldValue, Fields, compute_deltas, memory_fields, network_fields};

use time::OffsetDateTime;

/// One reading of a container's resource counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Time at which the daemon read the counters.
    pub read: OffsetDateTime,
    pub network: NetworkCounters,
    pub memory: MemoryCounters,
    pub cpu: CpuCounters,
}

impl StatsSnapshot {
    /// Returns the CPU counters of this snapshot together with its observation time.
    pub fn cpu_sample(&self) -> CpuSample {
        CpuSample {
            read: self.read,
            counters: self.cpu.clone(),
        }
    }
}

/// Network counters as reported by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NetworkCounters {
    /// Bytes received.
    pub rx_bytes: u64,
    /// Packets dropped while receiving.
    pub rx_dropped: u64,
    /// Receive errors.
    pub rx_errors: u64,
    /// Packets received.
    pub rx_packets: u64,
    /// Bytes transmitted.
    pub tx_bytes: u64,
    /// Packets dropped while transmitting.
    pub tx_dropped: u64,
    /// Transmit errors.
    pub tx_errors: u64,
    /// Packets transmitted.
    pub tx_packets: u64,
}

impl std::ops::AddAssign for NetworkCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.rx_bytes += rhs.rx_bytes;
        self.rx_dropped += rhs.rx_dropped;
        self.rx_errors += rhs.rx_errors;
        self.rx_packets += rhs.rx_packets;
        self.tx_bytes += rhs.tx_bytes;
        self.tx_dropped += rhs.tx_dropped;
        self.tx_errors += rhs.tx_errors;
        self.tx_packets += rhs.tx_packets;
    }
}

/// Memory accounting values in bytes (except `failcnt`).
///
/// All values are zero when the daemon has no memory cgroup accounting for the container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryCounters {
    /// Current memory usage.
    pub usage: u64,
    /// Highest recorded memory usage.
    pub max_usage: u64,
    /// Number of times the usage hit the limit.
    pub failcnt: u64,
    /// Memory limit of the container.
    pub limit: u64,
    /// Page cache memory.
    pub cache: u64,
    /// Anonymous (resident) memory.
    pub rss: u64,
}

/// CPU time counters in nanoseconds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpuCounters {
    /// Number of CPU cores the container's usage is reported for.
    pub count: u64,
    /// Total CPU time consumed by the container.
    pub total_usage: u64,
    /// CPU time consumed in user mode.
    pub user_usage: u64,
    /// CPU time consumed in kernel mode.
    pub kernel_usage: u64,
    /// CPU time consumed by the whole host.
    pub system_usage: u64,
}

/// CPU counters together with the time they were observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuSample {
    pub read: OffsetDateTime,
    pub counters: CpuCounters,
}
