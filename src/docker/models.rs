//! Docker Engine API payloads.
//!
//! Only the fields the monitor reads are modelled; everything else in the daemon's
//! responses is ignored. Missing sections (e.g. `memory_stats` without a memory cgroup
//! controller) decode to zeroes.

use std::collections::HashMap;

use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::{Error, Result};
use crate::container::{ContainerID, ContainerTags};
use crate::stats::{CpuCounters, MemoryCounters, NetworkCounters, StatsSnapshot};

/// One entry of `GET /containers/json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContainerListing {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Image", default)]
    pub image: String,
    #[serde(rename = "Names", default)]
    pub names: Vec<String>,
}

impl ContainerListing {
    /// Derives the metric tags of the listed container.
    pub fn tags(&self) -> Result<ContainerTags> {
        let id = ContainerID::new(&self.id)?;
        Ok(ContainerTags::new(id, self.image.as_str(), &self.names))
    }
}

/// One object of the `GET /containers/{id}/stats` stream.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStats {
    pub read: String,
    #[serde(default)]
    pub networks: Option<HashMap<String, RawNetworkStats>>,
    #[serde(default)]
    pub memory_stats: RawMemoryStats,
    #[serde(default)]
    pub cpu_stats: RawCpuStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNetworkStats {
    #[serde(default)]
    pub rx_bytes: u64,
    #[serde(default)]
    pub rx_dropped: u64,
    #[serde(default)]
    pub rx_errors: u64,
    #[serde(default)]
    pub rx_packets: u64,
    #[serde(default)]
    pub tx_bytes: u64,
    #[serde(default)]
    pub tx_dropped: u64,
    #[serde(default)]
    pub tx_errors: u64,
    #[serde(default)]
    pub tx_packets: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMemoryStats {
    #[serde(default)]
    pub usage: u64,
    #[serde(default)]
    pub max_usage: u64,
    #[serde(default)]
    pub failcnt: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub stats: HashMap<String, u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCpuStats {
    #[serde(default)]
    pub cpu_usage: RawCpuUsage,
    #[serde(default)]
    pub system_cpu_usage: u64,
    #[serde(default)]
    pub online_cpus: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCpuUsage {
    #[serde(default)]
    pub total_usage: u64,
    #[serde(default)]
    pub percpu_usage: Option<Vec<u64>>,
    #[serde(default)]
    pub usage_in_kernelmode: u64,
    #[serde(default)]
    pub usage_in_usermode: u64,
}

impl From<RawNetworkStats> for NetworkCounters {
    fn from(raw: RawNetworkStats) -> Self {
        Self {
            rx_bytes: raw.rx_bytes,
            rx_dropped: raw.rx_dropped,
            rx_errors: raw.rx_errors,
            rx_packets: raw.rx_packets,
            tx_bytes: raw.tx_bytes,
            tx_dropped: raw.tx_dropped,
            tx_errors: raw.tx_errors,
            tx_packets: raw.tx_packets,
        }
    }
}

impl From<RawMemoryStats> for MemoryCounters {
    fn from(raw: RawMemoryStats) -> Self {
        // cgroup v2 hosts report `file`/`anon` instead of `cache`/`rss`
        let stat = |v1: &str, v2: &str| {
            raw.stats
                .get(v1)
                .or_else(|| raw.stats.get(v2))
                .copied()
                .unwrap_or_default()
        };

        Self {
            cache: stat("cache", "file"),
            rss: stat("rss", "anon"),
            usage: raw.usage,
            max_usage: raw.max_usage,
            failcnt: raw.failcnt,
            limit: raw.limit,
        }
    }
}

impl From<RawCpuStats> for CpuCounters {
    fn from(raw: RawCpuStats) -> Self {
        let count = match raw.cpu_usage.percpu_usage {
            Some(ref percpu) if !percpu.is_empty() => percpu.len() as u64,
            _ => raw.online_cpus.unwrap_or_default(),
        };

        Self {
            count,
            total_usage: raw.cpu_usage.total_usage,
            user_usage: raw.cpu_usage.usage_in_usermode,
            kernel_usage: raw.cpu_usage.usage_in_kernelmode,
            system_usage: raw.system_cpu_usage,
        }
    }
}

impl TryFrom<RawStats> for StatsSnapshot {
    type Error = Error;

    fn try_from(raw: RawStats) -> Result<Self> {
        let read = OffsetDateTime::parse(&raw.read, &Rfc3339).map_err(|source| {
            Error::Timestamp {
                value: raw.read.clone(),
                source,
            }
        })?;

        let mut network = NetworkCounters::default();
        for counters in raw.networks.into_iter().flat_map(HashMap::into_values) {
            network += NetworkCounters::from(counters);
        }

        Ok(Self {
            read,
            network,
            memory: raw.memory_stats.into(),
            cpu: raw.cpu_stats.into(),
        })
    }
}
