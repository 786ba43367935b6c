use std::sync::Arc;

use super::{Registry, Result};
use crate::docker::DaemonClient;
use crate::sink::Accumulator;

/// Runs collection cycles against a daemon.
#[derive(Debug)]
pub struct Gatherer<C> {
    client: Arc<C>,
    registry: Registry,
}

impl<C: DaemonClient> Gatherer<C> {
    pub fn new(client: C) -> Self {
        Self::with_client(Arc::new(client))
    }

    pub fn with_client(client: Arc<C>) -> Self {
        Self {
            client,
            registry: Registry::default(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the number of supervised containers.
    pub fn monitored(&self) -> usize {
        self.registry.len()
    }

    /// Runs one collection cycle.
    ///
    /// Reconciles the supervised containers, then emits the `network`, `memory` (when
    /// the container has memory accounting) and `cpu` field groups of every container
    /// that has received at least one sample. Containers without a sample are skipped.
    /// Never waits on an individual container's stream.
    ///
    /// # Errors
    ///
    /// Returns [`super::Error::Discovery`] if the daemon listing fails, in which case
    /// nothing is emitted.
    pub async fn gather<A: Accumulator + ?Sized>(&self, acc: &mut A) -> Result<()> {
        self.registry.reconcile(&self.client).await?;

        let mut reports = Vec::with_capacity(self.registry.len());
        self.registry
            .for_each_mut(|monitor| reports.extend(monitor.report()));

        // the registry is no longer locked while emitting
        for report in reports {
            acc.add_fields("network", report.network, &report.tags, report.timestamp);
            if let Some(memory) = report.memory {
                acc.add_fields("memory", memory, &report.tags, report.timestamp);
            }
            acc.add_fields("cpu", report.cpu, &report.tags, report.timestamp);
        }

        Ok(())
    }
}
